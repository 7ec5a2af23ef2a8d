//! Randomized pacing for the browser session.
//!
//! Fixed sleeps are a fingerprint, so every pause is drawn uniformly from a
//! bounded range. `rand::rng()` is thread-local and not `Send`; it is only
//! touched inside these synchronous helpers.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;

/// Search-engine referrer prefixes; the target URL is appended.
pub const REFERRER_POOL: &[&str] = &[
    "https://search.naver.com/search.naver?query=",
    "https://www.google.com/search?q=",
];

/// Delay ranges in milliseconds and step counts for one browser visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanTiming {
    pub pre_navigation_ms: RangeInclusive<u64>,
    pub post_navigation_ms: RangeInclusive<u64>,
    pub mouse_moves: RangeInclusive<u32>,
    pub mouse_pause_ms: RangeInclusive<u64>,
    pub scroll_steps: RangeInclusive<u32>,
    pub scroll_step_px: u32,
    pub scroll_pause_ms: RangeInclusive<u64>,
    pub settle_top_ms: RangeInclusive<u64>,
    pub screenshot_settle_ms: RangeInclusive<u64>,
}

impl Default for HumanTiming {
    fn default() -> Self {
        Self {
            pre_navigation_ms: 1000..=2000,
            post_navigation_ms: 1500..=3000,
            mouse_moves: 3..=5,
            mouse_pause_ms: 100..=300,
            scroll_steps: 3..=4,
            scroll_step_px: 200,
            scroll_pause_ms: 500..=1000,
            settle_top_ms: 1000..=2000,
            screenshot_settle_ms: 500..=1000,
        }
    }
}

impl HumanTiming {
    /// No pauses; step counts unchanged. For tests and local debugging.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            pre_navigation_ms: 0..=0,
            post_navigation_ms: 0..=0,
            mouse_pause_ms: 0..=0,
            scroll_pause_ms: 0..=0,
            settle_top_ms: 0..=0,
            screenshot_settle_ms: 0..=0,
            ..Self::default()
        }
    }
}

/// Uniform draw from an inclusive range; an empty range yields its start.
pub fn pick<T>(range: &RangeInclusive<T>) -> T
where
    T: rand::distr::uniform::SampleUniform + PartialOrd + Copy,
{
    if range.start() >= range.end() {
        return *range.start();
    }
    rand::rng().random_range(range.clone())
}

/// Sleep for a random duration drawn from `range_ms`.
pub async fn pause(range_ms: &RangeInclusive<u64>) {
    let ms = pick(range_ms);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[must_use]
pub fn pick_referrer(target_url: &str) -> String {
    let idx = pick(&(0..=REFERRER_POOL.len() - 1));
    let query: String =
        percent_encoding::utf8_percent_encode(target_url, percent_encoding::NON_ALPHANUMERIC)
            .to_string();
    format!("{}{query}", REFERRER_POOL[idx])
}

/// Random point inside the viewport, away from the edges.
#[must_use]
pub fn pick_point(width: u32, height: u32) -> (f64, f64) {
    let x = pick(&(50..=width.saturating_sub(50).max(50)));
    let y = pick(&(50..=height.saturating_sub(50).max(50)));
    (f64::from(x), f64::from(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_stay_in_range() {
        for _ in 0..200 {
            let v = pick(&(1000..=2000u64));
            assert!((1000..=2000).contains(&v));
        }
    }

    #[test]
    fn degenerate_range_returns_start() {
        assert_eq!(pick(&(5..=5u64)), 5);
        assert_eq!(pick(&(0..=0u32)), 0);
    }

    #[test]
    fn referrer_comes_from_pool_and_encodes_target() {
        let referrer = pick_referrer("https://smartstore.naver.com/a/products/1");
        assert!(REFERRER_POOL.iter().any(|p| referrer.starts_with(p)));
        assert!(referrer.ends_with("https%3A%2F%2Fsmartstore%2Enaver%2Ecom%2Fa%2Fproducts%2F1"));
    }

    #[test]
    fn points_fall_inside_viewport() {
        for _ in 0..100 {
            let (x, y) = pick_point(1440, 900);
            assert!((50.0..=1390.0).contains(&x));
            assert!((50.0..=850.0).contains(&y));
        }
    }

    #[test]
    fn instant_timing_keeps_step_counts() {
        let timing = HumanTiming::instant();
        assert_eq!(timing.mouse_moves, 3..=5);
        assert_eq!(timing.post_navigation_ms, 0..=0);
    }
}
