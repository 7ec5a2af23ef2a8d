//! Carrier timestamp parsing.
//!
//! Korean carriers publish wall-clock times without an offset; all of them are
//! Korea Standard Time (UTC+09:00, no DST).

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Layouts carriers use for their date and time columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// RFC 3339 / ISO 8601, or `YYYY-MM-DD HH:MM[:SS]` without an offset.
    Iso,
    /// `YYYY-MM-DD` with a separate `HH:MM`.
    Korean,
    /// `YYYY.MM.DD` with a separate `HH:MM`.
    KoreanDot,
    /// `YYYYMMDD` with a separate `HHMM[SS]`.
    Compact,
}

static KOREAN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid regex"));
static DOT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})\.(\d{2})\.(\d{2})").expect("valid regex"));
static COMPACT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})(\d{2})(\d{2})").expect("valid regex"));
static HOUR_MINUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}):(\d{2})").expect("valid regex"));
static COMPACT_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2})(\d{2})(\d{2})?").expect("valid regex"));

#[must_use]
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("UTC+09:00 is a valid offset")
}

/// Parse a carrier date (and optional separate time) into a KST timestamp.
///
/// Returns `None` when the date cannot be recognized; a missing or malformed
/// time part falls back to midnight.
#[must_use]
pub fn parse_carrier_datetime(
    date: Option<&str>,
    time: Option<&str>,
    format: DateFormat,
) -> Option<DateTime<FixedOffset>> {
    let date = date.map(str::trim).filter(|d| !d.is_empty())?;

    let naive = match format {
        DateFormat::Iso => return parse_iso(date),
        DateFormat::Korean => with_time(captured_date(&KOREAN_DATE, date)?, time, &HOUR_MINUTE),
        DateFormat::KoreanDot => with_time(captured_date(&DOT_DATE, date)?, time, &HOUR_MINUTE),
        DateFormat::Compact => with_time(captured_date(&COMPACT_DATE, date)?, time, &COMPACT_TIME),
    };

    kst().from_local_datetime(&naive).single()
}

fn parse_iso(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y.%m.%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .and_then(|naive| kst().from_local_datetime(&naive).single())
}

fn captured_date(re: &Regex, raw: &str) -> Option<NaiveDate> {
    let caps = re.captures(raw)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let day = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn with_time(date: NaiveDate, time: Option<&str>, re: &Regex) -> NaiveDateTime {
    let parsed = time.and_then(|t| re.captures(t)).and_then(|caps| {
        let hour = caps.get(1)?.as_str().parse().ok()?;
        let minute = caps.get(2)?.as_str().parse().ok()?;
        let second = caps
            .get(3)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        NaiveTime::from_hms_opt(hour, minute, second)
    });
    date.and_time(parsed.unwrap_or(NaiveTime::MIN))
}
