//! Browser session seam and scoped acquisition.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::stealth::{self, StealthProfile};
use super::timing::pick;
use crate::error::ScrapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Plausible desktop size: 1440–1599 wide, 900–979 tall.
    #[must_use]
    pub fn randomized() -> Self {
        Self {
            width: 1440 + pick(&(0..=159)),
            height: 900 + pick(&(0..=79)),
        }
    }
}

/// Everything fixed for one browsing context before navigation.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub viewport: Viewport,
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub geolocation: (f64, f64),
    pub extra_headers: Vec<(String, String)>,
    /// Registered to run before any page script.
    pub init_script: String,
}

impl SessionSettings {
    #[must_use]
    pub fn new(profile: &StealthProfile, viewport: Viewport) -> Self {
        Self {
            viewport,
            user_agent: stealth::BROWSER_USER_AGENT.to_string(),
            locale: stealth::LOCALE.to_string(),
            timezone: stealth::TIMEZONE.to_string(),
            geolocation: stealth::GEOLOCATION,
            extra_headers: stealth::extra_headers(),
            init_script: profile.render_init_script(),
        }
    }
}

/// Starts browser sessions. One session owns one browser process.
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    fn launch(
        &self,
        settings: &SessionSettings,
    ) -> impl Future<Output = Result<Self::Session, ScrapeError>> + Send;
}

/// Operations the scrape flow needs from a live page.
pub trait BrowserSession: Send + Sync + Sized {
    /// Start navigation with the given `Referer`.
    fn navigate(
        &self,
        url: &str,
        referrer: &str,
    ) -> impl Future<Output = Result<(), ScrapeError>> + Send;

    fn wait_for_selector(
        &self,
        css: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ScrapeError>> + Send;

    /// Move the pointer to `(x, y)` in `steps` intermediate events.
    fn mouse_move(
        &self,
        x: f64,
        y: f64,
        steps: u32,
    ) -> impl Future<Output = Result<(), ScrapeError>> + Send;

    /// Evaluate a script body and return its JSON result.
    fn evaluate(
        &self,
        script: &str,
    ) -> impl Future<Output = Result<serde_json::Value, ScrapeError>> + Send;

    /// Full-page JPEG as a `data:` URL.
    fn screenshot(&self, quality: u8)
        -> impl Future<Output = Result<String, ScrapeError>> + Send;

    /// Release the page and the browser process.
    fn close(self) -> impl Future<Output = Result<(), ScrapeError>> + Send;
}

/// Run `body` against `session`, then close the session whatever happened.
///
/// Errors and panics inside `body` are both reported after `close` has run;
/// a panic becomes [`ScrapeError::Unexpected`]. A failure to close is logged
/// and never replaces the body's result.
///
/// # Errors
///
/// Returns the error produced by `body`, or `Unexpected` if it panicked.
pub async fn with_session<S, T, F>(session: S, body: F) -> Result<T, ScrapeError>
where
    S: BrowserSession,
    F: for<'a> FnOnce(&'a S) -> BoxFuture<'a, Result<T, ScrapeError>>,
{
    let outcome = AssertUnwindSafe(body(&session)).catch_unwind().await;

    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }

    match outcome {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(panic = %message, "browser session panicked");
            Err(ScrapeError::Unexpected(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "browser task panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn randomized_viewport_bounds() {
        for _ in 0..100 {
            let v = Viewport::randomized();
            assert!((1440..=1599).contains(&v.width));
            assert!((900..=979).contains(&v.height));
        }
    }

    #[test]
    fn settings_use_korean_context() {
        let settings = SessionSettings::new(
            &StealthProfile::default(),
            Viewport {
                width: 1500,
                height: 920,
            },
        );
        assert_eq!(settings.locale, "ko-KR");
        assert_eq!(settings.timezone, "Asia/Seoul");
        assert!(settings.init_script.contains("webdriver"));
        assert!(settings.user_agent.contains("Macintosh"));
    }

    #[test]
    fn panic_messages_are_extracted() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "browser task panicked");
    }
}
