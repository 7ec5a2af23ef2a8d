//! Stealth browser scraping.
//!
//! A visit runs as: randomized pause, search-engine referrer, navigation
//! under a timeout, wait for `body`, simulated pointer and scroll activity,
//! in-page extraction, then block detection. The session is always closed
//! through [`session::with_session`].

pub mod session;
pub mod stealth;
pub mod timing;
pub mod webdriver;

use std::time::Duration;

use serde::Deserialize;
use storedesk_core::AppConfig;
use url::Url;

use crate::block::BlockDetector;
use crate::error::ScrapeError;
use crate::extract::{
    collapse_whitespace, filter_image_urls, split_keywords, truncate_chars,
    BROWSER_BODY_TEXT_LIMIT, RAW_HTML_LIMIT,
};
use crate::types::{ContentMeta, FetchMethod, Platform, ScrapeOptions, ScrapeResult, ScrapedContent};
use crate::urls::{canonicalize_url, detect_platform};

pub use session::{
    with_session, BrowserLauncher, BrowserSession, SessionSettings, Viewport,
};
pub use stealth::StealthProfile;
pub use timing::HumanTiming;
pub use webdriver::{find_chrome_binary, WebDriverLauncher, DEFAULT_CHROME_PATHS};

const BLOCKED_SCREENSHOT_QUALITY: u8 = 80;
const SUCCESS_SCREENSHOT_QUALITY: u8 = 85;

/// Runs in the page after human simulation; mirrors the static extractor.
const EXTRACT_SCRIPT: &str = r#"
const meta = (sel) => {
  const el = document.querySelector(sel);
  return el ? el.getAttribute('content') : null;
};
const clone = document.documentElement.cloneNode(true);
clone.querySelectorAll('script, style, noscript, iframe').forEach((el) => el.remove());
const h1 = document.querySelector('h1');
return {
  title: document.title || meta('meta[property="og:title"]') || (h1 ? h1.textContent : null),
  description: meta('meta[name="description"]') || meta('meta[property="og:description"]'),
  images: Array.from(document.querySelectorAll('img'))
    .map((img) => img.src || img.getAttribute('data-src') || ''),
  bodyText: document.body ? document.body.innerText : '',
  rawHtml: clone.outerHTML,
  keywords: meta('meta[name="keywords"]'),
  ogImage: meta('meta[property="og:image"]'),
  ogTitle: meta('meta[property="og:title"]'),
  ogDescription: meta('meta[property="og:description"]'),
};"#;

const SCROLL_TOP_SMOOTH: &str = "window.scrollTo({ top: 0, behavior: 'smooth' }); return true;";
const SCROLL_TOP: &str = "window.scrollTo(0, 0); return true;";

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
    pub timing: HumanTiming,
    pub profile: StealthProfile,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            selector_timeout: Duration::from_secs(10),
            timing: HumanTiming::default(),
            profile: StealthProfile::default(),
        }
    }
}

impl BrowserConfig {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            navigation_timeout: Duration::from_secs(config.browser_navigation_timeout_secs),
            selector_timeout: Duration::from_secs(config.browser_selector_timeout_secs),
            ..Self::default()
        }
    }
}

/// What the in-page extraction script returns.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PageSnapshot {
    title: Option<String>,
    description: Option<String>,
    images: Vec<String>,
    body_text: String,
    raw_html: String,
    keywords: Option<String>,
    og_image: Option<String>,
    og_title: Option<String>,
    og_description: Option<String>,
}

impl PageSnapshot {
    fn into_content(self, url: &str, platform: Platform) -> ScrapedContent {
        let clean = |s: Option<String>| {
            s.map(|v| collapse_whitespace(&v))
                .filter(|v| !v.is_empty())
        };
        let base = Url::parse(url).ok();
        ScrapedContent {
            url: url.to_string(),
            platform,
            title: clean(self.title),
            description: clean(self.description),
            images: filter_image_urls(self.images, base.as_ref()),
            body_text: truncate_chars(&collapse_whitespace(&self.body_text), BROWSER_BODY_TEXT_LIMIT),
            raw_html: truncate_chars(&self.raw_html, RAW_HTML_LIMIT),
            meta: ContentMeta {
                keywords: self
                    .keywords
                    .as_deref()
                    .map(split_keywords)
                    .unwrap_or_default(),
                og_image: clean(self.og_image),
                og_title: clean(self.og_title),
                og_description: clean(self.og_description),
            },
            screenshot: None,
        }
    }
}

enum Visit {
    Content(ScrapedContent),
    Blocked { screenshot: Option<String> },
}

/// Browser-based scraper over any [`BrowserLauncher`].
pub struct BrowserScraper<L> {
    launcher: L,
    detector: BlockDetector,
    config: BrowserConfig,
}

impl<L: BrowserLauncher> BrowserScraper<L> {
    pub fn new(launcher: L, detector: BlockDetector, config: BrowserConfig) -> Self {
        Self {
            launcher,
            detector,
            config,
        }
    }

    /// Visit one page like a person would and normalize it. Never returns
    /// `Err`; every failure, including a panic, is a [`ScrapeResult::Failure`].
    pub async fn scrape(&self, url: &str, options: ScrapeOptions) -> ScrapeResult {
        let canonical = match canonicalize_url(url) {
            Ok(canonical) => canonical,
            Err(e) => return ScrapeResult::failure(e, FetchMethod::Browser),
        };
        let platform = detect_platform(&canonical);
        let settings = SessionSettings::new(&self.config.profile, Viewport::randomized());
        tracing::debug!(
            url = %canonical,
            %platform,
            method = "browser",
            width = settings.viewport.width,
            height = settings.viewport.height,
            "launching browser"
        );

        let session = match tokio::time::timeout(
            self.config.navigation_timeout,
            self.launcher.launch(&settings),
        )
        .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                tracing::warn!(url = %canonical, error = %e, "browser launch failed");
                return ScrapeResult::failure(e, FetchMethod::Browser);
            }
            Err(_) => {
                return ScrapeResult::failure(
                    ScrapeError::Browser("browser launch timed out".to_string()),
                    FetchMethod::Browser,
                )
            }
        };

        let visit = VisitPlan {
            url: canonical.clone(),
            platform,
            viewport: settings.viewport,
            options,
            config: self.config.clone(),
            detector: self.detector.clone(),
        };
        match with_session(session, move |s| Box::pin(visit.run(s))).await {
            Ok(Visit::Content(content)) => {
                tracing::debug!(url = %canonical, images = content.images.len(), "browser scrape complete");
                ScrapeResult::Success {
                    content,
                    method: FetchMethod::Browser,
                }
            }
            Ok(Visit::Blocked { screenshot }) => ScrapeResult::Failure {
                error: ScrapeError::Blocked { url: canonical },
                method: FetchMethod::Browser,
                screenshot,
            },
            Err(e) => {
                tracing::warn!(url = %canonical, method = "browser", error = %e, "browser scrape failed");
                ScrapeResult::failure(e, FetchMethod::Browser)
            }
        }
    }
}

/// Owned inputs for one visit, moved into the session body.
struct VisitPlan {
    url: String,
    platform: Platform,
    viewport: Viewport,
    options: ScrapeOptions,
    config: BrowserConfig,
    detector: BlockDetector,
}

impl VisitPlan {
    async fn run<S: BrowserSession>(self, session: &S) -> Result<Visit, ScrapeError> {
        let timing = &self.config.timing;

        timing::pause(&timing.pre_navigation_ms).await;
        let referrer = timing::pick_referrer(&self.url);
        tokio::time::timeout(
            self.config.navigation_timeout,
            session.navigate(&self.url, &referrer),
        )
        .await
        .map_err(|_| ScrapeError::NavigationTimeout {
            url: self.url.clone(),
            timeout_ms: self.config.navigation_timeout.as_millis(),
        })??;

        tokio::time::timeout(
            self.config.selector_timeout,
            session.wait_for_selector("body", self.config.selector_timeout),
        )
        .await
        .map_err(|_| {
            ScrapeError::Browser(format!(
                "body not ready within {}ms",
                self.config.selector_timeout.as_millis()
            ))
        })??;
        timing::pause(&timing.post_navigation_ms).await;

        self.simulate_presence(session).await?;

        let raw = session.evaluate(EXTRACT_SCRIPT).await?;
        let snapshot: PageSnapshot = serde_json::from_value(raw)
            .map_err(|e| ScrapeError::Browser(format!("unreadable page snapshot: {e}")))?;
        let mut content = snapshot.into_content(&self.url, self.platform);

        if let Some(indicator) = self.detector.first_match(
            content.title.as_deref().unwrap_or_default(),
            &content.body_text,
            Some(&content.raw_html),
        ) {
            tracing::warn!(url = %self.url, indicator, method = "browser", "block page detected");
            let screenshot = if self.options.capture_screenshot {
                best_effort_screenshot(session, BLOCKED_SCREENSHOT_QUALITY).await
            } else {
                None
            };
            return Ok(Visit::Blocked { screenshot });
        }

        if self.options.capture_screenshot {
            if let Err(e) = session.evaluate(SCROLL_TOP).await {
                tracing::debug!(error = %e, "scroll before screenshot failed");
            }
            timing::pause(&timing.screenshot_settle_ms).await;
            content.screenshot = best_effort_screenshot(session, SUCCESS_SCREENSHOT_QUALITY).await;
        }

        Ok(Visit::Content(content))
    }

    async fn simulate_presence<S: BrowserSession>(&self, session: &S) -> Result<(), ScrapeError> {
        let timing = &self.config.timing;

        let moves = timing::pick(&timing.mouse_moves);
        for _ in 0..moves {
            let (x, y) = timing::pick_point(self.viewport.width, self.viewport.height);
            let steps = timing::pick(&(5..=15u32));
            session.mouse_move(x, y, steps).await?;
            timing::pause(&timing.mouse_pause_ms).await;
        }

        let scroll_steps = timing::pick(&timing.scroll_steps);
        for step in 1..=scroll_steps {
            let script = format!(
                "window.scrollTo(0, {}); return true;",
                step * timing.scroll_step_px
            );
            session.evaluate(&script).await?;
            timing::pause(&timing.scroll_pause_ms).await;
        }

        session.evaluate(SCROLL_TOP_SMOOTH).await?;
        timing::pause(&timing.settle_top_ms).await;
        session.evaluate(SCROLL_TOP).await?;
        timing::pause(&timing.settle_top_ms).await;
        Ok(())
    }
}

async fn best_effort_screenshot<S: BrowserSession>(session: &S, quality: u8) -> Option<String> {
    match session.screenshot(quality).await {
        Ok(shot) => Some(shot),
        Err(e) => {
            tracing::warn!(error = %e, "screenshot failed");
            None
        }
    }
}
