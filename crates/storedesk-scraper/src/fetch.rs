use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::Client;

use crate::block::BlockDetector;
use crate::error::ScrapeError;
use crate::extract::{extract_content, STATIC_BODY_TEXT_LIMIT};
use crate::types::{FetchMethod, ScrapeResult};
use crate::urls::{canonicalize_url, detect_platform};

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_KO: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";

/// Plain HTTP fetch with browser-like headers.
///
/// Cheap first attempt; JavaScript-rendered pages and bot walls need
/// [`crate::browser::BrowserScraper`].
pub struct StaticFetcher {
    client: Client,
    detector: BlockDetector,
}

impl StaticFetcher {
    /// # Errors
    ///
    /// Returns [`ScrapeError::Request`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        detector: BlockDetector,
    ) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_KO));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, detector })
    }

    /// Fetch and normalize one page. Never returns `Err`; failures are
    /// reported as [`ScrapeResult::Failure`].
    pub async fn scrape(&self, url: &str) -> ScrapeResult {
        match self.try_scrape(url).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(url, method = "static", error = %error, "static scrape failed");
                ScrapeResult::failure(error, FetchMethod::Static)
            }
        }
    }

    async fn try_scrape(&self, url: &str) -> Result<ScrapeResult, ScrapeError> {
        let canonical = canonicalize_url(url)?;
        let platform = detect_platform(&canonical);
        tracing::debug!(url = %canonical, %platform, method = "static", "fetching page");

        let response = self.client.get(&canonical).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Http {
                status: status.as_u16(),
                url: canonical,
            });
        }
        let html = response.text().await?;

        let content = extract_content(&html, &canonical, platform, STATIC_BODY_TEXT_LIMIT);
        if let Some(indicator) = self.detector.first_match(
            content.title.as_deref().unwrap_or_default(),
            &content.body_text,
            Some(&content.raw_html),
        ) {
            tracing::warn!(url = %canonical, indicator, method = "static", "block page detected");
            return Err(ScrapeError::Blocked { url: canonical });
        }

        tracing::debug!(
            url = %canonical,
            images = content.images.len(),
            body_chars = content.body_text.chars().count(),
            "static scrape complete"
        );
        Ok(ScrapeResult::Success {
            content,
            method: FetchMethod::Static,
        })
    }
}
