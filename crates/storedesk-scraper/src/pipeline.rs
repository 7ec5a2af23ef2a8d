//! Static first, browser second.

use crate::browser::{BrowserLauncher, BrowserScraper};
use crate::fetch::StaticFetcher;
use crate::types::{ScrapeOptions, ScrapeResult};

/// Try the static fetch, then the browser once if the static failure is one
/// a real browser can get past (HTTP error, block page, transport error).
///
/// Invalid URLs and static successes never launch a browser. Screenshots are
/// only taken by the browser strategy.
pub async fn scrape_with_fallback<L: BrowserLauncher>(
    fetcher: &StaticFetcher,
    browser: &BrowserScraper<L>,
    url: &str,
    options: ScrapeOptions,
) -> ScrapeResult {
    let result = fetcher.scrape(url).await;
    let recoverable = result
        .error()
        .is_some_and(crate::error::ScrapeError::browser_may_recover);
    if !recoverable {
        return result;
    }

    tracing::info!(
        url,
        error = %result.error().map(ToString::to_string).unwrap_or_default(),
        "static fetch failed; retrying with browser"
    );
    browser.scrape(url, options).await
}
