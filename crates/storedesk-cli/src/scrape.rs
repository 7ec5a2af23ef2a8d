//! Scrape command handlers.

use clap::ValueEnum;
use storedesk_core::AppConfig;
use storedesk_scraper::{
    scrape_with_fallback, validate_url, BlockDetector, BrowserConfig, BrowserScraper,
    ScrapeOptions, ScrapeResult, StaticFetcher, WebDriverLauncher,
};

/// Which strategy a scrape uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ScrapeMode {
    /// Plain HTTP fetch only.
    Static,
    /// Stealth browser only.
    Browser,
    /// Static fetch, then the browser once if the page was blocked.
    Auto,
}

fn static_fetcher(config: &AppConfig, detector: BlockDetector) -> anyhow::Result<StaticFetcher> {
    StaticFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        detector,
    )
    .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))
}

fn browser_scraper(
    config: &AppConfig,
    detector: BlockDetector,
) -> BrowserScraper<WebDriverLauncher> {
    BrowserScraper::new(
        WebDriverLauncher::from_config(config),
        detector,
        BrowserConfig::from_config(config),
    )
}

/// Scrape one URL and print the result as JSON.
///
/// With `analysis_payload`, a successful scrape prints only the fields sent
/// to the analysis service.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the scrape failed.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    url: &str,
    mode: ScrapeMode,
    capture_screenshot: bool,
    analysis_payload: bool,
) -> anyhow::Result<()> {
    let detector = BlockDetector::from_config(config)?;
    let options = ScrapeOptions { capture_screenshot };

    let result = match mode {
        ScrapeMode::Static => static_fetcher(config, detector)?.scrape(url).await,
        ScrapeMode::Browser => browser_scraper(config, detector).scrape(url, options).await,
        ScrapeMode::Auto => {
            let fetcher = static_fetcher(config, detector.clone())?;
            let browser = browser_scraper(config, detector);
            scrape_with_fallback(&fetcher, &browser, url, options).await
        }
    };

    let output = match (&result, analysis_payload) {
        (ScrapeResult::Success { content, .. }, true) => content.to_analysis_payload(),
        _ => result.to_json(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    match result {
        ScrapeResult::Success { .. } => Ok(()),
        ScrapeResult::Failure { error, method, .. } => {
            anyhow::bail!("{method} scrape failed: {error}")
        }
    }
}

/// # Errors
///
/// Returns an error if the URL cannot be scraped.
pub(crate) fn run_validate_url(url: &str) -> anyhow::Result<()> {
    let platform = validate_url(url)?;
    println!("{platform}");
    Ok(())
}
