pub mod block;
pub mod browser;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod types;
pub mod urls;

pub use block::BlockDetector;
pub use browser::{BrowserConfig, BrowserScraper, WebDriverLauncher};
pub use error::ScrapeError;
pub use fetch::StaticFetcher;
pub use pipeline::scrape_with_fallback;
pub use types::{
    ContentMeta, FetchMethod, Platform, ScrapeOptions, ScrapeResult, ScrapedContent,
};
pub use urls::{canonicalize_url, detect_platform, validate_url};
