use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Non-2xx response from a static fetch.
    #[error("unexpected HTTP status {status} from {url}")]
    Http { status: u16, url: String },

    #[error("no Chrome binary found (searched: {})", searched.join(", "))]
    BrowserNotFound { searched: Vec<String> },

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u128 },

    /// The page loaded but is a block, captcha, or error page.
    #[error("네이버에서 접근을 차단했습니다. 잠시 후 다시 시도하거나 브라우저 모드를 사용하세요. ({url})")]
    Blocked { url: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unexpected scraper failure: {0}")]
    Unexpected(String),
}

impl ScrapeError {
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Whether repeating the same strategy later may succeed.
    ///
    /// A block is not retryable this way; it needs a different strategy.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NavigationTimeout { .. } | Self::Request(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the browser strategy is worth trying after this static failure.
    #[must_use]
    pub fn browser_may_recover(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Blocked { .. } | Self::Request(_))
    }
}
