use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    NaverSmartStore,
    Unknown,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::NaverSmartStore => "naver_smart_store",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMethod {
    Static,
    Browser,
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMethod::Static => f.write_str("static"),
            FetchMethod::Browser => f.write_str("browser"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMeta {
    /// Deduplicated, in the order the page lists them.
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
}

/// Normalized content of one fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedContent {
    /// Origin and path only.
    pub url: String,
    pub platform: Platform,
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub body_text: String,
    pub raw_html: String,
    pub meta: ContentMeta,
    /// `data:image/jpeg;base64,...` when a screenshot was requested.
    pub screenshot: Option<String>,
}

impl ScrapedContent {
    /// JSON handed to the analysis collaborator.
    #[must_use]
    pub fn to_analysis_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "url": self.url,
            "platform": self.platform,
            "title": self.title,
            "description": self.description,
            "images": self.images,
            "bodyText": self.body_text,
            "meta": self.meta,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub capture_screenshot: bool,
}

#[derive(Debug)]
pub enum ScrapeResult {
    Success {
        content: ScrapedContent,
        method: FetchMethod,
    },
    Failure {
        error: ScrapeError,
        method: FetchMethod,
        /// Best-effort capture taken while diagnosing a block.
        screenshot: Option<String>,
    },
}

impl ScrapeResult {
    pub(crate) fn failure(error: ScrapeError, method: FetchMethod) -> Self {
        ScrapeResult::Failure {
            error,
            method,
            screenshot: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeResult::Success { .. })
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, ScrapeResult::Failure { error, .. } if error.is_blocked())
    }

    #[must_use]
    pub fn method(&self) -> FetchMethod {
        match self {
            ScrapeResult::Success { method, .. } | ScrapeResult::Failure { method, .. } => *method,
        }
    }

    #[must_use]
    pub fn content(&self) -> Option<&ScrapedContent> {
        match self {
            ScrapeResult::Success { content, .. } => Some(content),
            ScrapeResult::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ScrapeError> {
        match self {
            ScrapeResult::Success { .. } => None,
            ScrapeResult::Failure { error, .. } => Some(error),
        }
    }

    /// Wire shape: `{success, content, method}` or
    /// `{success, error, isBlocked, method, screenshot}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ScrapeResult::Success { content, method } => serde_json::json!({
                "success": true,
                "content": content,
                "method": method,
            }),
            ScrapeResult::Failure {
                error,
                method,
                screenshot,
            } => serde_json::json!({
                "success": false,
                "error": error.to_string(),
                "isBlocked": error.is_blocked(),
                "method": method,
                "screenshot": screenshot,
            }),
        }
    }
}
