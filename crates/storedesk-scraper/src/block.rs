//! Block, captcha, and error page detection.

use storedesk_core::{load_block_indicators, AppConfig, ConfigError, DEFAULT_BLOCK_INDICATORS};

/// Case-insensitive substring matcher over a configurable indicator list.
#[derive(Debug, Clone)]
pub struct BlockDetector {
    indicators: Vec<String>,
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_INDICATORS.iter().copied())
    }
}

impl BlockDetector {
    pub fn new<I, S>(indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            indicators: indicators
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Built-in indicators, or the YAML list named by configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured file cannot be loaded.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        match &config.block_indicators_path {
            Some(path) => {
                let file = load_block_indicators(path)?;
                tracing::debug!(
                    path = %path.display(),
                    count = file.indicators.len(),
                    "loaded block indicators"
                );
                Ok(Self::new(file.indicators))
            }
            None => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// True when any indicator appears in any of the inputs.
    #[must_use]
    pub fn is_blocked_page(&self, title: &str, body_text: &str, raw_html: Option<&str>) -> bool {
        self.first_match(title, body_text, raw_html).is_some()
    }

    /// The indicator that tripped detection, for logging.
    #[must_use]
    pub fn first_match(&self, title: &str, body_text: &str, raw_html: Option<&str>) -> Option<&str> {
        let haystacks = [
            title.to_lowercase(),
            body_text.to_lowercase(),
            raw_html.map(str::to_lowercase).unwrap_or_default(),
        ];
        self.indicators
            .iter()
            .find(|needle| haystacks.iter().any(|h| h.contains(needle.as_str())))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_field_trips_detection() {
        let detector = BlockDetector::default();
        assert!(detector.is_blocked_page("캡차이미지", "", None));
        assert!(detector.is_blocked_page("", "아래 캡차이미지를 확인하세요", None));
        assert!(detector.is_blocked_page("", "", Some("<div>보안 확인을 완료해 주세요</div>")));
    }

    #[test]
    fn matching_ignores_case() {
        let detector = BlockDetector::default();
        assert!(detector.is_blocked_page("Please solve the CAPTCHA", "", None));
        assert!(detector.is_blocked_page("", "Are you a Robot?", None));
    }

    #[test]
    fn ordinary_product_page_passes() {
        let detector = BlockDetector::default();
        assert!(!detector.is_blocked_page(
            "유기농 현미 5kg : 농부네",
            "상품 상세 정보 배송비 3,000원",
            Some("<html><body>상품</body></html>")
        ));
    }

    #[test]
    fn custom_list_replaces_defaults() {
        let detector = BlockDetector::new(["Access Denied", "  "]);
        assert_eq!(detector.indicators(), ["access denied"]);
        assert!(detector.is_blocked_page("", "access DENIED", None));
        assert!(!detector.is_blocked_page("captcha", "", None));
        assert_eq!(
            detector.first_match("", "Access Denied", None),
            Some("access denied")
        );
    }
}
