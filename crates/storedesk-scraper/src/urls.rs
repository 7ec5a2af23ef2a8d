//! URL canonicalization and platform detection.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::ScrapeError;
use crate::types::Platform;

static NAVER_PRODUCT_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"^https?://smartstore\.naver\.com/.+/products/\d+").expect("valid regex"),
        Regex::new(r"^https?://m\.smartstore\.naver\.com/.+/products/\d+").expect("valid regex"),
        Regex::new(r"^https?://brand\.naver\.com/.+/products/\d+").expect("valid regex"),
        Regex::new(r"^https?://shopping\.naver\.com/.*/products/\d+").expect("valid regex"),
    ]
});

fn parse_http_url(raw: &str) -> Result<Url, ScrapeError> {
    let invalid = |reason: String| ScrapeError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Reduce a URL to origin plus path, dropping query and fragment.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidUrl`] for unparseable or non-http(s) input.
pub fn canonicalize_url(raw: &str) -> Result<String, ScrapeError> {
    let url = parse_http_url(raw)?;
    Ok(format!("{}{}", url.origin().ascii_serialization(), url.path()))
}

/// Platform a URL belongs to; anything unrecognized is `Unknown`.
#[must_use]
pub fn detect_platform(url: &str) -> Platform {
    if NAVER_PRODUCT_PATTERNS.iter().any(|re| re.is_match(url)) {
        Platform::NaverSmartStore
    } else {
        Platform::Unknown
    }
}

/// Check that a URL can be scraped and report its platform.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidUrl`] for unparseable or non-http(s) input.
pub fn validate_url(raw: &str) -> Result<Platform, ScrapeError> {
    let canonical = canonicalize_url(raw)?;
    Ok(detect_platform(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_smartstore_product() {
        let url = "https://smartstore.naver.com/abc/products/12345?query=1";
        let canonical = canonicalize_url(url).unwrap();
        assert_eq!(canonical, "https://smartstore.naver.com/abc/products/12345");
        assert_eq!(detect_platform(&canonical), Platform::NaverSmartStore);
    }

    #[test]
    fn strips_fragment_and_keeps_port() {
        assert_eq!(
            canonicalize_url("http://127.0.0.1:8080/p/1#reviews").unwrap(),
            "http://127.0.0.1:8080/p/1"
        );
    }

    #[test]
    fn recognizes_all_naver_hosts() {
        for url in [
            "https://m.smartstore.naver.com/shop/products/9",
            "https://brand.naver.com/brand/products/10",
            "https://shopping.naver.com/window-products/products/11",
        ] {
            assert_eq!(detect_platform(url), Platform::NaverSmartStore, "{url}");
        }
        assert_eq!(
            detect_platform("https://smartstore.naver.com/abc"),
            Platform::Unknown
        );
        assert_eq!(detect_platform("https://www.coupang.com/vp/products/1"), Platform::Unknown);
    }

    #[test]
    fn validate_rejects_non_http() {
        assert!(matches!(
            validate_url("ftp://example.com/file"),
            Err(ScrapeError::InvalidUrl { .. })
        ));
        assert!(validate_url("not a url").is_err());
        assert_eq!(
            validate_url("https://example.com/a?b=c").unwrap(),
            Platform::Unknown
        );
    }
}
