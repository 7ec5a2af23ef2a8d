//! Integration tests for `StaticFetcher::scrape`.
//!
//! Each test stands up a `wiremock` server so no real network traffic is
//! made. Covers the normalized happy path, block pages served with 200,
//! non-2xx statuses, and the request headers the fetcher sends.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storedesk_scraper::{
    BlockDetector, FetchMethod, Platform, ScrapeError, ScrapeResult, StaticFetcher,
};

const TEST_UA: &str = "storedesk-test/0.1";

fn test_fetcher() -> StaticFetcher {
    StaticFetcher::new(5, TEST_UA, BlockDetector::default()).expect("failed to build fetcher")
}

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body.to_string())
}

const PRODUCT_PAGE: &str = r#"<!doctype html>
<html>
<head>
  <title>  무선 이어폰   프로 </title>
  <meta name="description" content="노이즈 캔슬링 이어폰">
  <meta name="keywords" content="이어폰, 블루투스, 이어폰">
  <meta property="og:image" content="https://shop-phinf.pstatic.net/og.jpg">
  <script>window.__STATE__ = {"price": 1000};</script>
  <style>body { color: red; }</style>
</head>
<body>
  <h1>무선 이어폰</h1>
  <img src="/images/main.jpg">
  <img data-src="https://shop-phinf.pstatic.net/lazy.jpg">
  <img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=">
  <p>배송비   무료</p>
  <noscript>enable javascript</noscript>
</body>
</html>"#;

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scrape_normalizes_a_product_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop/products/1"))
        .respond_with(html_response(PRODUCT_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/shop/products/1?utm_source=ad#reviews", server.uri());
    let result = test_fetcher().scrape(&url).await;

    assert!(result.is_success(), "expected success, got {result:?}");
    assert_eq!(result.method(), FetchMethod::Static);
    let content = result.content().expect("content on success");

    assert_eq!(content.url, format!("{}/shop/products/1", server.uri()));
    assert_eq!(content.platform, Platform::Unknown);
    assert_eq!(content.title.as_deref(), Some("무선 이어폰 프로"));
    assert_eq!(content.description.as_deref(), Some("노이즈 캔슬링 이어폰"));
    assert_eq!(
        content.images,
        vec![
            format!("{}/images/main.jpg", server.uri()),
            "https://shop-phinf.pstatic.net/lazy.jpg".to_string(),
        ]
    );
    assert!(content.body_text.contains("배송비 무료"));
    assert!(!content.body_text.contains("__STATE__"));
    assert!(!content.raw_html.contains("<script"));
    assert!(!content.raw_html.contains("<noscript"));
    assert_eq!(content.meta.keywords, vec!["이어폰", "블루투스"]);
    assert_eq!(
        content.meta.og_image.as_deref(),
        Some("https://shop-phinf.pstatic.net/og.jpg")
    );
    assert!(content.screenshot.is_none());
}

#[tokio::test]
async fn scrape_sends_browser_like_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", TEST_UA))
        .and(header("accept-language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"))
        .and(header("cache-control", "no-cache"))
        .respond_with(html_response("<html><head><title>ok</title></head><body>ok</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_fetcher().scrape(&format!("{}/page", server.uri())).await;
    assert!(result.is_success(), "headers did not match: {result:?}");
}

// ---------------------------------------------------------------------------
// Block pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn captcha_page_served_with_200_is_blocked() {
    let server = MockServer::start().await;
    let body = r#"<html><head><title>네이버</title></head>
        <body><div class="captcha"><img alt="캡차이미지" src="/captcha.png"></div>
        <p>정답을 입력해주세요</p></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/abc/products/12345"))
        .respond_with(html_response(body))
        .mount(&server)
        .await;

    let result = test_fetcher()
        .scrape(&format!("{}/abc/products/12345", server.uri()))
        .await;

    assert!(result.is_blocked(), "expected blocked, got {result:?}");
    assert!(!result.is_success());
    assert_eq!(result.method(), FetchMethod::Static);
    let error = result.error().expect("error on failure");
    assert!(error.to_string().contains("차단"));
    assert!(error.browser_may_recover());
}

#[tokio::test]
async fn custom_indicators_replace_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maintenance"))
        .respond_with(html_response(
            "<html><head><title>Scheduled maintenance</title></head><body>back soon</body></html>",
        ))
        .mount(&server)
        .await;

    let fetcher =
        StaticFetcher::new(5, TEST_UA, BlockDetector::new(["MAINTENANCE"])).expect("fetcher");
    let result = fetcher
        .scrape(&format!("{}/maintenance", server.uri()))
        .await;
    assert!(result.is_blocked());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_success_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = test_fetcher()
        .scrape(&format!("{}/missing", server.uri()))
        .await;

    match result {
        ScrapeResult::Failure {
            error: ScrapeError::Http { status, url },
            method,
            screenshot,
        } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/missing"));
            assert_eq!(method, FetchMethod::Static);
            assert!(screenshot.is_none());
        }
        other => panic!("expected Http failure, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = test_fetcher().scrape(&server.uri()).await;
    let error = result.error().expect("error on failure");
    assert!(error.is_retryable());
    assert!(!error.is_blocked());
}

#[tokio::test]
async fn invalid_url_makes_no_request() {
    let result = test_fetcher().scrape("ftp://example.com/file").await;
    assert!(matches!(
        result.error(),
        Some(ScrapeError::InvalidUrl { .. })
    ));
    assert!(!result.error().unwrap().browser_may_recover());
}
