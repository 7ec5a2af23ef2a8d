//! Browser scrape flow against a scripted fake session.
//!
//! The fake records every call so the tests can check the visit order, the
//! stealth settings handed to the launcher, and that each launched session
//! is closed exactly once on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storedesk_scraper::browser::timing::REFERRER_POOL;
use storedesk_scraper::browser::{
    BrowserLauncher, BrowserSession, HumanTiming, SessionSettings, StealthProfile,
};
use storedesk_scraper::{
    scrape_with_fallback, BlockDetector, BrowserConfig, BrowserScraper, FetchMethod, ScrapeError,
    ScrapeOptions, ScrapeResult, StaticFetcher, WebDriverLauncher,
};

const PRODUCT_URL: &str = "https://smartstore.naver.com/abc/products/12345?NaPm=ct%3D1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Normal,
    LaunchFails,
    NavigateFails,
    NavigateHangs,
    PanicOnExtract,
    Blocked,
    BlockedScreenshotFails,
}

#[derive(Default)]
struct Calls {
    launched: AtomicUsize,
    closed: AtomicUsize,
    mouse_moves: AtomicUsize,
    navigations: Mutex<Vec<(String, String)>>,
    scripts: Mutex<Vec<String>>,
    screenshots: Mutex<Vec<u8>>,
    settings: Mutex<Option<SessionSettings>>,
}

impl Calls {
    fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeLauncher {
    behavior: Behavior,
    calls: Arc<Calls>,
}

struct FakeSession {
    behavior: Behavior,
    calls: Arc<Calls>,
}

impl BrowserLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self, settings: &SessionSettings) -> Result<FakeSession, ScrapeError> {
        if self.behavior == Behavior::LaunchFails {
            return Err(ScrapeError::BrowserNotFound {
                searched: vec!["/nowhere/chrome".to_string()],
            });
        }
        self.calls.launched.fetch_add(1, Ordering::SeqCst);
        *self.calls.settings.lock().unwrap() = Some(settings.clone());
        Ok(FakeSession {
            behavior: self.behavior,
            calls: Arc::clone(&self.calls),
        })
    }
}

fn page(body_text: &str) -> Value {
    json!({
        "title": "무선 이어폰",
        "description": "노이즈 캔슬링",
        "images": ["https://shop-phinf.pstatic.net/a.jpg", "data:image/png;base64,AA"],
        "bodyText": body_text,
        "rawHtml": "<html><body></body></html>",
        "keywords": "이어폰, 블루투스",
        "ogImage": "https://shop-phinf.pstatic.net/og.jpg",
        "ogTitle": "무선 이어폰",
        "ogDescription": null
    })
}

impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str, referrer: &str) -> Result<(), ScrapeError> {
        self.calls
            .navigations
            .lock()
            .unwrap()
            .push((url.to_string(), referrer.to_string()));
        match self.behavior {
            Behavior::NavigateFails => Err(ScrapeError::Browser("net::ERR_CONNECTION_RESET".into())),
            Behavior::NavigateHangs => std::future::pending().await,
            _ => Ok(()),
        }
    }

    async fn wait_for_selector(&self, _css: &str, _timeout: Duration) -> Result<(), ScrapeError> {
        Ok(())
    }

    async fn mouse_move(&self, _x: f64, _y: f64, _steps: u32) -> Result<(), ScrapeError> {
        self.calls.mouse_moves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError> {
        self.calls.scripts.lock().unwrap().push(script.to_string());
        if !script.contains("rawHtml") {
            return Ok(Value::Bool(true));
        }
        match self.behavior {
            Behavior::PanicOnExtract => panic!("renderer crashed"),
            Behavior::Blocked | Behavior::BlockedScreenshotFails => {
                Ok(page("보안 확인을 완료해 주세요"))
            }
            _ => Ok(page("정상 상품 페이지 배송비 무료")),
        }
    }

    async fn screenshot(&self, quality: u8) -> Result<String, ScrapeError> {
        self.calls.screenshots.lock().unwrap().push(quality);
        if self.behavior == Behavior::BlockedScreenshotFails {
            return Err(ScrapeError::Browser("target closed".into()));
        }
        Ok("data:image/jpeg;base64,/9j/AAAA".to_string())
    }

    async fn close(self) -> Result<(), ScrapeError> {
        self.calls.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn test_config() -> BrowserConfig {
    BrowserConfig {
        navigation_timeout: Duration::from_millis(200),
        selector_timeout: Duration::from_millis(200),
        timing: HumanTiming::instant(),
        profile: StealthProfile::default(),
    }
}

fn scraper(behavior: Behavior) -> (BrowserScraper<FakeLauncher>, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let launcher = FakeLauncher {
        behavior,
        calls: Arc::clone(&calls),
    };
    (
        BrowserScraper::new(launcher, BlockDetector::default(), test_config()),
        calls,
    )
}

const WITH_SCREENSHOT: ScrapeOptions = ScrapeOptions {
    capture_screenshot: true,
};

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_visit_returns_browser_content() {
    let (scraper, calls) = scraper(Behavior::Normal);
    let result = scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    assert!(result.is_success(), "expected success, got {result:?}");
    assert_eq!(result.method(), FetchMethod::Browser);
    let content = result.content().unwrap();
    assert_eq!(content.url, "https://smartstore.naver.com/abc/products/12345");
    assert_eq!(content.title.as_deref(), Some("무선 이어폰"));
    assert_eq!(content.images, vec!["https://shop-phinf.pstatic.net/a.jpg"]);
    assert_eq!(content.meta.keywords, vec!["이어폰", "블루투스"]);
    assert!(content.screenshot.is_none());
    assert!(calls.screenshots.lock().unwrap().is_empty());

    assert_eq!(calls.launched(), 1);
    assert_eq!(calls.closed(), 1);
}

#[tokio::test]
async fn visit_follows_the_human_sequence() {
    let (scraper, calls) = scraper(Behavior::Normal);
    scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    let navigations = calls.navigations.lock().unwrap().clone();
    assert_eq!(navigations.len(), 1);
    let (url, referrer) = &navigations[0];
    assert_eq!(url, "https://smartstore.naver.com/abc/products/12345");
    assert!(REFERRER_POOL.iter().any(|p| referrer.starts_with(p)));

    let moves = calls.mouse_moves.load(Ordering::SeqCst);
    assert!((3..=5).contains(&moves), "mouse moves: {moves}");

    let scripts = calls.scripts.lock().unwrap().clone();
    assert!(scripts[0].contains("window.scrollTo(0, 200)"));
    assert!(scripts.iter().any(|s| s.contains("behavior: 'smooth'")));
    assert!(
        scripts.last().unwrap().contains("rawHtml"),
        "extraction runs after scrolling"
    );
}

#[tokio::test]
async fn launcher_receives_korean_stealth_settings() {
    let (scraper, calls) = scraper(Behavior::Normal);
    scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    let settings = calls.settings.lock().unwrap().clone().unwrap();
    assert!((1440..=1599).contains(&settings.viewport.width));
    assert!((900..=979).contains(&settings.viewport.height));
    assert_eq!(settings.locale, "ko-KR");
    assert_eq!(settings.timezone, "Asia/Seoul");
    assert_eq!(settings.geolocation, (37.5665, 126.9780));
    assert!(settings.init_script.contains("'webdriver', false"));
    assert!(settings
        .extra_headers
        .iter()
        .any(|(k, _)| k == "Sec-Ch-Ua-Platform"));
}

#[tokio::test]
async fn requested_screenshot_is_attached_on_success() {
    let (scraper, calls) = scraper(Behavior::Normal);
    let result = scraper.scrape(PRODUCT_URL, WITH_SCREENSHOT).await;

    let content = result.content().unwrap();
    assert_eq!(
        content.screenshot.as_deref(),
        Some("data:image/jpeg;base64,/9j/AAAA")
    );
    assert_eq!(*calls.screenshots.lock().unwrap(), vec![85]);
    assert!(calls
        .scripts
        .lock()
        .unwrap()
        .last()
        .unwrap()
        .contains("window.scrollTo(0, 0)"));
    assert_eq!(calls.closed(), 1);
}

// ---------------------------------------------------------------------------
// Teardown on every exit path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn navigation_error_still_closes_session() {
    let (scraper, calls) = scraper(Behavior::NavigateFails);
    let result = scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    assert!(matches!(result.error(), Some(ScrapeError::Browser(_))));
    assert_eq!(result.method(), FetchMethod::Browser);
    assert_eq!(calls.launched(), 1);
    assert_eq!(calls.closed(), 1);
}

#[tokio::test]
async fn hung_navigation_times_out_and_closes_session() {
    let (scraper, calls) = scraper(Behavior::NavigateHangs);
    let result = scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    match result.error() {
        Some(ScrapeError::NavigationTimeout { url, timeout_ms }) => {
            assert_eq!(url, "https://smartstore.naver.com/abc/products/12345");
            assert_eq!(*timeout_ms, 200);
        }
        other => panic!("expected NavigationTimeout, got {other:?}"),
    }
    assert!(result.error().unwrap().is_retryable());
    assert_eq!(calls.closed(), 1);
}

#[tokio::test]
async fn panic_inside_visit_becomes_failure_and_closes_session() {
    let (scraper, calls) = scraper(Behavior::PanicOnExtract);
    let result = scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    match result.error() {
        Some(ScrapeError::Unexpected(message)) => assert!(message.contains("renderer crashed")),
        other => panic!("expected Unexpected, got {other:?}"),
    }
    assert_eq!(calls.launched(), 1);
    assert_eq!(calls.closed(), 1);
}

#[tokio::test]
async fn failed_launch_has_nothing_to_close() {
    let (scraper, calls) = scraper(Behavior::LaunchFails);
    let result = scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    assert!(matches!(
        result.error(),
        Some(ScrapeError::BrowserNotFound { .. })
    ));
    assert_eq!(calls.launched(), 0);
    assert_eq!(calls.closed(), 0);
}

#[tokio::test]
async fn invalid_url_never_launches() {
    let (scraper, calls) = scraper(Behavior::Normal);
    let result = scraper.scrape("not a url", ScrapeOptions::default()).await;

    assert!(matches!(result.error(), Some(ScrapeError::InvalidUrl { .. })));
    assert_eq!(calls.launched(), 0);
}

#[tokio::test]
async fn missing_chrome_is_browser_not_found() {
    let launcher = WebDriverLauncher::new("http://127.0.0.1:9", true)
        .with_chrome_paths(vec!["/nonexistent/google-chrome".into()]);
    let scraper = BrowserScraper::new(launcher, BlockDetector::default(), test_config());
    let result = scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    match result.error() {
        Some(ScrapeError::BrowserNotFound { searched }) => {
            assert_eq!(searched, &vec!["/nonexistent/google-chrome".to_string()]);
        }
        other => panic!("expected BrowserNotFound, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Block pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blocked_page_attaches_diagnostic_screenshot() {
    let (scraper, calls) = scraper(Behavior::Blocked);
    let result = scraper.scrape(PRODUCT_URL, WITH_SCREENSHOT).await;

    assert!(result.is_blocked());
    match &result {
        ScrapeResult::Failure {
            method, screenshot, ..
        } => {
            assert_eq!(*method, FetchMethod::Browser);
            assert_eq!(screenshot.as_deref(), Some("data:image/jpeg;base64,/9j/AAAA"));
        }
        ScrapeResult::Success { .. } => panic!("expected failure"),
    }
    assert_eq!(*calls.screenshots.lock().unwrap(), vec![80]);
    assert_eq!(calls.closed(), 1);
}

#[tokio::test]
async fn blocked_page_without_screenshot_request_takes_none() {
    let (scraper, calls) = scraper(Behavior::Blocked);
    let result = scraper.scrape(PRODUCT_URL, ScrapeOptions::default()).await;

    assert!(result.is_blocked());
    assert!(calls.screenshots.lock().unwrap().is_empty());
}

#[tokio::test]
async fn screenshot_failure_does_not_mask_block() {
    let (scraper, calls) = scraper(Behavior::BlockedScreenshotFails);
    let result = scraper.scrape(PRODUCT_URL, WITH_SCREENSHOT).await;

    assert!(result.is_blocked(), "block must survive screenshot failure");
    assert!(matches!(
        result,
        ScrapeResult::Failure {
            screenshot: None,
            ..
        }
    ));
    assert_eq!(calls.closed(), 1);
}

// ---------------------------------------------------------------------------
// Static → browser fallback
// ---------------------------------------------------------------------------

fn fetcher() -> StaticFetcher {
    StaticFetcher::new(5, "storedesk-test/0.1", BlockDetector::default()).unwrap()
}

#[tokio::test]
async fn fallback_skips_browser_when_static_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>item</title></head><body>in stock</body></html>",
        ))
        .mount(&server)
        .await;

    let (browser, calls) = scraper(Behavior::Normal);
    let result = scrape_with_fallback(
        &fetcher(),
        &browser,
        &format!("{}/item", server.uri()),
        ScrapeOptions::default(),
    )
    .await;

    assert_eq!(result.method(), FetchMethod::Static);
    assert!(result.is_success());
    assert_eq!(calls.launched(), 0);
}

#[tokio::test]
async fn fallback_uses_browser_once_after_static_block() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>보안 확인</title></head><body>캡차이미지</body></html>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let (browser, calls) = scraper(Behavior::Normal);
    let result = scrape_with_fallback(
        &fetcher(),
        &browser,
        &format!("{}/item", server.uri()),
        ScrapeOptions::default(),
    )
    .await;

    assert!(result.is_success());
    assert_eq!(result.method(), FetchMethod::Browser);
    assert_eq!(calls.launched(), 1);
    assert_eq!(calls.closed(), 1);
}

#[tokio::test]
async fn fallback_reports_browser_failure_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (browser, calls) = scraper(Behavior::Blocked);
    let result = scrape_with_fallback(
        &fetcher(),
        &browser,
        &server.uri(),
        ScrapeOptions::default(),
    )
    .await;

    assert!(result.is_blocked());
    assert_eq!(result.method(), FetchMethod::Browser);
    assert_eq!(calls.launched(), 1);
}

#[tokio::test]
async fn fallback_does_not_launch_for_invalid_url() {
    let (browser, calls) = scraper(Behavior::Normal);
    let result =
        scrape_with_fallback(&fetcher(), &browser, "mailto:a@b.c", ScrapeOptions::default()).await;

    assert!(matches!(result.error(), Some(ScrapeError::InvalidUrl { .. })));
    assert_eq!(calls.launched(), 0);
}
