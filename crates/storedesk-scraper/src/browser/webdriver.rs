//! Chrome over WebDriver, with DevTools commands for the stealth setup.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};
use storedesk_core::AppConfig;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};

use super::session::{BrowserLauncher, BrowserSession, SessionSettings};
use crate::error::ScrapeError;

/// Where a real Chrome install usually lives, per OS.
pub const DEFAULT_CHROME_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium-browser",
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

const CHROME_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-features=IsolateOrigins,site-per-process",
    "--disable-infobars",
    "--disable-dev-shm-usage",
    "--no-first-run",
    "--no-default-browser-check",
    "--lang=ko-KR",
];

const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// First existing path among `candidates`.
///
/// # Errors
///
/// Returns [`ScrapeError::BrowserNotFound`] listing every searched path.
pub fn find_chrome_binary<P: AsRef<Path>>(candidates: &[P]) -> Result<PathBuf, ScrapeError> {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| ScrapeError::BrowserNotFound {
            searched: candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect(),
        })
}

fn browser_err(context: &str) -> impl Fn(WebDriverError) -> ScrapeError + '_ {
    move |e| ScrapeError::Browser(format!("{context}: {e}"))
}

/// Launches a local Chrome through a running chromedriver.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: String,
    chrome_paths: Vec<PathBuf>,
    headless: bool,
}

impl WebDriverLauncher {
    #[must_use]
    pub fn new(webdriver_url: impl Into<String>, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            chrome_paths: DEFAULT_CHROME_PATHS.iter().map(PathBuf::from).collect(),
            headless,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.webdriver_url.as_str(), config.browser_headless)
    }

    /// Replace the install paths searched for Chrome.
    #[must_use]
    pub fn with_chrome_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.chrome_paths = paths;
        self
    }

    fn capabilities(
        &self,
        binary: &Path,
        settings: &SessionSettings,
    ) -> Result<ChromeCapabilities, ScrapeError> {
        let caps_err = browser_err("invalid chrome capabilities");
        let mut caps = DesiredCapabilities::chrome();
        caps.set_binary(&binary.display().to_string())
            .map_err(&caps_err)?;
        for arg in CHROME_ARGS {
            caps.add_arg(arg).map_err(&caps_err)?;
        }
        caps.add_arg(&format!(
            "--window-size={},{}",
            settings.viewport.width, settings.viewport.height
        ))
        .map_err(&caps_err)?;
        caps.add_arg(&format!("--user-agent={}", settings.user_agent))
            .map_err(&caps_err)?;
        if self.headless {
            caps.set_headless().map_err(&caps_err)?;
        }
        Ok(caps)
    }
}

impl BrowserLauncher for WebDriverLauncher {
    type Session = WebDriverSession;

    async fn launch(&self, settings: &SessionSettings) -> Result<WebDriverSession, ScrapeError> {
        let binary = find_chrome_binary(&self.chrome_paths)?;
        let caps = self.capabilities(&binary, settings)?;
        let driver = WebDriver::new(self.webdriver_url.as_str(), caps)
            .await
            .map_err(browser_err("failed to start chrome session"))?;

        let session = WebDriverSession {
            driver,
            pointer: Mutex::new((0.0, 0.0)),
        };
        // The session is already live; release it if the stealth setup fails.
        if let Err(e) = session.prepare(settings).await {
            if let Err(close_err) = session.close().await {
                tracing::warn!(error = %close_err, "failed to close chrome after setup error");
            }
            return Err(e);
        }
        tracing::debug!(binary = %binary.display(), "chrome session ready");
        Ok(session)
    }
}

pub struct WebDriverSession {
    driver: WebDriver,
    pointer: Mutex<(f64, f64)>,
}

impl WebDriverSession {
    fn devtools(&self) -> ChromeDevTools {
        ChromeDevTools::new(self.driver.handle.clone())
    }

    async fn cdp(&self, command: &str, params: Value) -> Result<Value, ScrapeError> {
        self.devtools()
            .execute_cdp_with_params(command, params)
            .await
            .map_err(browser_err(command))
    }

    /// Emulation and the init script, all before the first navigation.
    async fn prepare(&self, settings: &SessionSettings) -> Result<(), ScrapeError> {
        self.cdp(
            "Page.addScriptToEvaluateOnNewDocument",
            json!({ "source": settings.init_script }),
        )
        .await?;
        self.cdp(
            "Emulation.setDeviceMetricsOverride",
            json!({
                "width": settings.viewport.width,
                "height": settings.viewport.height,
                "deviceScaleFactor": 1,
                "mobile": false,
            }),
        )
        .await?;
        self.cdp(
            "Emulation.setTimezoneOverride",
            json!({ "timezoneId": settings.timezone }),
        )
        .await?;
        self.cdp(
            "Emulation.setLocaleOverride",
            json!({ "locale": settings.locale }),
        )
        .await?;
        self.cdp(
            "Browser.grantPermissions",
            json!({ "permissions": ["geolocation"] }),
        )
        .await?;
        let (latitude, longitude) = settings.geolocation;
        self.cdp(
            "Emulation.setGeolocationOverride",
            json!({ "latitude": latitude, "longitude": longitude, "accuracy": 100 }),
        )
        .await?;
        self.cdp(
            "Network.setUserAgentOverride",
            json!({
                "userAgent": settings.user_agent,
                "acceptLanguage": settings.locale,
                "platform": "MacIntel",
            }),
        )
        .await?;
        self.cdp("Network.enable", json!({})).await?;
        let headers: serde_json::Map<String, Value> = settings
            .extra_headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.cdp(
            "Network.setExtraHTTPHeaders",
            json!({ "headers": headers }),
        )
        .await?;
        Ok(())
    }
}

impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str, referrer: &str) -> Result<(), ScrapeError> {
        let result = self
            .cdp("Page.navigate", json!({ "url": url, "referrer": referrer }))
            .await?;
        match result.get("errorText").and_then(Value::as_str) {
            Some(error) if !error.is_empty() => {
                Err(ScrapeError::Browser(format!("navigation failed: {error}")))
            }
            _ => Ok(()),
        }
    }

    async fn wait_for_selector(&self, css: &str, timeout: Duration) -> Result<(), ScrapeError> {
        self.driver
            .query(By::Css(css))
            .wait(timeout, SELECTOR_POLL)
            .first()
            .await
            .map(|_| ())
            .map_err(browser_err("selector wait failed"))
    }

    async fn mouse_move(&self, x: f64, y: f64, steps: u32) -> Result<(), ScrapeError> {
        let (from_x, from_y) = self.pointer.lock().map(|p| *p).unwrap_or((0.0, 0.0));
        let steps = steps.max(1);
        for i in 1..=steps {
            let t = f64::from(i) / f64::from(steps);
            self.cdp(
                "Input.dispatchMouseEvent",
                json!({
                    "type": "mouseMoved",
                    "x": from_x + (x - from_x) * t,
                    "y": from_y + (y - from_y) * t,
                }),
            )
            .await?;
        }
        if let Ok(mut pointer) = self.pointer.lock() {
            *pointer = (x, y);
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError> {
        let ret = self
            .driver
            .execute(script, Vec::new())
            .await
            .map_err(browser_err("script evaluation failed"))?;
        Ok(ret.json().clone())
    }

    async fn screenshot(&self, quality: u8) -> Result<String, ScrapeError> {
        let result = self
            .cdp(
                "Page.captureScreenshot",
                json!({ "format": "jpeg", "quality": quality, "captureBeyondViewport": true }),
            )
            .await?;
        let data = result
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| ScrapeError::Browser("screenshot returned no data".to_string()))?;
        Ok(format!("data:image/jpeg;base64,{data}"))
    }

    async fn close(self) -> Result<(), ScrapeError> {
        self.driver
            .quit()
            .await
            .map_err(browser_err("failed to quit chrome"))
    }
}
