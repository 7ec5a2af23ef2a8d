//! Fingerprint surface patched into every page before its own scripts run.
//!
//! The patch is one template rendered from a [`StealthProfile`], so the
//! exact script a browser receives can be asserted on without launching one.

use serde::Serialize;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const LOCALE: &str = "ko-KR";
pub const TIMEZONE: &str = "Asia/Seoul";
/// Seoul City Hall.
pub const GEOLOCATION: (f64, f64) = (37.5665, 126.9780);

/// Values the patched `navigator`, `screen` and WebGL report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StealthProfile {
    pub plugins: Vec<String>,
    pub languages: Vec<String>,
    pub platform: String,
    pub hardware_concurrency: u32,
    pub device_memory: u32,
    pub max_touch_points: u32,
    pub color_depth: u32,
    pub notification_permission: String,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            plugins: vec![
                "Chrome PDF Plugin".to_string(),
                "Chrome PDF Viewer".to_string(),
                "Native Client".to_string(),
            ],
            languages: vec![
                "ko-KR".to_string(),
                "ko".to_string(),
                "en-US".to_string(),
                "en".to_string(),
            ],
            platform: "MacIntel".to_string(),
            hardware_concurrency: 8,
            device_memory: 8,
            max_touch_points: 0,
            color_depth: 24,
            notification_permission: "default".to_string(),
            webgl_vendor: "Intel Inc.".to_string(),
            webgl_renderer: "Intel Iris OpenGL Engine".to_string(),
        }
    }
}

const INIT_TEMPLATE: &str = r"(() => {
  const profile = __PROFILE__;
  const define = (target, key, value) =>
    Object.defineProperty(target, key, { get: () => value, configurable: true });

  define(Navigator.prototype, 'webdriver', false);
  define(Navigator.prototype, 'languages', profile.languages);
  define(Navigator.prototype, 'platform', profile.platform);
  define(Navigator.prototype, 'hardwareConcurrency', profile.hardwareConcurrency);
  define(Navigator.prototype, 'deviceMemory', profile.deviceMemory);
  define(Navigator.prototype, 'maxTouchPoints', profile.maxTouchPoints);
  define(Screen.prototype, 'colorDepth', profile.colorDepth);
  define(Screen.prototype, 'pixelDepth', profile.colorDepth);

  const plugins = profile.plugins.map((name) => ({ name, filename: name, description: name }));
  plugins.item = (i) => plugins[i] || null;
  plugins.namedItem = (n) => plugins.find((p) => p.name === n) || null;
  plugins.refresh = () => {};
  define(Navigator.prototype, 'plugins', plugins);

  if (!window.chrome) {
    window.chrome = { runtime: {}, app: {}, csi: () => {}, loadTimes: () => {} };
  }

  const permissions = window.navigator.permissions;
  if (permissions && permissions.query) {
    const query = permissions.query.bind(permissions);
    permissions.query = (params) =>
      params && params.name === 'notifications'
        ? Promise.resolve({ state: profile.notificationPermission, onchange: null })
        : query(params);
  }

  const patchWebGl = (proto) => {
    if (!proto) return;
    const getParameter = proto.getParameter;
    proto.getParameter = function (parameter) {
      if (parameter === 37445) return profile.webglVendor;
      if (parameter === 37446) return profile.webglRenderer;
      return getParameter.call(this, parameter);
    };
  };
  patchWebGl(window.WebGLRenderingContext && WebGLRenderingContext.prototype);
  patchWebGl(window.WebGL2RenderingContext && WebGL2RenderingContext.prototype);
})();";

impl StealthProfile {
    /// The init script for this profile.
    #[must_use]
    pub fn render_init_script(&self) -> String {
        // serde_json output is a valid JS object literal, and serializing a
        // plain struct of strings and integers cannot fail.
        let profile = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        INIT_TEMPLATE.replace("__PROFILE__", &profile)
    }
}

/// Client-hint and language headers matching [`BROWSER_USER_AGENT`].
#[must_use]
pub fn extra_headers() -> Vec<(String, String)> {
    [
        ("Accept-Language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
        (
            "Sec-Ch-Ua",
            r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#,
        ),
        ("Sec-Ch-Ua-Mobile", "?0"),
        ("Sec-Ch-Ua-Platform", r#""macOS""#),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
