use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Postgres connection string. When unset, tracking records live in an
    /// in-memory store for the lifetime of the process.
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// YAML file overriding the built-in block indicator list.
    pub block_indicators_path: Option<PathBuf>,
    pub webdriver_url: String,
    pub browser_headless: bool,
    pub browser_navigation_timeout_secs: u64,
    pub browser_selector_timeout_secs: u64,
    pub carrier_request_timeout_secs: u64,
    pub tracking_inter_call_delay_ms: u64,
    /// Hours of the day (Korea Standard Time) at which scheduled delivery
    /// checks run.
    pub delivery_check_hours: Vec<u32>,
    pub delivery_check_batch_limit: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("block_indicators_path", &self.block_indicators_path)
            .field("webdriver_url", &self.webdriver_url)
            .field("browser_headless", &self.browser_headless)
            .field(
                "browser_navigation_timeout_secs",
                &self.browser_navigation_timeout_secs,
            )
            .field(
                "browser_selector_timeout_secs",
                &self.browser_selector_timeout_secs,
            )
            .field(
                "carrier_request_timeout_secs",
                &self.carrier_request_timeout_secs,
            )
            .field(
                "tracking_inter_call_delay_ms",
                &self.tracking_inter_call_delay_ms,
            )
            .field("delivery_check_hours", &self.delivery_check_hours)
            .field(
                "delivery_check_batch_limit",
                &self.delivery_check_batch_limit,
            )
            .finish()
    }
}
