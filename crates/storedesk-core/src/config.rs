use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Desktop Chrome on macOS; plain HTTP fetches present the same browser
/// identity as the stealth browser session.
pub const DEFAULT_SCRAPER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(invalid(var, format!("expected a boolean, got \"{raw}\""))),
        }
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
    let env = parse_environment(&or_default("STOREDESK_ENV", "development"));
    // Production must persist trackings; the in-memory fallback is for local runs.
    if env == Environment::Production && database_url.is_none() {
        return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }
    let log_level = or_default("STOREDESK_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("STOREDESK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("STOREDESK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STOREDESK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("STOREDESK_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("STOREDESK_SCRAPER_USER_AGENT", DEFAULT_SCRAPER_USER_AGENT);
    let block_indicators_path = lookup("STOREDESK_BLOCK_INDICATORS_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let webdriver_url = or_default("STOREDESK_WEBDRIVER_URL", "http://localhost:9515");
    let browser_headless = parse_bool("STOREDESK_BROWSER_HEADLESS", "true")?;
    let browser_navigation_timeout_secs =
        parse_u64("STOREDESK_BROWSER_NAVIGATION_TIMEOUT_SECS", "30")?;
    let browser_selector_timeout_secs = parse_u64("STOREDESK_BROWSER_SELECTOR_TIMEOUT_SECS", "10")?;

    let carrier_request_timeout_secs = parse_u64("STOREDESK_CARRIER_REQUEST_TIMEOUT_SECS", "15")?;
    let tracking_inter_call_delay_ms = parse_u64("STOREDESK_TRACKING_INTER_CALL_DELAY_MS", "300")?;

    let delivery_check_hours = parse_hours(&or_default("STOREDESK_DELIVERY_CHECK_HOURS", "9,15,21"))
        .map_err(|reason| invalid("STOREDESK_DELIVERY_CHECK_HOURS", reason))?;
    let delivery_check_batch_limit = parse_usize("STOREDESK_DELIVERY_CHECK_BATCH_LIMIT", "100")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        block_indicators_path,
        webdriver_url,
        browser_headless,
        browser_navigation_timeout_secs,
        browser_selector_timeout_secs,
        carrier_request_timeout_secs,
        tracking_inter_call_delay_ms,
        delivery_check_hours,
        delivery_check_batch_limit,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Parse a comma-separated list of hours (0-23), sorted and deduplicated.
fn parse_hours(raw: &str) -> Result<Vec<u32>, String> {
    let mut hours = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let hour = part
            .parse::<u32>()
            .map_err(|e| format!("\"{part}\" is not an hour: {e}"))?;
        if hour > 23 {
            return Err(format!("hour {hour} is out of range 0-23"));
        }
        hours.push(hour);
    }
    if hours.is_empty() {
        return Err("at least one hour is required".to_string());
    }
    hours.sort_unstable();
    hours.dedup();
    Ok(hours)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
