use crate::app_config::{AppConfig, BrowserKind, Environment, DEFAULT_USER_AGENT};
use crate::ConfigError;

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

    let env = parse_environment(&or_default("AVSC_ENV", "development"))?;
    let log_level = or_default("AVSC_LOG_LEVEL", "info");
    let base_url = or_default("AVSC_BASE_URL", "https://www.avantorsciences.com/");
    let webdriver_url = or_default("AVSC_WEBDRIVER_URL", "http://localhost:9515");
    let browser = parse_browser(&or_default("AVSC_BROWSER", "chrome"))?;
    let headless = parse_bool("AVSC_HEADLESS", &or_default("AVSC_HEADLESS", "false"))?;
    let user_agent = or_default("AVSC_USER_AGENT", DEFAULT_USER_AGENT);

    let popup_timeout_ms = parse_u64("AVSC_POPUP_TIMEOUT_MS", "5000")?;
    let cookie_timeout_ms = parse_u64("AVSC_COOKIE_TIMEOUT_MS", "3000")?;
    let wait_timeout_ms = parse_u64("AVSC_WAIT_TIMEOUT_MS", "20000")?;
    let search_timeout_ms = parse_u64("AVSC_SEARCH_TIMEOUT_MS", "15000")?;
    let submit_grace_ms = parse_u64("AVSC_SUBMIT_GRACE_MS", "3000")?;
    let poll_interval_ms = parse_u64("AVSC_POLL_INTERVAL_MS", "250")?;
    if poll_interval_ms == 0 {
        return Err(invalid("AVSC_POLL_INTERVAL_MS", "must be at least 1".into()));
    }

    let output_dir = PathBuf::from(or_default("AVSC_OUTPUT_DIR", "./output"));
    let max_concurrent_sessions = parse_usize("AVSC_MAX_CONCURRENT_SESSIONS", "1")?;
    if max_concurrent_sessions == 0 {
        return Err(invalid(
            "AVSC_MAX_CONCURRENT_SESSIONS",
            "must be at least 1".into(),
        ));
    }
    let inter_product_delay_ms = parse_u64("AVSC_INTER_PRODUCT_DELAY_MS", "3000")?;
    let max_retries = parse_u32("AVSC_MAX_RETRIES", "1")?;
    let retry_backoff_base_secs = parse_u64("AVSC_RETRY_BACKOFF_BASE_SECS", "2")?;

    Ok(AppConfig {
        env,
        log_level,
        base_url,
        webdriver_url,
        browser,
        headless,
        user_agent,
        popup_timeout_ms,
        cookie_timeout_ms,
        wait_timeout_ms,
        search_timeout_ms,
        submit_grace_ms,
        poll_interval_ms,
        output_dir,
        max_concurrent_sessions,
        inter_product_delay_ms,
        max_retries,
        retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AVSC_ENV".to_string(),
            reason: format!("expected development, test, or production; got \"{other}\""),
        }),
    }
}

fn parse_browser(s: &str) -> Result<BrowserKind, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "chrome" | "chromium" => Ok(BrowserKind::Chrome),
        "firefox" => Ok(BrowserKind::Firefox),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AVSC_BROWSER".to_string(),
            reason: format!("unsupported browser \"{other}\""),
        }),
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
