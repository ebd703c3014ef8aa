use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a set env var carries an unparseable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a set env var carries an unparseable value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("ROCKETLENS_ENV", "development"));
    let log_level = or_default("ROCKETLENS_LOG_LEVEL", "info");

    let wing_base_url = or_default("ROCKETLENS_WING_BASE_URL", "https://wing.coupang.com");
    let retail_base_url = or_default("ROCKETLENS_RETAIL_BASE_URL", "https://www.coupang.com");
    let session_token = lookup("ROCKETLENS_SESSION_TOKEN").ok().filter(|t| !t.is_empty());

    let request_timeout_secs = parse_u64("ROCKETLENS_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default(
        "ROCKETLENS_USER_AGENT",
        "rocketlens/0.1 (seller-metrics collector)",
    );
    let max_concurrent_lookups = parse_usize("ROCKETLENS_MAX_CONCURRENT_LOOKUPS", "8")?;
    let export_dir = PathBuf::from(or_default("ROCKETLENS_EXPORT_DIR", "."));
    let vendor_return_page_size = parse_u32("ROCKETLENS_RETURN_PAGE_SIZE", "50")?;

    Ok(AppConfig {
        env,
        log_level,
        wing_base_url,
        retail_base_url,
        session_token,
        request_timeout_secs,
        user_agent,
        max_concurrent_lookups,
        export_dir,
        vendor_return_page_size,
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
