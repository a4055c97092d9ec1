use std::path::PathBuf;

use crate::app_config::{AppConfig, Credentials, KNOWN_CREDENTIAL_VARS};
use crate::ConfigError;

/// Load runtime configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
/// `required_vars` are the template's `validation.required_env_vars`; they are
/// captured alongside the well-known credential variables so the runner can
/// check them without touching the process environment again.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric setting cannot be parsed.
pub fn load_app_config(required_vars: &[String]) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env(required_vars)
}

/// Load runtime configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a numeric setting cannot be parsed.
pub fn load_app_config_from_env(required_vars: &[String]) -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key), required_vars)
}

/// Capture a template's `validation.required_env_vars` into a config that was
/// built before the template was known.
///
/// Reads the process environment; values already captured are kept.
pub fn capture_required_vars(config: &mut AppConfig, required_vars: &[String]) {
    capture_with(config, |key| std::env::var(key), required_vars);
}

fn capture_with<F>(config: &mut AppConfig, lookup: F, required_vars: &[String])
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    config
        .credentials
        .capture(required_vars, |name| lookup(name).ok());
}

/// Build runtime configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F, required_vars: &[String]) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("HYPO_LOG_LEVEL", "info");
    let output_dir = PathBuf::from(or_default("HYPO_OUTPUT_DIR", "./results"));
    let request_timeout_secs = parse_u64("HYPO_REQUEST_TIMEOUT_SECS", "30")?;
    let inter_call_delay_ms = parse_u64("HYPO_INTER_CALL_DELAY_MS", "500")?;
    let max_retries = parse_u32("HYPO_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("HYPO_RETRY_BACKOFF_BASE_MS", "1000")?;

    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "HYPO_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let known = KNOWN_CREDENTIAL_VARS
        .iter()
        .copied()
        .filter_map(|name| lookup(name).ok().map(|value| (name.to_string(), value)));

    let mut config = AppConfig {
        log_level,
        output_dir,
        request_timeout_secs,
        inter_call_delay_ms,
        max_retries,
        retry_backoff_base_ms,
        credentials: Credentials::from_pairs(known),
    };
    capture_with(&mut config, lookup, required_vars);
    Ok(config)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
