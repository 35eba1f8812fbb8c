//! Configuration parsed from environment variables.
//!
//! Tuning knobs fall back to defaults when absent or unparsable. API keys are
//! only required by the client that needs them, so a questionnaire-only run
//! works without any key set.

use std::time::Duration;

use dispatch::RetryPolicy;
use dispatch::policy::{DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_MS};
use dispatch::transport::DEFAULT_CONNECT_TIMEOUT_SECS;

pub const DEFAULT_PLANT_ID_BASE_URL: &str = "https://api.plant.id/v2";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_DIAGNOSIS_THRESHOLD: f64 = 0.6;
pub const DEFAULT_SYMPTOM_THRESHOLD: f64 = 0.6;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// A configuration value is present but invalid.
    #[error("config parse failed: {0}")]
    Parse(String),
}

impl dispatch::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::Parse(_) => "E_CONFIG_PARSE",
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub max_attempts: u32,
    pub retry_base_ms: u64,
    pub attempt_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl DispatchConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_attempts: env_parse("DISPATCH_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS),
            retry_base_ms: env_parse("DISPATCH_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS),
            attempt_timeout_secs: env_parse("DISPATCH_ATTEMPT_TIMEOUT_SECS", DEFAULT_ATTEMPT_TIMEOUT_SECS),
            connect_timeout_secs: env_parse("DISPATCH_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_base_ms),
            Duration::from_secs(self.attempt_timeout_secs),
        )
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantIdConfig {
    pub api_key: String,
    pub base_url: String,
    pub threshold: f64,
    pub top_only: bool,
}

impl PlantIdConfig {
    /// Read `PLANT_ID_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `PLANT_ID_API_KEY` is unset or the threshold is
    /// outside `[0, 1]`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: require_env("PLANT_ID_API_KEY")?,
            base_url: base_url_env("PLANT_ID_BASE_URL", DEFAULT_PLANT_ID_BASE_URL),
            threshold: threshold_env("PLANT_ID_THRESHOLD", DEFAULT_DIAGNOSIS_THRESHOLD)?,
            top_only: env_parse("PLANT_ID_TOP_ONLY", false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    /// Read `GEMINI_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `GEMINI_API_KEY` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: require_env("GEMINI_API_KEY")?,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: base_url_env("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
        })
    }
}

/// Cutoff applied to questionnaire results (`SYMPTOM_THRESHOLD`).
///
/// # Errors
///
/// Returns an error if the value is outside `[0, 1]`.
pub fn symptom_threshold() -> Result<f64, ConfigError> {
    threshold_env("SYMPTOM_THRESHOLD", DEFAULT_SYMPTOM_THRESHOLD)
}

// =============================================================================
// HELPERS
// =============================================================================

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn require_env(var: &str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingApiKey { var: var.into() }),
    }
}

fn base_url_env(key: &str, default: &str) -> String {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn threshold_env(key: &str, default: f64) -> Result<f64, ConfigError> {
    let value = env_parse(key, default);
    validate_threshold(value).map_err(|_| ConfigError::Parse(format!("{key} must be within [0, 1], got {value}")))
}

/// Check that a probability cutoff lies in `[0, 1]`.
///
/// # Errors
///
/// Returns the offending value when it is out of range or not finite.
pub fn validate_threshold(value: f64) -> Result<f64, f64> {
    if (0.0..=1.0).contains(&value) { Ok(value) } else { Err(value) }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
