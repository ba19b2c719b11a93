use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::{GeminiUpstreamConfig, RelayOptions};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Inline images are base64 in the body, so the limit sits well above
/// axum's 2 MiB default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RelayServiceConfig {
    pub common: core_config::Config,
    pub gemini: GeminiConfig,
    pub relay: RelayOptions,
    pub http: HttpConfig,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Absence is reported per request, not at startup.
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub model: String,
    /// Unset means the upstream call may wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_API_BASE.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout_secs: None,
        }
    }
}

impl GeminiConfig {
    pub fn upstream_config(&self) -> GeminiUpstreamConfig {
        GeminiUpstreamConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Browser origins allowed by CORS; empty or `*` allows any.
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl RelayServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let defaults = RelayOptions::default();

        Ok(RelayServiceConfig {
            common,
            gemini: GeminiConfig {
                api_key: optional_env("GEMINI_API_KEY").map(Secret::new),
                base_url: optional_env("GEMINI_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
                model: optional_env("GEMINI_IMAGE_MODEL")
                    .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
                timeout_secs: optional_env("RELAY_UPSTREAM_TIMEOUT_SECS")
                    .map(|raw| parse_value("RELAY_UPSTREAM_TIMEOUT_SECS", &raw))
                    .transpose()?,
            },
            relay: RelayOptions {
                strict_validation: parse_flag(
                    "RELAY_STRICT_VALIDATION",
                    optional_env("RELAY_STRICT_VALIDATION"),
                    defaults.strict_validation,
                )?,
                include_safety_settings: parse_flag(
                    "RELAY_INCLUDE_SAFETY_SETTINGS",
                    optional_env("RELAY_INCLUDE_SAFETY_SETTINGS"),
                    defaults.include_safety_settings,
                )?,
            },
            http: HttpConfig {
                allowed_origins: optional_env("RELAY_ALLOWED_ORIGINS")
                    .map(|raw| parse_origins(&raw))
                    .unwrap_or_else(|| vec!["*".to_string()]),
                max_body_bytes: optional_env("RELAY_MAX_BODY_BYTES")
                    .map(|raw| parse_value("RELAY_MAX_BODY_BYTES", &raw))
                    .transpose()?
                    .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            },
        })
    }
}

/// Set and non-blank variables only.
fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e))
    })
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> Result<bool, AppError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be a boolean, got '{}'",
            key,
            raw
        ))),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
