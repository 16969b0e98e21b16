//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;

use crate::net::envelope::{DEFAULT_TOKEN_FIELD, Envelope, ResponseShape};

pub const DEFAULT_API_ROOT: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_STORAGE_PATH: &str = ".userdesk/storage.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root every API path is resolved against, without a trailing `/`.
    pub api_root: String,
    pub shape: ResponseShape,
    pub storage_path: PathBuf,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Defaults with the given API root.
    #[must_use]
    pub fn new(api_root: &str) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_owned(),
            shape: ResponseShape::default(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            timeouts: Timeouts::default(),
        }
    }

    /// Build typed config from environment variables.
    ///
    /// All optional:
    /// - `USERDESK_API_ROOT`: default `http://127.0.0.1:8000/api`
    /// - `USERDESK_TOKEN_FIELD`: default `access_token`
    /// - `USERDESK_ENVELOPE`: `auto` (default), `flat` or `nested`
    /// - `USERDESK_STORAGE_PATH`: default `.userdesk/storage.json`
    /// - `USERDESK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `USERDESK_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown envelope or a blank token field name.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_root = std::env::var("USERDESK_API_ROOT").unwrap_or_else(|_| DEFAULT_API_ROOT.to_owned());
        let mut config = Self::new(&api_root);

        if let Ok(raw) = std::env::var("USERDESK_ENVELOPE") {
            config.shape.envelope = raw
                .parse::<Envelope>()
                .map_err(|message| ConfigError::Invalid { var: "USERDESK_ENVELOPE", message })?;
        }
        let token_field = std::env::var("USERDESK_TOKEN_FIELD").unwrap_or_else(|_| DEFAULT_TOKEN_FIELD.to_owned());
        config.set_token_field(&token_field)?;

        if let Ok(path) = std::env::var("USERDESK_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        config.timeouts = Timeouts {
            request_secs: env_parse_u64("USERDESK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("USERDESK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Ok(config)
    }

    /// Replace the login response's token field name, trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank; the config is left unchanged.
    pub fn set_token_field(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.shape.token_field = parse_token_field(raw)?;
        Ok(())
    }
}

pub(crate) fn parse_token_field(raw: &str) -> Result<String, ConfigError> {
    let field = raw.trim();
    if field.is_empty() {
        return Err(ConfigError::Invalid { var: "USERDESK_TOKEN_FIELD", message: "must not be blank".to_owned() });
    }
    Ok(field.to_owned())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
