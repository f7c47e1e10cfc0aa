//! Process configuration parsed from environment variables.
//!
//! `.env` is loaded by `main` through `dotenvy` before this runs, so local
//! development and deployments share one code path.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_VIEW_PREFERENCES_PATH: &str = "data/view-preferences.json";
pub const DEFAULT_AI_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_AI_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiEndpointConfig {
    pub url: String,
    pub token: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub view_preferences_path: PathBuf,
    /// `None` disables AI assistance.
    pub ai: Option<AiEndpointConfig>,
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `VIEW_PREFERENCES_PATH`: default `data/view-preferences.json`
    /// - `AI_ENDPOINT_URL`: enables AI assistance when set
    /// - `AI_ENDPOINT_TOKEN`: bearer token for the AI endpoint
    /// - `AI_REQUEST_TIMEOUT_SECS`: default 60
    /// - `AI_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or `PORT` is not a port.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let parse_or = |key: &str, default: u64| lookup(key).and_then(|v| v.parse::<u64>().ok()).unwrap_or(default);

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };
        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

        let ai = lookup("AI_ENDPOINT_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| AiEndpointConfig {
                url: url.trim().to_owned(),
                token: lookup("AI_ENDPOINT_TOKEN").filter(|t| !t.is_empty()),
                request_timeout_secs: parse_or("AI_REQUEST_TIMEOUT_SECS", DEFAULT_AI_REQUEST_TIMEOUT_SECS),
                connect_timeout_secs: parse_or("AI_CONNECT_TIMEOUT_SECS", DEFAULT_AI_CONNECT_TIMEOUT_SECS),
            });

        Ok(Self {
            database_url,
            port,
            db_max_connections,
            view_preferences_path: lookup("VIEW_PREFERENCES_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_VIEW_PREFERENCES_PATH), PathBuf::from),
            ai,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
