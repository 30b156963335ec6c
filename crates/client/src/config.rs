//! Client configuration loaded from environment variables.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ustaz_core::{routes, Locale};
use ustaz_realtime::{ChannelConfig, ReconnectConfig};

use crate::auth::{EnvTokenStore, FileTokenStore, TokenStore};

const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1000;
const DEFAULT_RECONNECT_MAX_MS: u64 = 5000;
const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Environment variable holding the token when no token file is set.
pub const TOKEN_ENV_VAR: &str = "USTAZ_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the notification client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the notification channel.
    pub ws_url: String,
    /// Base URL of the REST API.
    pub api_url: String,
    /// File holding the bearer token; falls back to `USTAZ_TOKEN` when unset.
    pub token_file: Option<PathBuf>,
    pub locale: Locale,
    pub reconnect: ReconnectConfig,
    pub page_limit: u32,
    pub muted_prefixes: Vec<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `USTAZ_WS_URL`               | required |
    /// | `USTAZ_API_URL`              | required |
    /// | `USTAZ_TOKEN_FILE`           | unset (read `USTAZ_TOKEN`) |
    /// | `USTAZ_LOCALE`               | `ar`    |
    /// | `USTAZ_RECONNECT_INITIAL_MS` | `1000`  |
    /// | `USTAZ_RECONNECT_MAX_MS`     | `5000`  |
    /// | `USTAZ_PAGE_LIMIT`           | `20`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let ws_url = get("USTAZ_WS_URL").ok_or(ConfigError::Missing("USTAZ_WS_URL"))?;
        let api_url = get("USTAZ_API_URL").ok_or(ConfigError::Missing("USTAZ_API_URL"))?;
        let token_file = get("USTAZ_TOKEN_FILE").map(PathBuf::from);

        let locale = match get("USTAZ_LOCALE") {
            Some(raw) => raw.parse::<Locale>().map_err(|e| ConfigError::Invalid {
                var: "USTAZ_LOCALE",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => Locale::default(),
        };

        let initial_ms = parse_or(&get, "USTAZ_RECONNECT_INITIAL_MS", DEFAULT_RECONNECT_INITIAL_MS)?;
        let max_ms = parse_or(&get, "USTAZ_RECONNECT_MAX_MS", DEFAULT_RECONNECT_MAX_MS)?;
        if max_ms < initial_ms {
            return Err(ConfigError::Invalid {
                var: "USTAZ_RECONNECT_MAX_MS",
                value: max_ms.to_string(),
                reason: format!("must be at least USTAZ_RECONNECT_INITIAL_MS ({initial_ms})"),
            });
        }

        let page_limit = parse_or(&get, "USTAZ_PAGE_LIMIT", DEFAULT_PAGE_LIMIT)?;
        if page_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "USTAZ_PAGE_LIMIT",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            ws_url,
            api_url,
            token_file,
            locale,
            reconnect: ReconnectConfig {
                initial_delay: Duration::from_millis(initial_ms),
                max_delay: Duration::from_millis(max_ms),
                ..ReconnectConfig::default()
            },
            page_limit,
            muted_prefixes: routes::default_muted_prefixes(),
        })
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            ws_url: self.ws_url.clone(),
            reconnect: self.reconnect.clone(),
        }
    }

    /// The token source this configuration points at.
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        match &self.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path.clone())),
            None => Arc::new(EnvTokenStore::new(TOKEN_ENV_VAR)),
        }
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
