//! Configuration loading and representation.
//!
//! Everything is read from environment variables once at startup. The commands
//! index name and the creation endpoint are configuration-time constants: no
//! request can override them.

use std::time::Duration;

use thiserror::Error;

use crate::commands_index::{COMMANDS_INDEX, COMMAND_MANAGER_PLUGIN_URL, CommandsIndexPaths};

pub const ENV_URL: &str = "CMDINDEX_INDEXER_URL";
pub const ENV_USER: &str = "CMDINDEX_INDEXER_USER";
pub const ENV_PASSWORD: &str = "CMDINDEX_INDEXER_PASSWORD";
pub const ENV_TIMEOUT_SECS: &str = "CMDINDEX_INDEXER_TIMEOUT_SECS";
pub const ENV_COMMANDS_INDEX: &str = "CMDINDEX_COMMANDS_INDEX";
pub const ENV_COMMANDS_ENDPOINT: &str = "CMDINDEX_COMMANDS_ENDPOINT";

const DEFAULT_URL: &str = "http://localhost:9200";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for the indexer plus the command resource paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    pub url: String,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
    pub paths: CommandsIndexPaths,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("CMDINDEX_INDEXER_USER and CMDINDEX_INDEXER_PASSWORD must be set together")]
    IncompleteCredentials,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            paths: CommandsIndexPaths::default(),
        }
    }
}

impl IndexerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = match get(ENV_URL) {
            Some(url) => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        key: ENV_URL,
                        value: url,
                        reason: "expected an http:// or https:// URL".to_string(),
                    });
                }
                url
            }
            None => {
                tracing::warn!("{ENV_URL} not set; using {DEFAULT_URL}");
                DEFAULT_URL.to_string()
            }
        };

        let credentials = match (get(ENV_USER), get(ENV_PASSWORD)) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteCredentials),
        };
        if credentials.is_none() && url.starts_with("https://") {
            tracing::warn!("no indexer credentials configured for {url}");
        }

        let timeout = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::Invalid {
                        key: ENV_TIMEOUT_SECS,
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: ENV_TIMEOUT_SECS,
                        value: raw,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let paths = CommandsIndexPaths {
            index: get(ENV_COMMANDS_INDEX).unwrap_or_else(|| COMMANDS_INDEX.to_string()),
            create_endpoint: get(ENV_COMMANDS_ENDPOINT)
                .unwrap_or_else(|| COMMAND_MANAGER_PLUGIN_URL.to_string()),
        };

        Ok(Self {
            url,
            credentials,
            timeout,
            paths,
        })
    }
}
