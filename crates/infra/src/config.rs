//! Configuration loading and representation.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use counterpos_observability::LogFormat;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;
pub const ACTIVITY_LOG_FILE: &str = "activity.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a socket address such as 0.0.0.0:8080 (got '{value}')")]
    InvalidBind { var: &'static str, value: String },

    #[error("{var} must be a non-negative integer (got '{value}')")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub activity_log: PathBuf,
    pub low_stock_threshold: u32,
    pub log_format: LogFormat,
}

impl Config {
    /// Read `COUNTERPOS_*` variables from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (unset and blank values fall back to defaults).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("COUNTERPOS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBind {
                var: "COUNTERPOS_BIND",
                value: bind_raw.clone(),
            })?;

        let data_dir = PathBuf::from(
            get("COUNTERPOS_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );

        let activity_log = get("COUNTERPOS_ACTIVITY_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(ACTIVITY_LOG_FILE));

        let low_stock_threshold = match get("COUNTERPOS_LOW_STOCK_THRESHOLD") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "COUNTERPOS_LOW_STOCK_THRESHOLD",
                    value: raw.clone(),
                })?,
            None => DEFAULT_LOW_STOCK_THRESHOLD,
        };

        let log_format = match get("COUNTERPOS_LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e: counterpos_observability::UnknownLogFormat| {
                ConfigError::Invalid {
                    var: "COUNTERPOS_LOG_FORMAT",
                    message: e.to_string(),
                }
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind,
            data_dir,
            activity_log,
            low_stock_threshold,
            log_format,
        })
    }

    /// Defaults rooted at `data_dir`; used by tests and embedders.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            activity_log: data_dir.join(ACTIVITY_LOG_FILE),
            data_dir,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            log_format: LogFormat::default(),
        }
    }
}
