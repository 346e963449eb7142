//! # Application Configuration
//!
//! Relay configuration loaded from environment variables (after `dotenvy` has
//! read any `.env` file). All values are validated on startup to fail fast if
//! misconfigured.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `BIND_ADDRESS` | `0.0.0.0:8787` | listen address |
//! | `SERVICE_NAME` | `ChatHub Workers` | `service` field of `GET /health` |
//! | `HISTORY_CAPACITY` | `50` | chat lines kept per live room |
//! | `IDLE_TIMEOUT_SECS` | `0` | close sessions silent for longer (0 = never) |
//! | `HEARTBEAT_INTERVAL_SECS` | `0` | server ping interval (0 = no pings) |

use std::time::Duration;

use lib_utils::envs::{self, get_env_or, get_env_parse_or};

use crate::error::{AppError, Result};

/// Upper bound for `HISTORY_CAPACITY`.
pub const MAX_HISTORY_CAPACITY: usize = 1000;

/// Relay configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Socket address the HTTP server binds to
    pub bind_address: String,

    /// Name reported by `GET /health`
    pub service_name: String,

    /// Number of chat lines retained per live room for `GET /api/messages`
    pub history_capacity: usize,

    /// Close a session that has sent no frame for this long
    ///
    /// `None` keeps connections open until the client goes away.
    pub idle_timeout: Option<Duration>,

    /// Interval between server-initiated pings
    pub heartbeat_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_string(),
            service_name: "ChatHub Workers".to_string(),
            history_capacity: 50,
            idle_timeout: None,
            heartbeat_interval: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_address = get_env_or("BIND_ADDRESS", &defaults.bind_address);
        let service_name = get_env_or("SERVICE_NAME", &defaults.service_name);

        let history_capacity = get_env_parse_or("HISTORY_CAPACITY", defaults.history_capacity)
            .map_err(config_err)?;
        let idle_timeout_secs: u64 = get_env_parse_or("IDLE_TIMEOUT_SECS", 0).map_err(config_err)?;
        let heartbeat_secs: u64 =
            get_env_parse_or("HEARTBEAT_INTERVAL_SECS", 0).map_err(config_err)?;

        Ok(Self {
            bind_address,
            service_name,
            history_capacity,
            idle_timeout: secs_to_duration(idle_timeout_secs),
            heartbeat_interval: secs_to_duration(heartbeat_secs),
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.trim().is_empty() {
            return Err(AppError::Config("BIND_ADDRESS cannot be empty".to_string()));
        }

        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(AppError::Config(format!(
                "HISTORY_CAPACITY must be between 1 and {}",
                MAX_HISTORY_CAPACITY
            )));
        }

        if let (Some(heartbeat), Some(idle)) = (self.heartbeat_interval, self.idle_timeout) {
            if heartbeat >= idle {
                return Err(AppError::Config(
                    "HEARTBEAT_INTERVAL_SECS must be shorter than IDLE_TIMEOUT_SECS".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn secs_to_duration(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn config_err(err: envs::Error) -> AppError {
    match err {
        envs::Error::WrongFormat(name) => {
            AppError::Config(format!("{} must be a non-negative integer", name))
        }
        envs::Error::MissingEnv(name) => AppError::Config(format!("{} must be set", name)),
    }
}
