//! System-wide limits for the client layer.
//!
//! Values come from the environment with fallbacks, the same way the mock
//! server picks its port.

use std::env;

use crate::error::ClientError;

pub const DEFAULT_MAX_TIMEOUT: u64 = 60;
pub const DEFAULT_LOG_MAX_AGE_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Upper bound, in seconds, for any client's configured timeout.
    pub max_timeout: u64,
    /// Log entries older than this many days are purged by the cleanup task.
    pub log_max_age_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_timeout: DEFAULT_MAX_TIMEOUT,
            log_max_age_days: DEFAULT_LOG_MAX_AGE_DAYS,
        }
    }
}

impl Settings {
    /// Read `API_CLIENT_MAX_TIMEOUT` and `API_CLIENT_LOG_MAX_AGE_DAYS`.
    pub fn from_env() -> Result<Self, ClientError> {
        Ok(Self {
            max_timeout: parse_var("API_CLIENT_MAX_TIMEOUT", DEFAULT_MAX_TIMEOUT)?,
            log_max_age_days: parse_var("API_CLIENT_LOG_MAX_AGE_DAYS", DEFAULT_LOG_MAX_AGE_DAYS)?,
        })
    }

    pub fn with_max_timeout(mut self, max_timeout: u64) -> Self {
        self.max_timeout = max_timeout;
        self
    }

    pub fn with_log_max_age_days(mut self, days: i64) -> Self {
        self.log_max_age_days = days;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ClientError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClientError::Configuration(format!("{name} must be a number, got `{raw}`"))),
        Err(_) => Ok(default),
    }
}
