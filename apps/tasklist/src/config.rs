//! Configuration management for the task list.
//!
//! Loads configuration from environment variables with defaults. The API
//! base URL depends on the build mode: debug builds talk to a local
//! development server, release builds use same-origin paths.

use crate::error::ConfigError;
use crate::types::TaskId;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Base URL variable
pub const API_URL_VAR: &str = "TASKLIST_API_URL";
/// Per-request timeout variable, in seconds
pub const REQUEST_TIMEOUT_VAR: &str = "TASKLIST_REQUEST_TIMEOUT_SECS";
/// Graceful shutdown timeout variable, in seconds
pub const SHUTDOWN_TIMEOUT_VAR: &str = "TASKLIST_SHUTDOWN_TIMEOUT_SECS";

/// Base URL of debug builds
pub const DEVELOPMENT_API_URL: &str = "http://localhost:3000";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the `/todos` collection lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Prefix of every request URL; empty for same-origin paths
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// How long shutdown waits for in-flight calls
    pub shutdown_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(default_base_url())
    }
}

impl ApiConfig {
    /// Configuration for `base_url` with default timeouts
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a timeout is not a whole
    /// number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a timeout is not a whole
    /// number of seconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(lookup(API_URL_VAR).unwrap_or_else(default_base_url));

        if let Some(secs) = parse_var::<u64>(&lookup, REQUEST_TIMEOUT_VAR)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, SHUTDOWN_TIMEOUT_VAR)? {
            config.shutdown_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Replace the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base}/todos`
    #[must_use]
    pub fn todos_url(&self) -> String {
        format!("{}/todos", self.base_url.trim_end_matches('/'))
    }

    /// `{base}/todos/{id}`, with the id percent-encoded as one path segment
    #[must_use]
    pub fn todo_url(&self, id: &TaskId) -> String {
        format!("{}/{}", self.todos_url(), urlencoding::encode(id.as_str()))
    }
}

/// Base URL for the current build mode
#[must_use]
pub fn default_base_url() -> String {
    if cfg!(debug_assertions) {
        DEVELOPMENT_API_URL.to_string()
    } else {
        String::new()
    }
}

fn parse_var<T>(lookup: impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}
