//! Session core configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (`SESSION__REFRESH_INTERVAL_SECONDS=300`
//! style keys become nested fields with a `__` separator).

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the session provider and its HTTP collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the backend API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Interval between background session refreshes, in seconds.
    /// Bounds how long a server-side revocation can go unnoticed.
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,

    /// Upper bound of the uniform random jitter added to each refresh
    /// interval, in seconds. Zero disables jitter.
    #[serde(default = "default_refresh_jitter_seconds")]
    pub refresh_jitter_seconds: u64,

    /// Timeout for a single profile fetch, in seconds.
    #[serde(default = "default_resolve_timeout_seconds")]
    pub resolve_timeout_seconds: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8083".to_string()
}

fn default_refresh_interval_seconds() -> u64 {
    600
}

fn default_refresh_jitter_seconds() -> u64 {
    30
}

fn default_resolve_timeout_seconds() -> u64 {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            refresh_interval_seconds: default_refresh_interval_seconds(),
            refresh_jitter_seconds: default_refresh_jitter_seconds(),
            resolve_timeout_seconds: default_resolve_timeout_seconds(),
        }
    }
}

impl SessionConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a present variable cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Interval between background refreshes.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Upper bound of the per-refresh jitter.
    #[must_use]
    pub fn refresh_jitter(&self) -> Duration {
        Duration::from_secs(self.refresh_jitter_seconds)
    }

    /// Timeout for a single profile fetch.
    #[must_use]
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_seconds)
    }

    /// URL of the identity endpoint.
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!(
            "{}/api/v1/secure/user/profile",
            self.api_base_url.trim_end_matches('/')
        )
    }

    /// URL of the login endpoint.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!(
            "{}/api/v1/expose/auth/login",
            self.api_base_url.trim_end_matches('/')
        )
    }

    /// URL of the signup endpoint.
    #[must_use]
    pub fn signup_url(&self) -> String {
        format!(
            "{}/api/v1/expose/auth/signup",
            self.api_base_url.trim_end_matches('/')
        )
    }
}
