//! Configuration for the sync client.

use crate::error::{ClientError, ClientResult};
use std::env;
use std::time::Duration;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ONTOSYNC_API_KEY";
/// Environment variable holding the basic-auth user for staging hosts.
pub const BASIC_USER_VAR: &str = "ONTOSYNC_BASIC_USER";
/// Environment variable holding the basic-auth password for staging hosts.
pub const BASIC_PASSWORD_VAR: &str = "ONTOSYNC_BASIC_PASSWORD";

/// Configuration for a sync client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the store API (e.g., "https://ontology.example.org/api/1").
    pub base_url: String,
    /// Per-account API key, sent as a request parameter on every call.
    pub api_key: String,
    /// Basic-auth credentials, required by staging hosts.
    pub basic_auth: Option<(String, String)>,
    /// Request timeout.
    pub timeout: Duration,
    /// Fan-out width for [`crate::SyncClient::batch`]; clamped to a
    /// minimum of 2.
    pub batch_width: usize,
}

impl ClientConfig {
    /// Creates a configuration for the given host and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            basic_auth: None,
            timeout: Duration::from_secs(30),
            batch_width: 4,
        }
    }

    /// Creates a configuration from the environment.
    ///
    /// Reads the API key from `ONTOSYNC_API_KEY` and optional basic-auth
    /// credentials from `ONTOSYNC_BASIC_USER` / `ONTOSYNC_BASIC_PASSWORD`.
    pub fn from_env(base_url: impl Into<String>) -> ClientResult<Self> {
        let api_key = env::var(API_KEY_VAR).map_err(|_| ClientError::MissingApiKey)?;
        let mut config = Self::new(base_url, api_key);
        if let (Ok(user), Ok(password)) = (env::var(BASIC_USER_VAR), env::var(BASIC_PASSWORD_VAR)) {
            config.basic_auth = Some((user, password));
        }
        Ok(config)
    }

    /// Sets basic-auth credentials.
    #[must_use]
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the fan-out width for batch helpers.
    #[must_use]
    pub fn with_batch_width(mut self, width: usize) -> Self {
        self.batch_width = width;
        self
    }

    /// Returns the host part of the base URL.
    #[must_use]
    pub fn host(&self) -> &str {
        let rest = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        rest.split(['/', ':']).next().unwrap_or(rest)
    }

    /// Returns true if this host sits behind basic auth.
    ///
    /// Staging deployments (hosts whose first label starts with `test` or
    /// `beta`) are fenced off with basic auth on top of the API key.
    #[must_use]
    pub fn requires_basic_auth(&self) -> bool {
        let first_label = self.host().split('.').next().unwrap_or("");
        first_label.starts_with("test") || first_label.starts_with("beta")
    }

    /// Checks that the configuration can reach its host at all.
    ///
    /// Runs before any network call: a staging host without credentials
    /// would only ever answer with an HTML login page.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey);
        }
        if self.requires_basic_auth() && self.basic_auth.is_none() {
            return Err(ClientError::IncorrectAuth {
                host: self.host().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = ClientConfig::new("https://ontology.example.org/api/1", "secret")
            .with_timeout(Duration::from_secs(60))
            .with_batch_width(8);

        assert_eq!(config.host(), "ontology.example.org");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.batch_width, 8);
        config.validate().unwrap();
    }

    #[test]
    fn staging_host_requires_credentials() {
        let config = ClientConfig::new("https://test3.example.org/api/1", "secret");
        assert!(config.requires_basic_auth());
        assert!(matches!(
            config.validate(),
            Err(ClientError::IncorrectAuth { .. })
        ));

        let config = config.with_basic_auth("curator", "hunter2");
        config.validate().unwrap();
    }

    #[test]
    fn production_host_needs_no_credentials() {
        let config = ClientConfig::new("https://ontology.example.org/api/1", "secret");
        assert!(!config.requires_basic_auth());
        config.validate().unwrap();
    }

    #[test]
    fn blank_key_rejected() {
        let config = ClientConfig::new("https://ontology.example.org/api/1", "  ");
        assert!(matches!(config.validate(), Err(ClientError::MissingApiKey)));
    }
}
