//! Environment-driven client configuration.

use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;

/// Connection settings for a remote list service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Reads `TWINLIST_<PREFIX>_API_KEY`, `TWINLIST_<PREFIX>_BASE_URL` and
    /// `TWINLIST_<PREFIX>_TIMEOUT_MS`, falling back to the supplied defaults
    /// for everything except the key.
    pub fn from_env(
        prefix: &str,
        default_base: &str,
        default_timeout_ms: u64,
    ) -> Result<Self, ClientError> {
        let key_var = format!("TWINLIST_{}_API_KEY", prefix);
        let api_key = std::env::var(&key_var)
            .map_err(|_| ClientError::Config(format!("{key_var} must be set")))?;

        let base_var = format!("TWINLIST_{}_BASE_URL", prefix);
        let base_url = std::env::var(&base_var)
            .ok()
            .unwrap_or_else(|| default_base.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|_| ClientError::Config(format!("invalid {base_var} url: {base_url}")))?;

        let timeout_var = format!("TWINLIST_{}_TIMEOUT_MS", prefix);
        let timeout_ms = std::env::var(&timeout_var)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(default_timeout_ms);

        Ok(Self {
            api_key,
            base_url,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Builds a config directly, mostly useful in tests.
    pub fn new(api_key: impl Into<String>, base_url: Url, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            timeout,
        }
    }
}
