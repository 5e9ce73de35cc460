use std::time::Duration;

use serde::Deserialize;

use crate::error::{PanError, Result};

/// Default API host
pub const DEFAULT_API_HOST: &str = "https://pan.baidu.com";

/// Default OAuth token endpoint
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://openapi.baidu.com/oauth/2.0/token";

/// Application credentials issued by the provider
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub app_key: String,
    pub secret_key: String,
    pub sign_key: String,
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &self.app_key)
            .field("secret_key", &"<redacted>")
            .field("sign_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Retry budget for a single API call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Delay before the second attempt; doubled for each later one
    pub initial_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay_ms: 2000,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            initial_delay_ms: 0,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

/// Tree walk tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Entries requested per listing page
    pub page_size: u32,
    /// Pause before listing each directory
    pub politeness_delay_ms: u64,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            politeness_delay_ms: 200,
        }
    }
}

impl WalkOptions {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub api_host: String,
    pub oauth_token_url: String,
    pub retry: RetryPolicy,
    pub walk: WalkOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            api_host: DEFAULT_API_HOST.to_string(),
            oauth_token_url: DEFAULT_OAUTH_TOKEN_URL.to_string(),
            retry: RetryPolicy::default(),
            walk: WalkOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Build a configuration from `PAN_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(v) = var("PAN_APP_KEY") {
            config.credentials.app_key = v;
        }
        if let Some(v) = var("PAN_SECRET_KEY") {
            config.credentials.secret_key = v;
        }
        if let Some(v) = var("PAN_SIGN_KEY") {
            config.credentials.sign_key = v;
        }
        if let Some(v) = var("PAN_ACCESS_TOKEN") {
            config.credentials.access_token = v;
        }
        if let Some(v) = var("PAN_API_HOST") {
            config.api_host = v;
        }
        config
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.credentials.access_token = token.into();
        self
    }

    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = host.into();
        self
    }

    pub fn with_oauth_token_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_token_url = url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_walk_options(mut self, walk: WalkOptions) -> Self {
        self.walk = walk;
        self
    }

    /// Check the values that would otherwise fail later at request time
    pub fn validate(&self) -> Result<()> {
        if self.retry.attempts == 0 {
            return Err(PanError::InvalidConfig {
                message: "retry attempts must be at least 1".to_string(),
            });
        }
        if self.walk.page_size == 0 {
            return Err(PanError::InvalidConfig {
                message: "walk page size must be at least 1".to_string(),
            });
        }
        let urls = [
            ("api_host", &self.api_host),
            ("oauth_token_url", &self.oauth_token_url),
        ];
        for (name, url) in urls {
            reqwest::Url::parse(url).map_err(|e| PanError::InvalidConfig {
                message: format!("{} `{}` is not a valid URL: {}", name, url, e),
            })?;
        }
        Ok(())
    }
}
