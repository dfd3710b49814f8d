//! Client configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Default gateway target when no base URL is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Gateway client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API Gateway.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Identity provider login entry point.
    pub login_url: String,
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_api_url(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn for_api_url(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            login_url: login_url_for(&api_url),
            api_url,
            timeout: Duration::from_secs(10),
            cache: CacheConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `BABBLY_API_URL` selects the gateway; `NEXT_PUBLIC_API_URL` is
    /// accepted for deployments that already export it.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with variables read through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = var("BABBLY_API_URL")
            .or_else(|| var("NEXT_PUBLIC_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mut config = Self::for_api_url(api_url);

        if let Some(secs) = var("BABBLY_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(login_url) = var("BABBLY_LOGIN_URL") {
            config.login_url = login_url;
        }
        config.cache = CacheConfig::from_vars(&var);

        config
    }

    /// Point at another gateway. A login URL derived from the old gateway
    /// follows it; one configured explicitly is kept.
    pub fn set_api_url(&mut self, api_url: &str) {
        let derived = self.login_url == login_url_for(&self.api_url);
        self.api_url = api_url.trim_end_matches('/').to_string();
        if derived {
            self.login_url = login_url_for(&self.api_url);
        }
    }
}

fn login_url_for(api_url: &str) -> String {
    format!("{api_url}/api/auth/login")
}

/// Revalidation behaviour of the keyed list cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Results younger than this are served without a network call.
    pub dedup_interval: Duration,
    /// Retries for retryable errors before a fetch gives up.
    pub error_retry_count: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub error_retry_interval: Duration,
    /// Minimum spacing of focus-triggered revalidations per key.
    pub focus_throttle: Duration,
    /// Polling interval for views that opt into background refresh.
    pub refresh_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dedup_interval: Duration::from_secs(2),
            error_retry_count: 3,
            error_retry_interval: Duration::from_secs(1),
            focus_throttle: Duration::from_secs(3),
            refresh_interval: Some(Duration::from_secs(5)),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            var(key)
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        let defaults = Self::default();

        Self {
            dedup_interval: millis("BABBLY_DEDUP_MS").unwrap_or(defaults.dedup_interval),
            error_retry_count: var("BABBLY_ERROR_RETRY_COUNT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.error_retry_count),
            error_retry_interval: millis("BABBLY_ERROR_RETRY_MS")
                .unwrap_or(defaults.error_retry_interval),
            focus_throttle: millis("BABBLY_FOCUS_THROTTLE_MS").unwrap_or(defaults.focus_throttle),
            // 0 disables polling
            refresh_interval: match millis("BABBLY_REFRESH_MS") {
                Some(d) if d.is_zero() => None,
                Some(d) => Some(d),
                None => defaults.refresh_interval,
            },
        }
    }
}
