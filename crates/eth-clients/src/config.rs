//! Client configuration.
//!
//! Both clients take a base URL, a per-request timeout and a retry policy.
//! Values come from explicit construction or from environment variables.

use std::time::Duration;

use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_COUNT: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 200;

/// Exponential backoff: `base_delay`, then double for each further retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_COUNT,
            Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        )
    }
}

/// Ethereum node JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl RpcConfig {
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url("rpc url", url)?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ETHEREUM_NODE_URL` (required)
    /// - `ETHEREUM_RPC_TIMEOUT_SECS` (default: 10)
    /// - `ETHEREUM_RPC_RETRY_COUNT` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = required(&lookup, "ETHEREUM_NODE_URL")?;
        Ok(Self {
            url: parse_url("ETHEREUM_NODE_URL", &url)?,
            timeout_secs: number(&lookup, "ETHEREUM_RPC_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            retry: RetryPolicy {
                max_retries: number(&lookup, "ETHEREUM_RPC_RETRY_COUNT", DEFAULT_RETRY_COUNT)?,
                ..RetryPolicy::default()
            },
        })
    }
}

/// Safe transaction service endpoint.
///
/// Custom `Debug` implementation redacts the `api_key` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct ServiceConfig {
    pub base_url: Url,
    /// Sent as `Authorization: Bearer <key>` when set.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ServiceConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("service url", base_url)?,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SAFE_TRANSACTION_SERVICE_URL` (required)
    /// - `SAFE_TRANSACTION_SERVICE_API_KEY` (optional)
    /// - `SAFE_TRANSACTION_SERVICE_REQUEST_TIMEOUT` (default: 10)
    /// - `SAFE_TRANSACTION_SERVICE_RETRY_COUNT` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = required(&lookup, "SAFE_TRANSACTION_SERVICE_URL")?;
        Ok(Self {
            base_url: parse_url("SAFE_TRANSACTION_SERVICE_URL", &url)?,
            api_key: lookup("SAFE_TRANSACTION_SERVICE_API_KEY").filter(|key| !key.is_empty()),
            timeout_secs: number(
                &lookup,
                "SAFE_TRANSACTION_SERVICE_REQUEST_TIMEOUT",
                DEFAULT_TIMEOUT_SECS,
            )?,
            retry: RetryPolicy {
                max_retries: number(
                    &lookup,
                    "SAFE_TRANSACTION_SERVICE_RETRY_COUNT",
                    DEFAULT_RETRY_COUNT,
                )?,
                ..RetryPolicy::default()
            },
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Result<String, ConfigError> {
    lookup(var).ok_or_else(|| ConfigError::MissingVar(var.to_string()))
}

fn number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value: raw,
        }),
    }
}

fn parse_url(what: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(what.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: String, value: String },
}
