//! Timeout Configuration
//!
//! Timeout defaults for provider calls and a helper for wrapping async
//! operations with a consistent timeout error.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::{TimeoutConfig, with_timeout};
//!
//! let config = TimeoutConfig::default();
//! let result = with_timeout(
//!     config.llm_request,
//!     async { /* LLM call */ },
//!     "LLM request"
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::constants::network as net_constants;
use crate::types::{DocError, Result};

/// Timeouts applied around provider calls
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for a single LLM request attempt (default: 5 minutes)
    pub llm_request: Duration,
    /// Timeout for establishing network connections (default: 30 seconds)
    pub connection: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_request: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            connection: Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    pub fn from_llm_config(config: &LlmConfig) -> Self {
        Self {
            llm_request: config.timeout(),
            ..Self::default()
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within the specified duration.
///
/// # Example
///
/// ```ignore
/// let result = with_timeout(
///     Duration::from_secs(30),
///     async { expensive_operation().await },
///     "expensive operation"
/// ).await?;
/// ```
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(DocError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_defaults() {
        let config = TimeoutConfig::default();
        assert_eq!(config.llm_request.as_secs(), 300);
        assert_eq!(config.connection.as_secs(), 30);
    }

    #[test]
    fn test_timeout_from_llm_config() {
        let llm = LlmConfig {
            timeout_secs: 12,
            ..LlmConfig::default()
        };
        let config = TimeoutConfig::from_llm_config(&llm);
        assert_eq!(config.llm_request, Duration::from_secs(12));
        assert_eq!(config.connection.as_secs(), 30);
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, DocError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, DocError>(42)
            },
            "slow operation",
        )
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, DocError::Timeout { .. }));
        assert!(err.is_retryable());
    }
}
