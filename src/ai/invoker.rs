//! Resilient Generation Calls
//!
//! Wraps a single provider call with a per-attempt timeout and exponential
//! backoff retries. Errors are classified so that auth failures, malformed
//! requests and oversize prompts fail immediately. A rate-limit wait hint
//! from the provider raises the backoff delay for that retry.

use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::{debug, warn};

use super::provider::LlmProvider;
use super::timeout::{TimeoutConfig, with_timeout};
use crate::config::{Config, RetryConfig};
use crate::types::{DocError, Result};

/// Exponential backoff parameters for one generation call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub factor: f32,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            factor: config.backoff_factor,
            jitter: config.jitter,
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries);

        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// Retrying, timeout-bounded invocation of a provider
#[derive(Debug, Clone)]
pub struct ResilientInvoker {
    policy: RetryPolicy,
    timeout: Duration,
}

impl Default for ResilientInvoker {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), TimeoutConfig::default().llm_request)
    }
}

impl ResilientInvoker {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Self {
        Self { policy, timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RetryPolicy::from_config(&config.retry),
            TimeoutConfig::from_llm_config(&config.llm).llm_request,
        )
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate text, retrying retryable failures.
    ///
    /// `operation` names the call in logs and timeout errors. On exhaustion
    /// the last error is returned.
    pub async fn invoke(
        &self,
        provider: &dyn LlmProvider,
        system: &str,
        user: &str,
        operation: &str,
    ) -> Result<String> {
        let timeout = self.timeout;
        let attempt = move || async move {
            with_timeout(timeout, provider.generate(system, user), operation).await
        };

        let response = attempt
            .retry(self.policy.backoff())
            .when(|e: &DocError| e.is_retryable())
            .adjust(|e: &DocError, delay: Option<Duration>| {
                // Never retry sooner than the provider asked for
                delay.map(|d| e.retry_after().map_or(d, |hint| d.max(hint)))
            })
            .notify(|e: &DocError, delay: Duration| {
                warn!(
                    "{} via {} failed, retrying in {:?}: {}",
                    operation,
                    provider.name(),
                    delay,
                    e
                );
            })
            .await?;

        debug!(
            "{} completed via {} ({} output tokens)",
            operation,
            provider.name(),
            response.usage.output_tokens
        );
        Ok(response.content)
    }
}
