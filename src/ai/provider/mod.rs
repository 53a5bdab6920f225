//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait for free-text generation.
//! All providers return `LlmResponse` with token usage metrics.
//!
//! ## Modules
//!
//! - `openai`: OpenAI Chat Completions (and compatible gateways)
//! - `ollama`: Locally-running Ollama models

mod ollama;
mod openai;

#[cfg(test)]
pub(crate) mod mock;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::types::{DocError, Result};

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Complete LLM response including content and usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub content: String,
    /// Token usage metrics
    pub usage: TokenUsage,
    /// Response timing
    pub timing: ResponseTiming,
    /// Provider and model info
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with content only (usage unknown)
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    /// Model used
    pub model: String,
    /// Provider name
    pub provider: String,
}

/// Shared LLM provider type for concurrent access across pipeline stages.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// Note: API keys are handled securely - they are never serialized to output
/// and are redacted in debug output. Each provider converts the key to
/// SecretString internally for runtime protection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "openai", "ollama"
    pub provider: String,
    /// Model name (provider-specific)
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Temperature for LLM generation (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,
    /// API key (for OpenAI-compatible endpoints)
    /// Never serialized to output for security
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: 300,
            temperature: 0.2,
            api_key: None,
            api_base: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl ProviderConfig {
    pub fn from_llm_config(config: &LlmConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            model: Some(config.model.clone()).filter(|m| !m.is_empty()),
            timeout_secs: config.timeout_secs,
            temperature: config.temperature,
            api_key: None,
            api_base: config.api_base.clone(),
            max_tokens: config.max_tokens.unwrap_or_else(default_max_tokens),
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// LLM Provider trait for free-text generation with usage metrics
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a system instruction and a user prompt
    async fn generate(&self, system: &str, user: &str) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        _ => Err(DocError::Config(format!(
            "Unknown provider: {}. Supported: openai, ollama",
            config.provider
        ))),
    }
}

// =============================================================================
// Provider Factory
// =============================================================================

/// Builds a fresh provider for each unit of concurrent work
///
/// Concurrent tasks never share a client; sequential work creates one
/// provider and reuses it.
pub trait ProviderFactory: Send + Sync {
    fn create(&self) -> Result<SharedProvider>;
}

impl<F> ProviderFactory for F
where
    F: Fn() -> Result<SharedProvider> + Send + Sync,
{
    fn create(&self) -> Result<SharedProvider> {
        self()
    }
}

pub type SharedFactory = Arc<dyn ProviderFactory>;

/// Factory creating providers from a fixed [`ProviderConfig`]
#[derive(Debug, Clone)]
pub struct ConfigProviderFactory {
    config: ProviderConfig,
}

impl ConfigProviderFactory {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

impl ProviderFactory for ConfigProviderFactory {
    fn create(&self) -> Result<SharedProvider> {
        create_provider(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let config = ProviderConfig {
            provider: "claude-code".to_string(),
            ..Default::default()
        };
        assert!(matches!(create_provider(&config), Err(DocError::Config(_))));
    }

    #[test]
    fn test_provider_config_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_from_llm_config() {
        let llm = LlmConfig {
            provider: "ollama".to_string(),
            model: "llama3:latest".to_string(),
            max_tokens: Some(512),
            ..LlmConfig::default()
        };
        let config = ProviderConfig::from_llm_config(&llm);
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model.as_deref(), Some("llama3:latest"));
        assert_eq!(config.max_tokens, 512);
    }

    #[test]
    fn test_closure_factory() {
        let factory = || -> Result<SharedProvider> {
            let provider: SharedProvider = Arc::new(mock::ScriptedProvider::constant("hello"));
            Ok(provider)
        };
        let provider = factory.create().unwrap();
        assert_eq!(provider.name(), "scripted");
    }

    #[test]
    fn test_config_factory_builds_ollama() {
        let factory = ConfigProviderFactory::new(ProviderConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        });
        let first = factory.create().unwrap();
        let second = factory.create().unwrap();
        assert_eq!(first.name(), "ollama");
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
