//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/docweave/) and project (.docweave/) level configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{network as net_constants, retry as retry_constants, update as update_constants};
use crate::types::{DocError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Retry policy for generation calls
    pub retry: RetryConfig,

    /// Incremental update settings
    pub update: UpdateConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            update: UpdateConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DocError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        // LLM temperature validation
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(DocError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        // Timeout validation
        if self.llm.timeout_secs == 0 {
            return Err(DocError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.backoff_factor < 1.0 {
            return Err(DocError::Config(format!(
                "Retry backoff_factor must be at least 1.0, got {}",
                self.retry.backoff_factor
            )));
        }

        // Worker pools
        if self.update.file_summary_concurrency == 0 {
            return Err(DocError::Config(
                "Update file_summary_concurrency must be greater than 0".to_string(),
            ));
        }
        if self.update.section_concurrency == 0 {
            return Err(DocError::Config(
                "Update section_concurrency must be greater than 0".to_string(),
            ));
        }

        // Character budgets
        for (name, value) in [
            ("max_section_chars", self.update.max_section_chars),
            ("max_file_diff_chars", self.update.max_file_diff_chars),
            ("max_analysis_diff_chars", self.update.max_analysis_diff_chars),
        ] {
            if value == 0 {
                return Err(DocError::Config(format!(
                    "Update {} must be greater than 0",
                    name
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (openai, ollama)
    pub provider: String,

    /// Model name
    pub model: String,

    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for LLM generation (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Custom API endpoint (OpenAI-compatible gateway or Ollama host)
    pub api_base: Option<String>,

    /// Maximum tokens to generate per call
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
            temperature: 0.2,
            api_base: None,
            max_tokens: None,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: usize,

    /// Delay before the first retry (milliseconds)
    pub base_delay_ms: u64,

    /// Upper bound for any single delay (seconds)
    pub max_delay_secs: u64,

    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f32,

    /// Randomize delays to avoid synchronized retries
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: retry_constants::DEFAULT_MAX_RETRIES,
            base_delay_ms: retry_constants::BASE_DELAY_MS,
            max_delay_secs: retry_constants::MAX_DELAY_SECS,
            backoff_factor: retry_constants::BACKOFF_FACTOR,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }
}

// =============================================================================
// Update Configuration
// =============================================================================

/// How generated text for a non-changelog section is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionMode {
    /// Generated text replaces the section body
    #[default]
    Regenerate,
    /// Generated text carries ADD/UPDATE/DELETE edit markers
    Patch,
}

impl std::fmt::Display for SectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionMode::Regenerate => write!(f, "regenerate"),
            SectionMode::Patch => write!(f, "patch"),
        }
    }
}

impl std::str::FromStr for SectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regenerate" => Ok(SectionMode::Regenerate),
            "patch" => Ok(SectionMode::Patch),
            _ => Err(format!(
                "Unknown section mode: {}. Valid values: regenerate, patch",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Worker pool size for per-file summaries
    pub file_summary_concurrency: usize,

    /// Worker pool size for section regeneration
    pub section_concurrency: usize,

    /// Characters of an existing section sent for regeneration
    pub max_section_chars: usize,

    /// Characters of a single file diff sent for summarization
    pub max_file_diff_chars: usize,

    /// Characters of the full diff sent for change analysis
    pub max_analysis_diff_chars: usize,

    /// Deterministic generation without calling the provider
    pub templated: bool,

    /// How generated text is applied to non-changelog sections
    pub section_mode: SectionMode,

    /// Abort the cycle when any section fails instead of keeping its old body
    pub fail_on_section_error: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            file_summary_concurrency: update_constants::FILE_SUMMARY_CONCURRENCY,
            section_concurrency: update_constants::SECTION_CONCURRENCY,
            max_section_chars: update_constants::MAX_SECTION_CHARS,
            max_file_diff_chars: update_constants::MAX_FILE_DIFF_CHARS,
            max_analysis_diff_chars: update_constants::MAX_ANALYSIS_DIFF_CHARS,
            templated: false,
            section_mode: SectionMode::Regenerate,
            fail_on_section_error: false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.update.file_summary_concurrency, 4);
        assert_eq!(config.update.section_concurrency, 5);
        assert_eq!(config.update.max_section_chars, 6000);
        assert_eq!(config.update.section_mode, SectionMode::Regenerate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_pools() {
        let mut config = Config::default();
        config.update.section_concurrency = 0;
        assert!(matches!(config.validate(), Err(DocError::Config(_))));

        let mut config = Config::default();
        config.update.file_summary_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut config = Config::default();
        config.llm.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.backoff_factor = 0.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.update.max_file_diff_chars = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_file_diff_chars"));
    }

    #[test]
    fn test_section_mode() {
        assert_eq!(SectionMode::Patch.to_string(), "patch");
        assert_eq!("Regenerate".parse::<SectionMode>().unwrap(), SectionMode::Regenerate);
        assert!("merge".parse::<SectionMode>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [update]
            section_concurrency = 2
            section_mode = "patch"
            "#,
        )
        .unwrap();
        assert_eq!(config.update.section_concurrency, 2);
        assert_eq!(config.update.section_mode, SectionMode::Patch);
        assert_eq!(config.update.max_section_chars, 6000);
        assert_eq!(config.llm.timeout_secs, 300);
    }
}
