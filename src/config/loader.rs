//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/docweave/config.toml)
//! 3. Project config (.docweave/config.toml)
//! 4. Environment variables (DOCWEAVE_* prefix, `__` separates nested keys)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{DocError, Result};

const ENV_PREFIX: &str = "DOCWEAVE_";
const PROJECT_DIR: &str = ".docweave";
const CONFIG_FILE: &str = "config.toml";

/// Location and presence of one configuration layer
#[derive(Debug, Clone)]
pub struct ConfigPath {
    pub label: &'static str,
    pub path: Option<PathBuf>,
}

impl ConfigPath {
    pub fn exists(&self) -> bool {
        self.path.as_ref().is_some_and(|p| p.exists())
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let global = Self::global_config_path();
        let project = Self::project_config_path();
        Self::load_layers(global.as_deref(), &project, ENV_PREFIX)
    }

    /// Load configuration from a specific file only (plus defaults)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(DocError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| DocError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn load_layers(global: Option<&Path>, project: &Path, env_prefix: &str) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Merge global config
        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        // Merge project config
        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // Merge environment variables (e.g., DOCWEAVE_UPDATE__SECTION_CONCURRENCY -> update.section_concurrency)
        figment = figment.merge(Env::prefixed(env_prefix).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| DocError::Config(format!("Configuration error: {}", e)))?;

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/docweave/ on Linux)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "docweave").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_DIR).join(CONFIG_FILE)
    }

    /// All configuration layers in resolution order
    pub fn paths() -> Vec<ConfigPath> {
        vec![
            ConfigPath {
                label: "Global",
                path: Self::global_config_path(),
            },
            ConfigPath {
                label: "Project",
                path: Some(Self::project_config_path()),
            },
        ]
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render the effective configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| DocError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            DocError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_default(&global_dir, force)
    }

    /// Initialize project configuration in the current directory
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::write_default(Path::new(PROJECT_DIR), force)
    }

    fn write_default(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default config content (TOML)
    fn default_config() -> String {
        r#"# docweave Configuration
# Project settings in .docweave/config.toml override global defaults.
# Environment variables use DOCWEAVE_<SECTION>__<KEY>, e.g. DOCWEAVE_LLM__MODEL.

version = "1.0"

[llm]
provider = "openai"
model = "gpt-4o-mini"
timeout_secs = 300
temperature = 0.2

[retry]
max_retries = 3
base_delay_ms = 500
max_delay_secs = 30
backoff_factor = 2.0
jitter = true

[update]
file_summary_concurrency = 4
section_concurrency = 5
max_section_chars = 6000
max_file_diff_chars = 4000
max_analysis_diff_chars = 12000
templated = false
section_mode = "regenerate"
fail_on_section_error = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("missing.toml");
        let config =
            ConfigLoader::load_layers(None, &project, "DOCWEAVE_TEST_DEFAULTS_").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.update.section_concurrency, 5);
    }

    #[test]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        let project = temp_dir.path().join("project.toml");
        fs::write(&global, "[llm]\nmodel = \"global-model\"\ntimeout_secs = 10\n").unwrap();
        fs::write(&project, "[llm]\nmodel = \"project-model\"\n").unwrap();

        let config =
            ConfigLoader::load_layers(Some(&global), &project, "DOCWEAVE_TEST_LAYERS_").unwrap();
        assert_eq!(config.llm.model, "project-model");
        assert_eq!(config.llm.timeout_secs, 10);
    }

    #[test]
    fn test_env_override_nested_key() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("project.toml");
        fs::write(&project, "[update]\nsection_concurrency = 2\n").unwrap();

        // SAFETY: the prefix is unique to this test
        unsafe {
            std::env::set_var("DOCWEAVE_TEST_ENV_UPDATE__SECTION_CONCURRENCY", "7");
            std::env::set_var("DOCWEAVE_TEST_ENV_UPDATE__MAX_SECTION_CHARS", "1200");
        }
        let config =
            ConfigLoader::load_layers(None, &project, "DOCWEAVE_TEST_ENV_").unwrap();
        unsafe {
            std::env::remove_var("DOCWEAVE_TEST_ENV_UPDATE__SECTION_CONCURRENCY");
            std::env::remove_var("DOCWEAVE_TEST_ENV_UPDATE__MAX_SECTION_CHARS");
        }

        assert_eq!(config.update.section_concurrency, 7);
        assert_eq!(config.update.max_section_chars, 1200);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("project.toml");
        fs::write(&project, "[update]\nsection_concurrency = 0\n").unwrap();

        let result = ConfigLoader::load_layers(None, &project, "DOCWEAVE_TEST_INVALID_");
        assert!(matches!(result, Err(DocError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[update]\ntemplated = true\n").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert!(config.update.templated);

        let missing = ConfigLoader::load_from_file(&temp_dir.path().join("nope.toml"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_default_config_file_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::write_default(temp_dir.path(), false).unwrap();
        assert!(path.exists());

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.retry.base_delay_ms, 500);
        assert_eq!(config.update.max_analysis_diff_chars, 12000);
    }

    #[test]
    fn test_write_default_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "version = \"custom\"\n").unwrap();

        ConfigLoader::write_default(temp_dir.path(), false).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("custom"));

        ConfigLoader::write_default(temp_dir.path(), true).unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("custom"));
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let toml_text = ConfigLoader::render(&config, false).unwrap();
        assert!(toml_text.contains("[update]"));

        let json_text = ConfigLoader::render(&config, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(value["update"]["section_mode"], "regenerate");
    }
}
