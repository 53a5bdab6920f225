//! CLI Common Utilities
//!
//! Shared loading of configuration, change requests and output files for
//! command handlers.

use clap::ValueEnum;
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::types::{ChangeRequest, DocError, Result};

/// Output format shared by every command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Command execution context
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    /// Explicit config file, when one was given on the command line
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Load configuration from `config_path`, or the full layer chain when absent
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self {
            config,
            config_path,
        })
    }
}

/// Read a change request from JSON, or YAML for `.yaml`/`.yml` files
pub fn read_request(path: &Path) -> Result<ChangeRequest> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DocError::Config(format!("Cannot read request {}: {}", path.display(), e))
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// Write `content`, creating parent directories as needed
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_json_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(
            &path,
            r#"{"commitMessage":"feat","changedFiles":["a.py"],"existingDocument":{"title":"T","content":"C"}}"#,
        )
        .unwrap();

        let request = read_request(&path).unwrap();
        assert_eq!(request.changed_files, vec!["a.py"]);
        assert_eq!(request.existing_document.unwrap().title, "T");
    }

    #[test]
    fn test_read_yaml_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("request.YML");
        std::fs::write(
            &path,
            "commit_message: fix\nchanged_files:\n  - src/app.py\ndiff: |\n  +x\n",
        )
        .unwrap();

        let request = read_request(&path).unwrap();
        assert_eq!(request.commit_message, "fix");
        assert_eq!(request.diff_text, "+x\n");
    }

    #[test]
    fn test_read_missing_request() {
        let err = read_request(Path::new("/nonexistent/request.json")).unwrap_err();
        assert!(matches!(err, DocError::Config(_)));
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/doc.md");
        write_file(&path, "# Doc").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Doc");
    }
}
