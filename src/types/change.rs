//! Change records exchanged with the document store
//!
//! `ChangeRequest` is what a collaborator hands the engine for one commit;
//! `DocumentUpdate` is what it gets back to persist as a new version.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::section::SectionUpdateResult;

/// How a file was touched by the change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Added => write!(f, "added"),
            ChangeType::Modified => write!(f, "modified"),
            ChangeType::Deleted => write!(f, "deleted"),
        }
    }
}

/// Coarse importance of a changed file
///
/// Controls whether the file is summarized by the generation service
/// (`High`, `Medium`) or with a cheap template (`Low`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn uses_service(&self) -> bool {
        matches!(self, Priority::High | Priority::Medium)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// One-line description of a changed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeSummary {
    pub path: String,
    pub change_type: ChangeType,
    pub priority: Priority,
    pub summary: String,
}

/// Document as currently persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Input for one update cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    #[serde(default, alias = "commit_message")]
    pub commit_message: String,
    #[serde(default, alias = "diff_text", alias = "diff")]
    pub diff_text: String,
    #[serde(default, alias = "changed_files")]
    pub changed_files: Vec<String>,
    #[serde(default, alias = "existing_document")]
    pub existing_document: Option<ExistingDocument>,
    /// Title for a newly generated document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChangeRequest {
    pub fn new(commit_message: impl Into<String>, diff_text: impl Into<String>) -> Self {
        Self {
            commit_message: commit_message.into(),
            diff_text: diff_text.into(),
            ..Default::default()
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_document(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.existing_document = Some(ExistingDocument {
            title: title.into(),
            content: content.into(),
        });
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Whether a cycle wrote a new document or updated an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    Created,
    Updated,
}

impl fmt::Display for UpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateAction::Created => write!(f, "created"),
            UpdateAction::Updated => write!(f, "updated"),
        }
    }
}

/// Where the target section set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSource {
    /// Inferred from changed file paths
    Heuristic,
    /// Taken from a `SECTION_TARGETS:` marker in the analysis text
    Model,
    /// Every section of a newly generated document
    Initial,
}

/// Result of one update cycle, handed back to the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    pub action: UpdateAction,
    pub content: String,
    pub summary: String,
    pub updated_sections: Vec<SectionUpdateResult>,
    pub target_source: TargetSource,
}

impl DocumentUpdate {
    /// Sections whose generation failed and kept their old body
    pub fn failed_sections(&self) -> impl Iterator<Item = &SectionUpdateResult> {
        self.updated_sections.iter().filter(|r| r.is_failed())
    }

    pub fn is_partial(&self) -> bool {
        self.updated_sections.iter().any(|r| r.is_failed())
    }
}
