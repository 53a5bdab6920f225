//! Document section vocabulary
//!
//! The fixed set of sections the engine knows how to regenerate, plus the
//! per-section outcome recorded for every update cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::DocError;

/// A recognized document section
///
/// Ordering is the canonical document order and is used as "target-set
/// order" whenever sections are processed sequentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Overview,
    Architecture,
    Diagram,
    Modules,
    Changelog,
}

impl SectionKey {
    pub const ALL: [SectionKey; 5] = [
        SectionKey::Overview,
        SectionKey::Architecture,
        SectionKey::Diagram,
        SectionKey::Modules,
        SectionKey::Changelog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Overview => "overview",
            SectionKey::Architecture => "architecture",
            SectionKey::Diagram => "diagram",
            SectionKey::Modules => "modules",
            SectionKey::Changelog => "changelog",
        }
    }

    /// Heading text used when a section has to be created from scratch
    pub fn canonical_heading(&self) -> &'static str {
        match self {
            SectionKey::Overview => "Project Overview",
            SectionKey::Architecture => "Architecture",
            SectionKey::Diagram => "Architecture Diagram",
            SectionKey::Modules => "Key Modules",
            SectionKey::Changelog => "Changelog",
        }
    }

    /// Map an H2 heading to a section key using the strict allow-list.
    ///
    /// Only the exact canonical titles (case and inner whitespace ignored)
    /// start a section; aliases are accepted by [`FromStr`] but not here.
    pub fn from_heading(heading: &str) -> Option<Self> {
        match normalize_name(heading).as_str() {
            "project overview" => Some(SectionKey::Overview),
            "architecture" => Some(SectionKey::Architecture),
            "architecture diagram" => Some(SectionKey::Diagram),
            "key modules" => Some(SectionKey::Modules),
            "changelog" => Some(SectionKey::Changelog),
            _ => None,
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize_name(&s.replace(['_', '-'], " "));
        match name.as_str() {
            "overview" | "project overview" => Ok(SectionKey::Overview),
            "architecture" | "system design" => Ok(SectionKey::Architecture),
            "diagram" | "architecture diagram" | "system diagram" => Ok(SectionKey::Diagram),
            "modules" | "key modules" => Ok(SectionKey::Modules),
            "changelog" | "change log" | "recent changes" => Ok(SectionKey::Changelog),
            _ => Err(DocError::UnknownSection(s.trim().to_string())),
        }
    }
}

/// Lowercase and collapse runs of whitespace into single spaces
pub(crate) fn normalize_name(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Slot of a parsed document: a recognized section, or the whole document
/// when no recognized heading exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionSlot {
    Known(SectionKey),
    Full,
}

impl SectionSlot {
    pub fn key(&self) -> Option<SectionKey> {
        match self {
            SectionSlot::Known(key) => Some(*key),
            SectionSlot::Full => None,
        }
    }
}

impl From<SectionKey> for SectionSlot {
    fn from(key: SectionKey) -> Self {
        SectionSlot::Known(key)
    }
}

impl fmt::Display for SectionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionSlot::Known(key) => write!(f, "{}", key),
            SectionSlot::Full => f.write_str("__full__"),
        }
    }
}

/// Outcome of regenerating one target section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionUpdateResult {
    pub key: SectionKey,
    /// Length of the previous body, in characters
    pub old_length: usize,
    /// Length of the new body, in characters
    pub new_length: usize,
    pub changed: bool,
    /// Set when generation for this section failed; the old body was kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionUpdateResult {
    pub fn completed(key: SectionKey, old: &str, new: &str) -> Self {
        Self {
            key,
            old_length: old.chars().count(),
            new_length: new.chars().count(),
            changed: new.trim() != old.trim(),
            error: None,
        }
    }

    pub fn failed(key: SectionKey, old: &str, error: impl Into<String>) -> Self {
        let length = old.chars().count();
        Self {
            key,
            old_length: length,
            new_length: length,
            changed: false,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
