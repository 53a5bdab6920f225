//! Incremental Document Update
//!
//! Section-level regeneration of an existing document from a code change.
//!
//! ## Modules
//!
//! - `classifier`: change type, priority and summary per changed file
//! - `analyzer`: free-text change analysis with optional model targets
//! - `targets`: target section resolution
//! - `sections`: markdown section parser and reassembly
//! - `directives` / `merger`: applying generated text to old bodies
//! - `orchestrator`: bounded fan-out over target sections
//! - `pipeline`: the full update cycle

pub mod analyzer;
pub mod classifier;
pub mod diff;
pub mod directives;
pub mod merger;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod sections;
pub mod targets;
pub mod templated;

pub use analyzer::{ChangeAnalysis, ChangeAnalyzer};
pub use classifier::{ClassificationResult, FileChangeClassifier, classify_priority};
pub use merger::{merge_changelog, merge_generated, merge_section_changes};
pub use orchestrator::{MergeReport, SectionUpdateInput, SectionUpdateOrchestrator};
pub use pipeline::IncrementalUpdater;
pub use sections::{ParsedDocument, SectionOutline};
pub use targets::{ResolvedTargets, TargetSectionSet};

use crate::ai::{ResilientInvoker, SharedFactory};

/// Provider factory plus the retry policy wrapped around every call
#[derive(Clone)]
pub struct GenerationService {
    pub factory: SharedFactory,
    pub invoker: ResilientInvoker,
}

impl GenerationService {
    pub fn new(factory: SharedFactory, invoker: ResilientInvoker) -> Self {
        Self { factory, invoker }
    }
}
