//! docweave - Incremental Documentation Updates
//!
//! Keeps AI-generated project documentation in sync with code changes by
//! regenerating only the sections a commit touches.
//!
//! ## Core Features
//!
//! - **Section-level updates**: unchanged sections keep their exact text
//! - **Change classification**: per-file priority and one-line summaries
//! - **Bounded concurrency**: one generation task per section under a worker pool
//! - **Resilient generation**: timeouts and exponential backoff per call
//! - **Templated mode**: deterministic output without a provider
//!
//! ## Quick Start
//!
//! ```ignore
//! use docweave::{ChangeRequest, ConfigLoader, IncrementalUpdater};
//!
//! let config = ConfigLoader::load()?;
//! let updater = IncrementalUpdater::from_config(&config);
//! let request = ChangeRequest::new("feat: payments", diff)
//!     .with_files(["src/payments/router.py"])
//!     .with_document("Shop", existing_markdown);
//! let update = updater.run(&request).await?;
//! println!("{}", update.content);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: provider abstraction and resilient invocation
//! - [`update`]: classification, section parsing, merging and orchestration
//! - [`config`]: layered configuration
//! - [`types`]: shared data model and errors

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod types;
pub mod update;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, SectionMode, UpdateConfig};

// Error Types
pub use types::error::{DocError, ErrorCategory, Result, UpdateStage};

// Data Model
pub use types::{
    ChangeRequest, ChangeType, DocumentUpdate, ExistingDocument, FileChangeSummary, Priority,
    SectionKey, SectionUpdateResult, TargetSource, UpdateAction,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use update::{
    FileChangeClassifier, IncrementalUpdater, ParsedDocument, SectionUpdateOrchestrator,
    TargetSectionSet,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    ConfigProviderFactory, LlmProvider, LlmResponse, ProviderFactory, ResilientInvoker,
    RetryPolicy, SharedFactory, SharedProvider, TimeoutConfig, with_timeout,
};
