pub mod change;
pub mod error;
pub mod section;
pub mod utils;

pub use change::{
    ChangeRequest, ChangeType, DocumentUpdate, ExistingDocument, FileChangeSummary, Priority,
    TargetSource, UpdateAction,
};
pub use error::{DocError, ErrorCategory, ErrorClassifier, LlmError, Result, UpdateStage};
pub use section::{SectionKey, SectionSlot, SectionUpdateResult};
pub use utils::{log_filter_warn, truncate_chars, truncate_with_marker};
