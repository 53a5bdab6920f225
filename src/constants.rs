//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry constants for generation calls
pub mod retry {
    /// Default number of retries after the first attempt
    pub const DEFAULT_MAX_RETRIES: usize = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// Update pipeline constants
pub mod update {
    /// Default worker pool size for per-file summaries
    pub const FILE_SUMMARY_CONCURRENCY: usize = 4;

    /// Default worker pool size for section regeneration
    pub const SECTION_CONCURRENCY: usize = 5;

    /// Maximum characters of an existing section sent to the generation service
    pub const MAX_SECTION_CHARS: usize = 6000;

    /// Maximum characters of one file's diff sent for summarization
    pub const MAX_FILE_DIFF_CHARS: usize = 4000;

    /// Maximum characters of the whole diff sent for change analysis
    pub const MAX_ANALYSIS_DIFF_CHARS: usize = 12000;

    /// Maximum length of a generated one-line file summary
    pub const MAX_SUMMARY_CHARS: usize = 200;

    /// Prefix length used as a fallback key when matching edit snippets
    pub const SNIPPET_KEY_CHARS: usize = 30;

    /// File summaries included in a changelog prompt
    pub const CHANGELOG_SUMMARY_LIMIT: usize = 5;

    /// Commit message characters used in a templated changelog entry
    pub const TEMPLATED_CHANGELOG_CHARS: usize = 60;

    /// Commit message characters used in a templated section note
    pub const TEMPLATED_NOTE_CHARS: usize = 50;

    /// Component nodes drawn in a templated diagram
    pub const TEMPLATED_DIAGRAM_NODES: usize = 12;
}

/// Markers exchanged with the generation service
pub mod markers {
    /// Generated text carrying this marker leaves a section untouched
    pub const NO_CHANGE: &str = "[NO_CHANGE]";

    /// Prefix of the line listing sections the model wants regenerated
    pub const SECTION_TARGETS: &str = "SECTION_TARGETS:";
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
