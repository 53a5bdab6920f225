//! Shared text helpers used across the update pipeline.

use std::fmt::Display;

/// Truncate to at most `max_chars` characters, respecting char boundaries.
///
/// Used for every character budget sent to the generation service; the
/// untruncated text is always kept for merging.
pub fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Truncate and mark the cut so the model knows the text is partial.
pub fn truncate_with_marker(content: &str, max_chars: usize) -> String {
    let truncated = truncate_chars(content, max_chars);
    if truncated.len() == content.len() {
        return content.to_string();
    }

    // Prefer cutting at a line boundary
    let cut = match truncated.rfind('\n') {
        Some(pos) if pos > truncated.len() / 2 => &truncated[..pos],
        _ => truncated,
    };
    format!("{}\n... [truncated]", cut.trim_end())
}

/// Convert a result into an option, logging discarded errors at warn level.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}
