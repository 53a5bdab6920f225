//! Content Merger
//!
//! Folds generated text back into a section body. The changelog is
//! append-only; other sections are either replaced wholesale or patched
//! with edit directives.

use tracing::debug;

use super::directives::{self, EditDirective, Fragment};
use crate::config::SectionMode;
use crate::constants::{markers, update as update_constants};
use crate::types::{DocError, Result, SectionKey, SectionSlot, truncate_chars};

// =============================================================================
// Changelog
// =============================================================================

fn is_no_change(text: &str) -> bool {
    text.trim().is_empty() || text.contains(markers::NO_CHANGE)
}

/// True when `entry` already appears verbatim in `old`
fn contains_entry(old: &str, entry: &str) -> bool {
    if entry.contains('\n') {
        old.contains(entry)
    } else {
        old.lines().any(|line| line.trim() == entry)
    }
}

/// Append a changelog entry below the existing body
pub fn merge_changelog(old: &str, entry: &str) -> String {
    if is_no_change(entry) {
        return old.to_string();
    }

    let entry = entry.trim();
    if contains_entry(old, entry) {
        debug!("Changelog entry already present, skipping");
        return old.to_string();
    }
    if old.trim().is_empty() {
        return entry.to_string();
    }

    format!("{}\n{}", old.trim_end(), entry)
}

// =============================================================================
// Directive Application
// =============================================================================

/// Verbatim snippet plus the shorter key used when the model paraphrases
struct Snippet<'a> {
    full: &'a str,
    key: &'a str,
}

impl<'a> Snippet<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            full: text,
            key: truncate_chars(text, update_constants::SNIPPET_KEY_CHARS),
        }
    }

    /// Needles in match order: the verbatim snippet, then the key
    fn needles(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        let key = (self.key != self.full).then_some(self.key);
        std::iter::once(self.full).chain(key)
    }
}

/// Level and text of an ATX heading line (`#` through `######`)
fn heading_parts(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.len() - trimmed.trim_start_matches('#').len();
    let rest = &trimmed[level..];
    if !(1..=6).contains(&level) || !(rest.is_empty() || rest.starts_with([' ', '\t'])) {
        return None;
    }
    Some((level, rest.trim().trim_end_matches('#').trim_end()))
}

fn heading_level(line: &str) -> Option<usize> {
    heading_parts(line).map(|(level, _)| level)
}

/// Remove the heading at `index` with all deeper content below it
fn remove_heading_block(lines: &mut Vec<&str>, index: usize, level: usize) {
    let end = lines[index + 1..]
        .iter()
        .position(|line| heading_level(line).is_some_and(|l| l <= level))
        .map(|offset| index + 1 + offset)
        .unwrap_or(lines.len());
    lines.drain(index..end);
}

fn split_paragraphs(content: &str) -> Vec<&str> {
    content.split("\n\n").collect()
}

/// Index of the heading with the same level as `target` and the same text,
/// falling back to a heading that starts with the truncated key
fn find_heading(lines: &[&str], target: &str) -> Option<usize> {
    let (level, text) = heading_parts(target)?;
    let at_level = |line: &str, matches: &dyn Fn(&str) -> bool| {
        heading_parts(line).is_some_and(|(l, t)| l == level && matches(t))
    };

    if let Some(index) = lines.iter().position(|line| at_level(*line, &|t: &str| t == text)) {
        return Some(index);
    }

    let key = truncate_chars(text, update_constants::SNIPPET_KEY_CHARS);
    if key == text {
        return None;
    }
    lines
        .iter()
        .position(|line| at_level(*line, &|t: &str| t.starts_with(key)))
}

fn apply_delete(content: &str, target: &str) -> String {
    let mut lines: Vec<&str> = content.lines().collect();

    if target.starts_with('#') {
        if let Some(index) = find_heading(&lines, target)
            && let Some(level) = heading_level(lines[index])
        {
            remove_heading_block(&mut lines, index, level);
            return lines.join("\n");
        }
        debug!("DELETE heading not found: {}", target);
        return content.to_string();
    }

    for needle in Snippet::new(target).needles() {
        if let Some(index) = lines.iter().position(|line| line.contains(needle)) {
            match heading_level(lines[index]) {
                Some(level) => remove_heading_block(&mut lines, index, level),
                None => {
                    lines.remove(index);
                }
            }
            return lines.join("\n");
        }

        let mut paragraphs = split_paragraphs(content);
        if let Some(index) = paragraphs.iter().position(|p| p.contains(needle)) {
            paragraphs.remove(index);
            return paragraphs.join("\n\n");
        }
    }

    debug!("DELETE target not found: {}", target);
    content.to_string()
}

fn append_block(content: &str, text: &str) -> String {
    let content = content.trim_end();
    if content.is_empty() {
        text.to_string()
    } else {
        format!("{}\n\n{}", content, text)
    }
}

fn apply_update(content: &str, target: &str, replacement: &str) -> String {
    if replacement.is_empty() {
        return content.to_string();
    }

    // Verbatim occurrence: replace in place, keep the surrounding text
    if content.contains(target) {
        return content.replacen(target, replacement, 1);
    }

    // Paraphrased target: the key selects a whole line, then a paragraph
    for needle in Snippet::new(target).needles().skip(1) {
        let mut lines: Vec<&str> = content.lines().collect();
        if let Some(index) = lines.iter().position(|line| line.contains(needle)) {
            lines[index] = replacement;
            return lines.join("\n");
        }

        let mut paragraphs = split_paragraphs(content);
        if let Some(index) = paragraphs.iter().position(|p| p.contains(needle)) {
            paragraphs[index] = replacement;
            return paragraphs.join("\n\n");
        }
    }

    debug!("UPDATE target not found, appending: {}", target);
    append_block(content, replacement)
}

/// Apply edit directives to `old`: deletes first, then updates, then additions
pub fn merge_section_changes(old: &str, changes: &str) -> String {
    if is_no_change(changes) {
        return old.to_string();
    }

    let fragments = directives::scan(changes);

    if old.trim().is_empty() {
        return directives::strip_tags(&fragments).trim().to_string();
    }

    let mut result = old.to_string();

    for directive in directives::directives(&fragments) {
        if let EditDirective::Delete(target) = directive {
            result = apply_delete(&result, target);
        }
    }
    for directive in directives::directives(&fragments) {
        if let EditDirective::Update {
            target,
            replacement,
        } = directive
        {
            result = apply_update(&result, target, replacement);
        }
    }
    for fragment in &fragments {
        if let Fragment::Directive(EditDirective::Add(text)) = fragment
            && !text.is_empty()
        {
            result = append_block(&result, text);
        }
    }

    trim_blank_lines(&result).to_string()
}

/// Trim trailing whitespace and leading blank lines, keeping indentation
fn trim_blank_lines(text: &str) -> &str {
    let text = text.trim_end();
    let start: usize = text
        .split('\n')
        .take_while(|line| line.trim().is_empty())
        .map(|line| line.len() + 1)
        .sum();
    &text[start.min(text.len())..]
}

// =============================================================================
// Generated Section Text
// =============================================================================

/// Drop a repeated `## <heading>` line at the top of regenerated text
fn strip_echoed_heading(key: SectionKey, text: &str) -> &str {
    let text = text.trim();
    let Some(first) = text.lines().next() else {
        return text;
    };
    match super::sections::recognize_heading(first) {
        Some(heading) if SectionKey::from_heading(heading) == Some(key) => {
            text[first.len()..].trim()
        }
        _ => text,
    }
}

/// Merge generation output for one slot into its old body
pub fn merge_generated(
    slot: SectionSlot,
    mode: SectionMode,
    old: &str,
    generated: &str,
) -> Result<String> {
    let key = match slot {
        SectionSlot::Known(key) => key,
        SectionSlot::Full => return Err(DocError::UnknownSection(slot.to_string())),
    };

    let merged = match (key, mode) {
        (SectionKey::Changelog, _) => merge_changelog(old, generated),
        (_, SectionMode::Regenerate) => {
            let body = strip_echoed_heading(key, generated);
            if is_no_change(body) {
                old.to_string()
            } else {
                body.to_string()
            }
        }
        (_, SectionMode::Patch) => merge_section_changes(old, generated),
    };
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_changelog_appends_in_order() {
        let merged = merge_changelog(
            "- 2024-01-01: Initial version",
            "- 2024-02-01: Added payments",
        );
        assert_eq!(
            merged,
            "- 2024-01-01: Initial version\n- 2024-02-01: Added payments"
        );

        // Re-applying the same entry does not duplicate it
        assert_eq!(merge_changelog(&merged, "- 2024-02-01: Added payments\n"), merged);
    }

    #[test]
    fn test_changelog_edge_cases() {
        assert_eq!(merge_changelog("- a", ""), "- a");
        assert_eq!(merge_changelog("- a", "   "), "- a");
        assert_eq!(merge_changelog("  \n", "- first"), "- first");
        assert_eq!(merge_changelog("- a\n\n", "- b"), "- a\n- b");
    }

    #[test]
    fn test_update_replaces_in_place() {
        let old = "## Architecture\nmonolith, single server";
        let merged = merge_section_changes(old, "[UPDATE: single server] / Kubernetes cluster");

        assert_eq!(merged, "## Architecture\nmonolith, Kubernetes cluster");
        assert!(!merged.contains("single server"));
    }

    #[test]
    fn test_update_fallback_key_replaces_line() {
        let old = "Intro\nThe service runs as a single process behind nginx today\nOutro";
        // First 30 chars match, the tail was paraphrased
        let changes = "[UPDATE: The service runs as a single process behind an nginx proxy] \
                       / The service runs on Kubernetes";
        let merged = merge_section_changes(old, changes);
        assert_eq!(merged, "Intro\nThe service runs on Kubernetes\nOutro");
    }

    #[test]
    fn test_update_no_match_appends() {
        let old = "Line one\n\nLine two";
        let merged = merge_section_changes(old, "[UPDATE: not-present-snippet] / replacement");
        assert_eq!(merged, "Line one\n\nLine two\n\nreplacement");
    }

    #[test]
    fn test_update_empty_replacement_skipped() {
        assert_eq!(merge_section_changes("keep me", "[UPDATE: keep]"), "keep me");
    }

    #[test]
    fn test_delete_heading_block() {
        let old = "\
### Billing
- Purpose: invoices
#### Internals
- cron
### Users
- Purpose: accounts";
        let merged = merge_section_changes(old, "[DELETE: ### Billing]");
        assert_eq!(merged, "### Users\n- Purpose: accounts");
    }

    #[test]
    fn test_delete_heading_ignores_deeper_prefix_match() {
        let old = "\
### Users
- accounts
#### Billing hooks
- webhook
### Billing
- invoices
### Orders
- carts";
        let merged = merge_section_changes(old, "[DELETE: ### Billing]");
        assert_eq!(
            merged,
            "### Users\n- accounts\n#### Billing hooks\n- webhook\n### Orders\n- carts"
        );

        // Same text at another level is not a match
        assert_eq!(merge_section_changes(old, "[DELETE: ## Billing]"), old);
    }

    #[test]
    fn test_delete_heading_by_key() {
        let old = "### Payment reconciliation and settlement jobs\n- nightly\n### Users\n- accounts";
        let merged = merge_section_changes(
            old,
            "[DELETE: ### Payment reconciliation and settlement workers]",
        );
        assert_eq!(merged, "### Users\n- accounts");
    }

    #[test]
    fn test_delete_verbatim_paragraph_before_key() {
        let old = "Intro\n\nThe payment service talks to Stripe\nthrough a webhook relay.\n\nOutro";
        let merged = merge_section_changes(
            old,
            "[DELETE: The payment service talks to Stripe\nthrough a webhook relay.]",
        );
        assert_eq!(merged, "Intro\n\nOutro");
    }

    #[test]
    fn test_update_verbatim_paragraph_before_key() {
        let old = "Intro\n\nThe payment service talks to Stripe\nthrough a webhook relay.\n\nOutro";
        let merged = merge_section_changes(
            old,
            "[UPDATE: The payment service talks to Stripe\nthrough a webhook relay.] / Payments use Adyen.",
        );
        assert_eq!(merged, "Intro\n\nPayments use Adyen.\n\nOutro");
    }

    #[test]
    fn test_unmatched_update_keeps_indentation() {
        let old = "  indented first\nrest";
        let merged = merge_section_changes(old, "[UPDATE: not-present-snippet] / replacement");
        assert!(merged.contains(old));
        assert_eq!(merged, "  indented first\nrest\n\nreplacement");
    }

    #[test]
    fn test_delete_line_then_paragraph() {
        let old = "- a\n- legacy cron job\n- b";
        assert_eq!(merge_section_changes(old, "[DELETE: legacy cron job]"), "- a\n- b");

        let old = "First para\n\nspans two\nlines here\n\nLast";
        assert_eq!(
            merge_section_changes(old, "[DELETE: two\nlines]"),
            "First para\n\nLast"
        );

        assert_eq!(merge_section_changes("untouched", "[DELETE: missing]"), "untouched");
    }

    #[test]
    fn test_directive_order() {
        // The update target is deleted first, so the replacement is appended
        let old = "alpha\nbeta";
        let changes = "[ADD] gamma\n[UPDATE: beta] / BETA\n[DELETE: beta]";
        assert_eq!(merge_section_changes(old, changes), "alpha\n\nBETA\n\ngamma");
    }

    #[test]
    fn test_blank_old_strips_tags() {
        let merged = merge_section_changes("", "[ADD]\n### Payments\n- Purpose: charge cards");
        assert_eq!(merged, "### Payments\n- Purpose: charge cards");
    }

    #[test]
    fn test_free_text_without_directives_ignored() {
        assert_eq!(merge_section_changes("old body", "just commentary"), "old body");
    }

    #[test]
    fn test_merge_generated_modes() {
        let slot = SectionSlot::Known(SectionKey::Architecture);

        let regenerated =
            merge_generated(slot, SectionMode::Regenerate, "old", "## Architecture\nnew body")
                .unwrap();
        assert_eq!(regenerated, "new body");

        let kept = merge_generated(slot, SectionMode::Regenerate, "old", "  \n").unwrap();
        assert_eq!(kept, "old");

        let patched =
            merge_generated(slot, SectionMode::Patch, "monolith", "[ADD] workers").unwrap();
        assert_eq!(patched, "monolith\n\nworkers");

        let changelog = merge_generated(
            SectionSlot::Known(SectionKey::Changelog),
            SectionMode::Regenerate,
            "- a",
            "- b",
        )
        .unwrap();
        assert_eq!(changelog, "- a\n- b");
    }

    #[test]
    fn test_full_slot_rejected() {
        let err = merge_generated(SectionSlot::Full, SectionMode::Regenerate, "a", "b").unwrap_err();
        assert!(matches!(err, DocError::UnknownSection(name) if name == "__full__"));
    }

    proptest! {
        #[test]
        fn prop_no_change_is_identity(old in ".{0,200}") {
            prop_assert_eq!(merge_changelog(&old, markers::NO_CHANGE), old.clone());
            prop_assert_eq!(merge_section_changes(&old, markers::NO_CHANGE), old);
        }

        #[test]
        fn prop_unmatched_update_appends(old in "[a-z ]{1,80}") {
            prop_assume!(!old.trim().is_empty());
            let merged = merge_section_changes(&old, "[UPDATE: NOT-PRESENT-SNIPPET] / replacement");
            prop_assert!(merged.starts_with(old.trim_end()));
            prop_assert!(merged.contains(old.trim_end()));
            prop_assert!(merged.ends_with("replacement"));
        }
    }
}
