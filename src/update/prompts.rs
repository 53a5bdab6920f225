//! Generation prompts
//!
//! System/user prompt pairs for file summaries, change analysis and
//! per-section regeneration.

use crate::config::SectionMode;
use crate::constants::markers;
use crate::constants::update as update_constants;
use crate::types::{ChangeType, FileChangeSummary, Priority, SectionKey};

/// A system instruction plus the user message sent with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Inputs shared by every section prompt
#[derive(Debug, Clone, Copy)]
pub struct SectionContext<'a> {
    /// Existing section body, already cut to the character budget
    pub old_text: &'a str,
    pub summaries: &'a [FileChangeSummary],
    pub analysis: &'a str,
    pub commit_message: &'a str,
}

const NEW_SECTION: &str = "(this section does not exist yet; write it from scratch)";

fn existing_text(old: &str) -> &str {
    if old.trim().is_empty() { NEW_SECTION } else { old }
}

fn format_summaries(summaries: &[FileChangeSummary], with_priority: bool) -> String {
    if summaries.is_empty() {
        return "(no file summaries)".to_string();
    }
    summaries
        .iter()
        .map(|s| {
            if with_priority {
                format!("- {} ({}): {}", s.path, s.priority, s.summary)
            } else {
                format!("- {}: {}", s.path, s.summary)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// File Summaries
// =============================================================================

pub fn file_summary_prompt(
    path: &str,
    change_type: ChangeType,
    priority: Priority,
    file_diff: &str,
    commit_message: &str,
) -> Prompt {
    let system = "You summarize source code changes for project documentation.\n\
                  Reply with exactly one line (at most 200 characters) describing what changed \
                  in the file and why it matters. No headings, no code blocks.";

    let diff = if file_diff.trim().is_empty() {
        "(no diff available)"
    } else {
        file_diff
    };

    let user = format!(
        "File: {path}\nChange: {change_type}\nPriority: {priority}\n\n\
         Commit message:\n{commit_message}\n\nDiff:\n{diff}\n\n\
         Summarize this file change in one line."
    );

    Prompt::new(system, user)
}

// =============================================================================
// Change Analysis
// =============================================================================

pub fn analysis_prompt(
    commit_message: &str,
    changed_files: &[String],
    summaries: &[FileChangeSummary],
    diff: &str,
) -> Prompt {
    let keys = SectionKey::ALL
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let system = format!(
        "You analyze code changes for a project documentation maintainer.\n\
         Describe:\n\
         1. Main changes: what was added, modified or removed\n\
         2. Reason: why the change was made (use the commit message)\n\
         3. Impact: which features or modules are affected\n\
         4. Technical details: technologies, patterns or libraries involved\n\n\
         Only describe what the diff shows.\n\
         End with a single line `{} key1,key2` naming the documentation sections \
         that need an update. Valid keys: {}.",
        markers::SECTION_TARGETS,
        keys
    );

    let user = format!(
        "Commit message:\n{}\n\nChanged files:\n{}\n\nFile summaries:\n{}\n\nDiff:\n{}\n\n\
         Analyze the change above.",
        commit_message,
        changed_files.join(", "),
        format_summaries(summaries, true),
        diff
    );

    Prompt::new(system, user)
}

// =============================================================================
// Sections
// =============================================================================

/// Build the generation request for one section
pub fn section_prompt(key: SectionKey, mode: SectionMode, ctx: &SectionContext<'_>) -> Prompt {
    match (key, mode) {
        (SectionKey::Changelog, _) => changelog_prompt(ctx),
        (_, SectionMode::Regenerate) => regenerate_prompt(key, ctx),
        (_, SectionMode::Patch) => patch_prompt(key, ctx),
    }
}

fn changelog_prompt(ctx: &SectionContext<'_>) -> Prompt {
    let system = format!(
        "You write changelog entries.\n\
         Produce only the new entry for this commit.\n\n\
         Rules:\n\
         - Never repeat existing changelog content\n\
         - Output a single bullet, one to three short lines\n\
         - No headings, explanations or code blocks\n\
         - Only changes directly related to the commit\n\
         - Reply with {} if the commit does not deserve an entry",
        markers::NO_CHANGE
    );

    let limit = update_constants::CHANGELOG_SUMMARY_LIMIT.min(ctx.summaries.len());
    let user = format!(
        "Commit message:\n{}\n\nChanged file summaries (partial):\n{}\n\nChange analysis:\n{}\n\n\
         Write the new changelog entry for this commit as one bullet.",
        ctx.commit_message,
        format_summaries(&ctx.summaries[..limit], false),
        ctx.analysis
    );

    Prompt::new(system, user)
}

/// Role and fixed layout the regenerated body must follow
fn section_template(key: SectionKey) -> (&'static str, &'static str) {
    match key {
        SectionKey::Overview => (
            "project overview",
            "Keep exactly these sub-sections:\n\
             ### 1. Purpose\n### 2. Key Features\n### 3. Tech Stack\n\
             ### 4. Architecture Summary\n### 5. Strengths",
        ),
        SectionKey::Architecture => (
            "system architecture",
            "Keep exactly these sub-sections:\n\
             ### 1. Layers\n### 2. Main Components\n### 3. Data and Control Flow\n\
             ### 4. Design Considerations",
        ),
        SectionKey::Modules => (
            "key modules",
            "Describe each module as:\n\
             ### <module name>\n- Purpose:\n- Core features: (2 to 6 bullets)\n\
             - Dependencies: (internal and external)\n- Technical traits:\n\
             - Improvement points: (1 to 3)",
        ),
        SectionKey::Diagram => (
            "architecture diagram",
            "Output only a ```mermaid code block containing a single `graph LR` or \
             `graph TD`, at most 12 nodes and 20 edges, no self loops, nodes based on \
             real files and folders.",
        ),
        SectionKey::Changelog => ("changelog", "One bullet per entry."),
    }
}

fn regenerate_prompt(key: SectionKey, ctx: &SectionContext<'_>) -> Prompt {
    let (role, layout) = section_template(key);

    let system = format!(
        "You maintain the {role} section of a project's documentation.\n\
         Regenerate the whole section so that it reflects the change, using the existing \
         text as the starting point.\n\n\
         {layout}\n\n\
         Rules:\n\
         - Do not use edit markers such as [UPDATE] or [ADD]; output plain Markdown\n\
         - Do not repeat the section heading\n\
         - No commentary outside the section body"
    );

    let user = format!(
        "Existing {role}:\n{}\n\nCommit message:\n{}\n\nChanged file summaries:\n{}\n\n\
         Change analysis:\n{}\n\n\
         Regenerate the {role} section with the change applied. Output only the section body.",
        existing_text(ctx.old_text),
        ctx.commit_message,
        format_summaries(ctx.summaries, true),
        ctx.analysis
    );

    Prompt::new(system, user)
}

fn patch_prompt(key: SectionKey, ctx: &SectionContext<'_>) -> Prompt {
    let (role, _) = section_template(key);

    let system = format!(
        "You maintain the {role} section of a project's documentation.\n\
         Describe the edits needed to reflect the change using these directives:\n\
         [DELETE: <exact text to remove>]\n\
         [UPDATE: <exact existing text>] / <replacement text>\n\
         [ADD] <new text appended at the end>\n\n\
         Rules:\n\
         - Quote existing text verbatim inside DELETE and UPDATE\n\
         - Emit directives only, no commentary\n\
         - Reply with {} if nothing needs to change",
        markers::NO_CHANGE
    );

    let user = format!(
        "Existing {role}:\n{}\n\nCommit message:\n{}\n\nChanged file summaries:\n{}\n\n\
         Change analysis:\n{}\n\nList the edits for this section.",
        existing_text(ctx.old_text),
        ctx.commit_message,
        format_summaries(ctx.summaries, true),
        ctx.analysis
    );

    Prompt::new(system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(path: &str) -> FileChangeSummary {
        FileChangeSummary {
            path: path.to_string(),
            change_type: ChangeType::Modified,
            priority: Priority::High,
            summary: format!("{} changed", path),
        }
    }

    fn context<'a>(summaries: &'a [FileChangeSummary]) -> SectionContext<'a> {
        SectionContext {
            old_text: "- 2024-01-01: Initial version",
            summaries,
            analysis: "added payments",
            commit_message: "feat: payments",
        }
    }

    #[test]
    fn test_changelog_prompt_limits_summaries() {
        let summaries: Vec<_> = (0..8).map(|i| summary(&format!("src/f{}.py", i))).collect();
        let prompt = section_prompt(SectionKey::Changelog, SectionMode::Patch, &context(&summaries));

        assert!(prompt.user.contains("src/f4.py"));
        assert!(!prompt.user.contains("src/f5.py"));
        assert!(prompt.system.contains(markers::NO_CHANGE));
        // Changelog prompt never carries the existing body
        assert!(!prompt.user.contains("Initial version"));
    }

    #[test]
    fn test_regenerate_prompt_carries_old_text() {
        let summaries = vec![summary("src/router.py")];
        let prompt = section_prompt(
            SectionKey::Architecture,
            SectionMode::Regenerate,
            &context(&summaries),
        );

        assert!(prompt.system.contains("system architecture"));
        assert!(prompt.user.contains("Initial version"));
        assert!(prompt.user.contains("src/router.py (high)"));
    }

    #[test]
    fn test_new_section_prompt() {
        let ctx = SectionContext {
            old_text: "",
            ..context(&[])
        };
        let prompt = section_prompt(SectionKey::Overview, SectionMode::Regenerate, &ctx);
        assert!(prompt.user.contains("Existing project overview:\n(this section does not exist yet"));
        assert!(prompt.system.contains("### 1. Purpose"));
    }

    #[test]
    fn test_patch_prompt_lists_directives() {
        let prompt = section_prompt(SectionKey::Modules, SectionMode::Patch, &context(&[]));
        assert!(prompt.system.contains("[UPDATE:"));
        assert!(prompt.system.contains("[DELETE:"));
        assert!(prompt.user.contains("(no file summaries)"));
    }

    #[test]
    fn test_analysis_prompt_requests_targets() {
        let prompt = analysis_prompt("fix", &["a.py".to_string()], &[], "+x");
        assert!(prompt.system.contains("SECTION_TARGETS:"));
        assert!(prompt.system.contains("overview, architecture, diagram, modules, changelog"));
        assert!(prompt.user.contains("a.py"));
    }

    #[test]
    fn test_file_summary_prompt_without_diff() {
        let prompt =
            file_summary_prompt("src/auth.py", ChangeType::Added, Priority::High, "", "init");
        assert!(prompt.user.contains("(no diff available)"));
        assert!(prompt.user.contains("Change: added"));
    }
}
