//! Deterministic text used when the generation service is disabled

use chrono::{NaiveDate, Utc};

use crate::constants::update as update_constants;
use crate::types::{FileChangeSummary, SectionKey, truncate_chars};

use super::diff::line_stats;

/// First line of the commit message, cut to `max_chars`
fn commit_headline(commit_message: &str, max_chars: usize) -> &str {
    let line = commit_message
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    truncate_chars(line, max_chars).trim_end()
}

/// `- <date>: <commit headline>`
pub fn changelog_entry(commit_message: &str, date: NaiveDate) -> String {
    format!(
        "- {}: {}",
        date.format("%Y-%m-%d"),
        commit_headline(commit_message, update_constants::TEMPLATED_CHANGELOG_CHARS)
    )
}

/// Old body with an update note appended
pub fn section_note(old: &str, commit_message: &str) -> String {
    let note = format!(
        "*Updated: {}*",
        commit_headline(commit_message, update_constants::TEMPLATED_NOTE_CHARS)
    );
    if old.trim().is_empty() {
        note
    } else {
        format!("{}\n\n{}", old.trim_end(), note)
    }
}

/// Generated text for `key` in templated mode, dated today
pub fn section_text(key: SectionKey, old: &str, commit_message: &str) -> String {
    match key {
        SectionKey::Changelog => changelog_entry(commit_message, Utc::now().date_naive()),
        _ => section_note(old, commit_message),
    }
}

/// Top-level directory (or file name) of a changed path
fn top_component(path: &str) -> &str {
    let path = path.trim_start_matches("./");
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    match (parts.next(), parts.next()) {
        (Some("src"), Some(next)) => next,
        (Some(first), _) => first,
        (None, _) => path,
    }
}

/// Distinct top-level components in first-seen order, capped for diagrams
fn components(summaries: &[FileChangeSummary]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for summary in summaries {
        let component = top_component(&summary.path);
        if !seen.contains(&component) {
            seen.push(component);
        }
    }
    seen.truncate(update_constants::TEMPLATED_DIAGRAM_NODES);
    seen
}

fn file_list(summaries: &[FileChangeSummary]) -> String {
    if summaries.is_empty() {
        return "- (no changed files)".to_string();
    }
    summaries
        .iter()
        .map(|s| format!("- `{}` ({})", s.path, s.change_type))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Starter body for a section that does not exist yet
pub fn initial_text(key: SectionKey, summaries: &[FileChangeSummary], commit_message: &str) -> String {
    let headline = commit_headline(commit_message, update_constants::TEMPLATED_CHANGELOG_CHARS);
    match key {
        SectionKey::Overview => format!(
            "Documentation created from commit: {}\n\nFiles in this change:\n{}",
            headline,
            file_list(summaries)
        ),
        SectionKey::Architecture => {
            let parts = components(summaries);
            if parts.is_empty() {
                "Components: (none recorded yet)".to_string()
            } else {
                let lines: Vec<String> = parts.iter().map(|c| format!("- {}", c)).collect();
                format!("Components:\n{}", lines.join("\n"))
            }
        }
        SectionKey::Diagram => {
            let mut lines = vec!["```mermaid".to_string(), "graph TD".to_string()];
            lines.push("  project[project]".to_string());
            for (i, component) in components(summaries).iter().enumerate() {
                lines.push(format!("  project --> n{}[\"{}\"]", i, component));
            }
            lines.push("```".to_string());
            lines.join("\n")
        }
        SectionKey::Modules => {
            if summaries.is_empty() {
                return "No modules recorded yet.".to_string();
            }
            summaries
                .iter()
                .map(|s| format!("### {}\n- Purpose: {}", s.path, s.summary))
                .collect::<Vec<_>>()
                .join("\n\n")
        }
        SectionKey::Changelog => changelog_entry(commit_message, Utc::now().date_naive()),
    }
}

/// Analysis text built from the request alone
pub fn analysis(commit_message: &str, summaries: &[FileChangeSummary], diff: &str) -> String {
    let stats = line_stats(diff);
    let files = if summaries.is_empty() {
        "(none)".to_string()
    } else {
        summaries
            .iter()
            .map(|s| format!("- {}", s.summary))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Commit: {}\nChanged files ({}):\n{}\nLines: +{}/-{}",
        commit_message.trim(),
        summaries.len(),
        files,
        stats.added,
        stats.removed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeType, Priority};

    #[test]
    fn test_changelog_entry_truncates() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(
            changelog_entry("feat: Added payments\n\nlong body", date),
            "- 2024-02-01: feat: Added payments"
        );

        let long = "x".repeat(100);
        let entry = changelog_entry(&long, date);
        assert_eq!(entry.len(), "- 2024-02-01: ".len() + 60);
    }

    #[test]
    fn test_section_note() {
        assert_eq!(
            section_note("monolith\n", "refactor: split workers"),
            "monolith\n\n*Updated: refactor: split workers*"
        );
        assert_eq!(section_note("", "fix"), "*Updated: fix*");
    }

    fn summary(path: &str) -> FileChangeSummary {
        FileChangeSummary {
            path: path.to_string(),
            change_type: ChangeType::Added,
            priority: Priority::High,
            summary: format!("{} added", path),
        }
    }

    #[test]
    fn test_initial_text_per_section() {
        let summaries = vec![
            summary("src/payments/router.py"),
            summary("src/payments/service.py"),
            summary("README.md"),
        ];

        let overview = initial_text(SectionKey::Overview, &summaries, "feat: init shop");
        assert!(overview.starts_with("Documentation created from commit: feat: init shop"));
        assert!(overview.contains("- `README.md` (added)"));

        let architecture = initial_text(SectionKey::Architecture, &summaries, "x");
        assert_eq!(architecture, "Components:\n- payments\n- README.md");

        let diagram = initial_text(SectionKey::Diagram, &summaries, "x");
        assert!(diagram.starts_with("```mermaid\ngraph TD"));
        assert!(diagram.contains("project --> n0[\"payments\"]"));
        assert!(diagram.ends_with("```"));

        let modules = initial_text(SectionKey::Modules, &summaries, "x");
        assert!(modules.starts_with("### src/payments/router.py\n- Purpose: src/payments/router.py added"));

        assert_eq!(initial_text(SectionKey::Modules, &[], "x"), "No modules recorded yet.");
    }

    #[test]
    fn test_analysis_lists_files() {
        let summaries = vec![FileChangeSummary {
            path: "src/app.py".to_string(),
            change_type: ChangeType::Modified,
            priority: Priority::Low,
            summary: "src/app.py (modified): +1/-0 lines".to_string(),
        }];
        let text = analysis("feat: app", &summaries, "+line\n-old\n+new\n");
        assert!(text.contains("Changed files (1):"));
        assert!(text.contains("- src/app.py (modified)"));
        assert!(text.ends_with("Lines: +2/-1"));
    }
}
