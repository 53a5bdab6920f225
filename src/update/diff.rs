//! Unified diff slicing
//!
//! Line scanners over git-style unified diffs. Nothing here fails: a file
//! that cannot be located simply has no diff.

use crate::types::ChangeType;

const GIT_HEADER: &str = "diff --git ";

/// Added/removed line counts of a diff slice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub added: usize,
    pub removed: usize,
}

/// Lines of `text` paired with their byte offset
fn lines_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|line| {
            let start = offset;
            offset += line.len();
            (start, line.trim_end_matches(['\n', '\r']))
        })
        .collect()
}

fn header_names_path(header: &str, path: &str) -> bool {
    let a = format!("a/{}", path);
    let b = format!("b/{}", path);
    header[GIT_HEADER.len()..]
        .split_whitespace()
        .any(|token| token == a || token == b)
}

/// Slice of `diff` belonging to `path`, or `""` when the file is absent.
///
/// Git headers (`diff --git a/<path> b/<path>`) delimit files; diffs without
/// them are sliced on their `---`/`+++` pairs.
pub fn extract_file_diff<'a>(diff: &'a str, path: &str) -> &'a str {
    let path = path.trim();
    if path.is_empty() || diff.is_empty() {
        return "";
    }

    let lines = lines_with_offsets(diff);
    if lines.iter().any(|(_, line)| line.starts_with(GIT_HEADER)) {
        return slice_by_git_headers(diff, &lines, path);
    }
    slice_by_file_markers(diff, &lines, path)
}

fn slice_by_git_headers<'a>(diff: &'a str, lines: &[(usize, &str)], path: &str) -> &'a str {
    let Some(start_idx) = lines
        .iter()
        .position(|(_, line)| line.starts_with(GIT_HEADER) && header_names_path(line, path))
    else {
        return "";
    };

    let start = lines[start_idx].0;
    let end = lines[start_idx + 1..]
        .iter()
        .find(|(_, line)| line.starts_with(GIT_HEADER))
        .map(|(offset, _)| *offset)
        .unwrap_or(diff.len());

    &diff[start..end]
}

/// Index of a `---` line that opens a file section (followed by `+++`)
fn is_file_marker(lines: &[(usize, &str)], idx: usize) -> bool {
    lines[idx].1.starts_with("--- ")
        && lines
            .get(idx + 1)
            .is_some_and(|(_, next)| next.starts_with("+++ "))
}

fn slice_by_file_markers<'a>(diff: &'a str, lines: &[(usize, &str)], path: &str) -> &'a str {
    let old_name = format!("--- a/{}", path);
    let new_name = format!("+++ b/{}", path);

    let Some(start_idx) = (0..lines.len()).find(|&idx| {
        is_file_marker(lines, idx)
            && (lines[idx].1.trim_end() == old_name || lines[idx + 1].1.trim_end() == new_name)
    }) else {
        return "";
    };

    let start = lines[start_idx].0;
    let end = (start_idx + 2..lines.len())
        .find(|&idx| is_file_marker(lines, idx))
        .map(|idx| lines[idx].0)
        .unwrap_or(diff.len());

    &diff[start..end]
}

/// Derive how a file was touched from its diff slice
pub fn detect_change_type(file_diff: &str) -> ChangeType {
    let mut added = false;
    for line in file_diff.lines() {
        let line = line.trim_end();
        if line == "+++ /dev/null" || line.starts_with("deleted file mode") {
            return ChangeType::Deleted;
        }
        if line == "--- /dev/null" || line.starts_with("new file mode") {
            added = true;
        }
    }

    if added {
        ChangeType::Added
    } else {
        ChangeType::Modified
    }
}

/// Count content lines added and removed, ignoring file markers
pub fn line_stats(file_diff: &str) -> LineStats {
    file_diff
        .lines()
        .fold(LineStats::default(), |mut stats, line| {
            if line.starts_with('+') && !line.starts_with("+++") {
                stats.added += 1;
            } else if line.starts_with('-') && !line.starts_with("---") {
                stats.removed += 1;
            }
            stats
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIT_DIFF: &str = "\
diff --git a/src/app.py b/src/app.py
index 1111111..2222222 100644
--- a/src/app.py
+++ b/src/app.py
@@ -1,2 +1,3 @@
 import os
+import sys
-import re
+import json
diff --git a/src/new_router.py b/src/new_router.py
new file mode 100644
--- /dev/null
+++ b/src/new_router.py
@@ -0,0 +1 @@
+router = Router()
diff --git a/src/old.py b/src/old.py
deleted file mode 100644
--- a/src/old.py
+++ /dev/null
@@ -1 +0,0 @@
-print('bye')
";

    #[test]
    fn test_extract_git_slices() {
        let app = extract_file_diff(GIT_DIFF, "src/app.py");
        assert!(app.starts_with("diff --git a/src/app.py"));
        assert!(app.contains("+import json"));
        assert!(!app.contains("new_router"));

        let old = extract_file_diff(GIT_DIFF, "src/old.py");
        assert!(old.ends_with("-print('bye')\n"));
    }

    #[test]
    fn test_extract_requires_exact_path() {
        // "app.py" must not match "src/app.py"
        assert_eq!(extract_file_diff(GIT_DIFF, "app.py"), "");
        assert_eq!(extract_file_diff(GIT_DIFF, "src/missing.py"), "");
        assert_eq!(extract_file_diff("", "src/app.py"), "");
    }

    #[test]
    fn test_extract_without_git_headers() {
        let diff = "\
--- a/lib/util.rs
+++ b/lib/util.rs
@@ -1 +1 @@
-fn a() {}
+fn b() {}
--- a/lib/other.rs
+++ b/lib/other.rs
@@ -1 +1 @@
-x
+y
";
        let util = extract_file_diff(diff, "lib/util.rs");
        assert!(util.contains("+fn b() {}"));
        assert!(!util.contains("other.rs"));

        let other = extract_file_diff(diff, "lib/other.rs");
        assert!(other.starts_with("--- a/lib/other.rs"));
    }

    #[test]
    fn test_detect_change_type() {
        assert_eq!(
            detect_change_type(extract_file_diff(GIT_DIFF, "src/app.py")),
            ChangeType::Modified
        );
        assert_eq!(
            detect_change_type(extract_file_diff(GIT_DIFF, "src/new_router.py")),
            ChangeType::Added
        );
        assert_eq!(
            detect_change_type(extract_file_diff(GIT_DIFF, "src/old.py")),
            ChangeType::Deleted
        );
        assert_eq!(detect_change_type(""), ChangeType::Modified);
    }

    #[test]
    fn test_line_stats() {
        let stats = line_stats(extract_file_diff(GIT_DIFF, "src/app.py"));
        assert_eq!(stats, LineStats { added: 2, removed: 1 });
        assert_eq!(line_stats(""), LineStats::default());
    }
}
