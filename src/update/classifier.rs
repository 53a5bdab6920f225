//! File Change Classification
//!
//! Assigns change type and priority to every changed file and produces a
//! one-line summary. High and medium priority files are summarized by the
//! generation service; everything else uses a template.

use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::GenerationService;
use super::diff::{detect_change_type, extract_file_diff, line_stats};
use super::prompts;
use crate::ai::LlmProvider;
use crate::config::UpdateConfig;
use crate::constants::update as update_constants;
use crate::types::{
    ChangeRequest, ChangeType, FileChangeSummary, Priority, truncate_chars, truncate_with_marker,
};

const HIGH_PRIORITY_KEYWORDS: &[&str] = &["router", "service", "schema", "auth", "config"];
const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &["util", "middleware", "test"];

/// Priority tier from path substrings, highest tier first
pub fn classify_priority(path: &str) -> Priority {
    let lower = path.to_lowercase();
    if HIGH_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::High
    } else if MEDIUM_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Summary used when the generation service is not consulted
pub fn templated_summary(path: &str, change_type: ChangeType, file_diff: &str) -> String {
    if file_diff.trim().is_empty() {
        return fallback_summary(path, change_type);
    }
    let stats = line_stats(file_diff);
    format!(
        "{} ({}): +{}/-{} lines",
        path, change_type, stats.added, stats.removed
    )
}

/// Summary used when generation fails or returns nothing
pub fn fallback_summary(path: &str, change_type: ChangeType) -> String {
    format!("{} ({})", path, change_type)
}

/// First meaningful line of a generated summary
fn condense_summary(text: &str) -> Option<String> {
    let line = text
        .lines()
        .map(str::trim)
        .map(|line| line.trim_start_matches(['-', '*', '•']).trim())
        .find(|line| !line.is_empty())?;

    Some(truncate_chars(line, update_constants::MAX_SUMMARY_CHARS).to_string())
}

/// Per-file summaries in input order
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult {
    pub summaries: Vec<FileChangeSummary>,
}

impl ClassificationResult {
    pub fn count_by_priority(&self, priority: Priority) -> usize {
        self.summaries
            .iter()
            .filter(|s| s.priority == priority)
            .count()
    }
}

/// A changed file waiting for its summary
struct PendingFile<'a> {
    path: String,
    change_type: ChangeType,
    priority: Priority,
    file_diff: &'a str,
}

/// Classifies changed files and summarizes them
pub struct FileChangeClassifier {
    service: Option<GenerationService>,
    concurrency: usize,
    max_file_diff_chars: usize,
}

impl FileChangeClassifier {
    /// `service = None` (or `templated` in config) summarizes every file from a template
    pub fn new(service: Option<GenerationService>, config: &UpdateConfig) -> Self {
        Self {
            service: service.filter(|_| !config.templated),
            concurrency: config.file_summary_concurrency.max(1),
            max_file_diff_chars: config.max_file_diff_chars,
        }
    }

    pub fn is_templated(&self) -> bool {
        self.service.is_none()
    }

    pub async fn classify(&self, request: &ChangeRequest) -> ClassificationResult {
        let mut seen = HashSet::new();
        let files: Vec<PendingFile<'_>> = request
            .changed_files
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty() && seen.insert(p.to_string()))
            .map(|path| {
                let file_diff = extract_file_diff(&request.diff_text, path);
                PendingFile {
                    path: path.to_string(),
                    change_type: detect_change_type(file_diff),
                    priority: classify_priority(path),
                    file_diff,
                }
            })
            .collect();

        let mut summaries: HashMap<String, String> = HashMap::with_capacity(files.len());
        let mut service_files = Vec::new();

        for file in &files {
            if self.service.is_some() && file.priority.uses_service() {
                service_files.push(file);
            } else {
                summaries.insert(
                    file.path.clone(),
                    templated_summary(&file.path, file.change_type, file.file_diff),
                );
            }
        }

        if let Some(service) = &self.service
            && !service_files.is_empty()
        {
            let generated = if service_files.len() > 1 && self.concurrency > 1 {
                self.summarize_parallel(service, &service_files, &request.commit_message)
                    .await
            } else {
                self.summarize_sequential(service, &service_files, &request.commit_message)
                    .await
            };
            summaries.extend(generated);
        }

        // Re-project onto input order
        let summaries: Vec<FileChangeSummary> = files
            .into_iter()
            .map(|file| {
                let summary = summaries
                    .remove(&file.path)
                    .unwrap_or_else(|| fallback_summary(&file.path, file.change_type));
                FileChangeSummary {
                    path: file.path,
                    change_type: file.change_type,
                    priority: file.priority,
                    summary,
                }
            })
            .collect();

        let result = ClassificationResult { summaries };
        info!(
            "Classified {} files (high: {}, medium: {}, low: {})",
            result.summaries.len(),
            result.count_by_priority(Priority::High),
            result.count_by_priority(Priority::Medium),
            result.count_by_priority(Priority::Low)
        );
        result
    }

    async fn summarize_sequential(
        &self,
        service: &GenerationService,
        files: &[&PendingFile<'_>],
        commit_message: &str,
    ) -> Vec<(String, String)> {
        debug!("Summarizing {} files sequentially", files.len());

        let provider = match service.factory.create() {
            Ok(provider) => provider,
            Err(e) => {
                warn!("Provider unavailable, using fallback summaries: {}", e);
                return files
                    .iter()
                    .map(|f| (f.path.clone(), fallback_summary(&f.path, f.change_type)))
                    .collect();
            }
        };

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let summary = self
                .summarize_one(service, provider.as_ref(), file, commit_message)
                .await;
            results.push((file.path.clone(), summary));
        }
        results
    }

    async fn summarize_parallel(
        &self,
        service: &GenerationService,
        files: &[&PendingFile<'_>],
        commit_message: &str,
    ) -> Vec<(String, String)> {
        let pool = self.concurrency.min(files.len());
        debug!("Summarizing {} files with {} workers", files.len(), pool);

        // Each task gets its own provider
        futures::stream::iter(files.iter().copied())
            .map(|file| async move {
                let summary = match service.factory.create() {
                    Ok(provider) => {
                        self.summarize_one(service, provider.as_ref(), file, commit_message)
                            .await
                    }
                    Err(e) => {
                        warn!("Provider unavailable for {}: {}", file.path, e);
                        fallback_summary(&file.path, file.change_type)
                    }
                };
                (file.path.clone(), summary)
            })
            .buffer_unordered(pool)
            .collect()
            .await
    }

    async fn summarize_one(
        &self,
        service: &GenerationService,
        provider: &dyn LlmProvider,
        file: &PendingFile<'_>,
        commit_message: &str,
    ) -> String {
        let diff = truncate_with_marker(file.file_diff, self.max_file_diff_chars);
        let prompt = prompts::file_summary_prompt(
            &file.path,
            file.change_type,
            file.priority,
            &diff,
            commit_message,
        );

        let operation = format!("summary of {}", file.path);
        match service
            .invoker
            .invoke(provider, &prompt.system, &prompt.user, &operation)
            .await
        {
            Ok(text) => condense_summary(&text).unwrap_or_else(|| {
                warn!("Empty summary for {}, using fallback", file.path);
                fallback_summary(&file.path, file.change_type)
            }),
            Err(e) => {
                warn!("Summary generation failed for {}: {}", file.path, e);
                fallback_summary(&file.path, file.change_type)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::mock::ScriptedProvider;
    use crate::ai::{ResilientInvoker, RetryPolicy, SharedProvider};
    use crate::types::{DocError, Result};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const DIFF: &str = "\
diff --git a/src/api/auth_router.py b/src/api/auth_router.py
--- a/src/api/auth_router.py
+++ b/src/api/auth_router.py
@@ -1 +1,2 @@
+@router.post('/login')
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1 +1 @@
-old
+new
diff --git a/src/utils/helper.py b/src/utils/helper.py
new file mode 100644
--- /dev/null
+++ b/src/utils/helper.py
@@ -0,0 +1 @@
+def helper(): pass
";

    fn service_with(provider: Arc<ScriptedProvider>, created: Arc<AtomicUsize>) -> GenerationService {
        let factory = move || -> Result<SharedProvider> {
            created.fetch_add(1, Ordering::SeqCst);
            let shared: SharedProvider = provider.clone();
            Ok(shared)
        };
        GenerationService::new(
            Arc::new(factory),
            ResilientInvoker::new(RetryPolicy::none(), Duration::from_secs(1)),
        )
    }

    fn request() -> ChangeRequest {
        ChangeRequest::new("feat: login", DIFF).with_files([
            "src/api/auth_router.py",
            "README.md",
            "src/utils/helper.py",
        ])
    }

    #[test]
    fn test_priority_tiers() {
        assert_eq!(classify_priority("src/api/auth_router.py"), Priority::High);
        assert_eq!(classify_priority("src/utils/helper.py"), Priority::Medium);
        assert_eq!(classify_priority("README.md"), Priority::Low);
        // High keywords win over medium ones
        assert_eq!(classify_priority("tests/test_config.py"), Priority::High);
        assert_eq!(classify_priority("SRC/Services/Billing.py"), Priority::High);
    }

    #[test]
    fn test_templated_summary() {
        assert_eq!(
            templated_summary("README.md", ChangeType::Modified, "-old\n+new\n+more\n"),
            "README.md (modified): +2/-1 lines"
        );
        assert_eq!(
            templated_summary("docs/a.md", ChangeType::Deleted, ""),
            "docs/a.md (deleted)"
        );
    }

    #[test]
    fn test_condense_summary() {
        assert_eq!(
            condense_summary("\n\n- Adds login endpoint\nmore detail").as_deref(),
            Some("Adds login endpoint")
        );
        assert_eq!(condense_summary("   \n  "), None);
        let long = "x".repeat(500);
        assert_eq!(condense_summary(&long).unwrap().len(), 200);
    }

    #[tokio::test]
    async fn test_templated_mode_never_calls_service() {
        let provider = Arc::new(ScriptedProvider::constant("unused"));
        let created = Arc::new(AtomicUsize::new(0));
        let config = UpdateConfig {
            templated: true,
            ..UpdateConfig::default()
        };
        let classifier =
            FileChangeClassifier::new(Some(service_with(provider.clone(), created.clone())), &config);

        let result = classifier.classify(&request()).await;

        assert!(classifier.is_templated());
        assert_eq!(provider.calls(), 0);
        assert_eq!(result.summaries[0].summary, "src/api/auth_router.py (modified): +1/-0 lines");
        assert_eq!(result.summaries[2].change_type, ChangeType::Added);
    }

    #[tokio::test]
    async fn test_service_summaries_keep_input_order() {
        let provider = Arc::new(
            ScriptedProvider::from_fn(|_, user| {
                let path = user
                    .lines()
                    .find_map(|l| l.strip_prefix("File: "))
                    .unwrap_or("?")
                    .to_string();
                Ok(format!("* summary for {}", path))
            })
            .with_delay(Duration::from_millis(5)),
        );
        let created = Arc::new(AtomicUsize::new(0));
        let classifier = FileChangeClassifier::new(
            Some(service_with(provider.clone(), created.clone())),
            &UpdateConfig::default(),
        );

        let result = classifier.classify(&request()).await;
        let paths: Vec<_> = result.summaries.iter().map(|s| s.path.as_str()).collect();

        assert_eq!(
            paths,
            vec!["src/api/auth_router.py", "README.md", "src/utils/helper.py"]
        );
        assert_eq!(result.summaries[0].summary, "summary for src/api/auth_router.py");
        assert_eq!(result.summaries[1].summary, "README.md (modified): +1/-1 lines");
        assert_eq!(result.summaries[2].summary, "summary for src/utils/helper.py");
        // Low priority README is never sent; one provider per parallel task
        assert_eq!(provider.calls(), 2);
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sequential_mode_reuses_one_provider() {
        let provider = Arc::new(ScriptedProvider::constant("Touches login flow"));
        let created = Arc::new(AtomicUsize::new(0));
        let config = UpdateConfig {
            file_summary_concurrency: 1,
            ..UpdateConfig::default()
        };
        let classifier =
            FileChangeClassifier::new(Some(service_with(provider.clone(), created.clone())), &config);

        classifier.classify(&request()).await;

        assert_eq!(provider.calls(), 2);
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_generation_falls_back() {
        let provider = Arc::new(ScriptedProvider::from_fn(|_, _| {
            Err(DocError::LlmApi("429 Too Many Requests".to_string()))
        }));
        let created = Arc::new(AtomicUsize::new(0));
        let classifier = FileChangeClassifier::new(
            Some(service_with(provider, created)),
            &UpdateConfig::default(),
        );

        let result = classifier.classify(&request()).await;

        assert_eq!(result.summaries[0].summary, "src/api/auth_router.py (modified)");
        assert_eq!(result.summaries[2].summary, "src/utils/helper.py (added)");
    }

    #[tokio::test]
    async fn test_duplicate_and_blank_paths_skipped() {
        let classifier = FileChangeClassifier::new(None, &UpdateConfig::default());
        let request = ChangeRequest::new("m", DIFF).with_files(["README.md", " ", "README.md"]);

        let result = classifier.classify(&request).await;
        assert_eq!(result.summaries.len(), 1);
    }
}
