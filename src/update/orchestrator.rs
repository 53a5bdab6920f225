//! Section Update Orchestrator
//!
//! Fans out one generation task per target section under a bounded pool,
//! merges each result into its old body and reports per-section outcomes.
//! A failed section keeps its old body unless fail-fast is configured.

use futures::StreamExt;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::GenerationService;
use super::merger::merge_generated;
use super::prompts::{self, SectionContext};
use super::sections::ParsedDocument;
use super::targets::TargetSectionSet;
use super::templated;
use crate::ai::LlmProvider;
use crate::config::{SectionMode, UpdateConfig};
use crate::types::{
    DocError, FileChangeSummary, Result, SectionKey, SectionUpdateResult, UpdateStage,
    truncate_with_marker,
};

/// Everything the section tasks read; shared immutably across tasks
#[derive(Debug, Clone, Copy)]
pub struct SectionUpdateInput<'a> {
    pub document: &'a ParsedDocument,
    pub targets: &'a TargetSectionSet,
    pub summaries: &'a [FileChangeSummary],
    pub analysis: &'a str,
    pub commit_message: &'a str,
}

impl SectionUpdateInput<'_> {
    fn old_body(&self, key: SectionKey) -> &str {
        self.document.body(key).unwrap_or("")
    }
}

/// New section bodies plus one result per target, in canonical order
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Bodies of sections that were regenerated successfully
    pub updated_bodies: BTreeMap<SectionKey, String>,
    pub results: Vec<SectionUpdateResult>,
}

impl MergeReport {
    pub fn failed(&self) -> impl Iterator<Item = &SectionUpdateResult> {
        self.results.iter().filter(|r| r.is_failed())
    }

    pub fn is_partial(&self) -> bool {
        self.failed().next().is_some()
    }
}

struct SectionOutcome {
    body: String,
    result: SectionUpdateResult,
}

impl SectionOutcome {
    fn completed(key: SectionKey, old: &str, body: String) -> Self {
        Self {
            result: SectionUpdateResult::completed(key, old, &body),
            body,
        }
    }

    fn failed(key: SectionKey, old: &str, error: &DocError) -> Self {
        warn!("Section {} kept its old body: {}", key, error);
        Self {
            result: SectionUpdateResult::failed(key, old, error.to_string()),
            body: old.to_string(),
        }
    }
}

pub struct SectionUpdateOrchestrator {
    service: Option<GenerationService>,
    concurrency: usize,
    max_section_chars: usize,
    mode: SectionMode,
    fail_fast: bool,
}

impl SectionUpdateOrchestrator {
    pub fn new(service: Option<GenerationService>, config: &UpdateConfig) -> Self {
        Self {
            service: service.filter(|_| !config.templated),
            concurrency: config.section_concurrency.max(1),
            max_section_chars: config.max_section_chars,
            mode: config.section_mode,
            fail_fast: config.fail_on_section_error,
        }
    }

    pub fn is_templated(&self) -> bool {
        self.service.is_none()
    }

    /// Regenerate every target section of `input`
    pub async fn update_sections(&self, input: &SectionUpdateInput<'_>) -> Result<MergeReport> {
        let keys = input.targets.keys();
        let start = Instant::now();

        let mut outcomes = match &self.service {
            None => self.update_templated(&keys, input),
            Some(service) if self.concurrency == 1 || keys.len() <= 1 => {
                self.update_sequential(service, &keys, input).await
            }
            Some(service) => self.update_parallel(service, &keys, input).await,
        };
        outcomes.sort_by_key(|o| o.result.key);

        if self.fail_fast
            && let Some(failed) = outcomes.iter().find(|o| o.result.is_failed())
        {
            return Err(DocError::pipeline(
                UpdateStage::SectionGeneration,
                format!(
                    "section {} failed: {}",
                    failed.result.key,
                    failed.result.error.as_deref().unwrap_or("unknown error")
                ),
            ));
        }

        let mut report = MergeReport::default();
        for outcome in outcomes {
            if !outcome.result.is_failed() {
                report.updated_bodies.insert(outcome.result.key, outcome.body);
            }
            report.results.push(outcome.result);
        }

        info!(
            "Updated {} sections in {:.1}s ({} failed)",
            report.results.len(),
            start.elapsed().as_secs_f64(),
            report.failed().count()
        );
        Ok(report)
    }

    fn update_templated(&self, keys: &[SectionKey], input: &SectionUpdateInput<'_>) -> Vec<SectionOutcome> {
        debug!("Templated update of {} sections", keys.len());
        keys.iter()
            .map(|&key| {
                let old = input.old_body(key);
                let text = if old.trim().is_empty() {
                    templated::initial_text(key, input.summaries, input.commit_message)
                } else {
                    templated::section_text(key, old, input.commit_message)
                };
                match merge_generated(key.into(), SectionMode::Regenerate, old, &text) {
                    Ok(body) => SectionOutcome::completed(key, old, body),
                    Err(e) => SectionOutcome::failed(key, old, &e),
                }
            })
            .collect()
    }

    async fn update_sequential(
        &self,
        service: &GenerationService,
        keys: &[SectionKey],
        input: &SectionUpdateInput<'_>,
    ) -> Vec<SectionOutcome> {
        debug!("Updating {} sections sequentially", keys.len());

        let provider = match service.factory.create() {
            Ok(provider) => provider,
            Err(e) => {
                return keys
                    .iter()
                    .map(|&key| SectionOutcome::failed(key, input.old_body(key), &e))
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(keys.len());
        for &key in keys {
            outcomes.push(self.update_one(service, provider.as_ref(), key, input).await);
        }
        outcomes
    }

    async fn update_parallel(
        &self,
        service: &GenerationService,
        keys: &[SectionKey],
        input: &SectionUpdateInput<'_>,
    ) -> Vec<SectionOutcome> {
        let pool = self.concurrency.min(keys.len());
        debug!("Updating {} sections with {} workers", keys.len(), pool);

        // Each task gets its own provider
        futures::stream::iter(keys.iter().copied())
            .map(|key| async move {
                match service.factory.create() {
                    Ok(provider) => self.update_one(service, provider.as_ref(), key, input).await,
                    Err(e) => SectionOutcome::failed(key, input.old_body(key), &e),
                }
            })
            .buffer_unordered(pool)
            .collect()
            .await
    }

    async fn update_one(
        &self,
        service: &GenerationService,
        provider: &dyn LlmProvider,
        key: SectionKey,
        input: &SectionUpdateInput<'_>,
    ) -> SectionOutcome {
        let old = input.old_body(key);
        let sent = truncate_with_marker(old, self.max_section_chars);
        let ctx = SectionContext {
            old_text: &sent,
            summaries: input.summaries,
            analysis: input.analysis,
            commit_message: input.commit_message,
        };
        let prompt = prompts::section_prompt(key, self.mode, &ctx);

        let operation = format!("section {}", key);
        let generated = service
            .invoker
            .invoke(provider, &prompt.system, &prompt.user, &operation)
            .await;

        match generated.and_then(|text| merge_generated(key.into(), self.mode, old, &text)) {
            Ok(body) => {
                debug!(
                    "Section {}: {} -> {} chars",
                    key,
                    old.chars().count(),
                    body.chars().count()
                );
                SectionOutcome::completed(key, old, body)
            }
            Err(e) => SectionOutcome::failed(key, old, &e),
        }
    }
}
