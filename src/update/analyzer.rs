//! Change Analysis
//!
//! Produces the free-text description of a change that every section
//! prompt carries, plus any section targets the model asked for.

use tracing::{debug, warn};

use super::GenerationService;
use super::prompts;
use super::targets::{parse_target_marker, strip_target_marker};
use super::templated;
use crate::config::UpdateConfig;
use crate::types::{
    ChangeRequest, FileChangeSummary, SectionKey, log_filter_warn, truncate_with_marker,
};

/// Analysis text with the target marker removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeAnalysis {
    pub text: String,
    /// Sections named by a `SECTION_TARGETS:` line, if one was emitted
    pub model_targets: Option<Vec<SectionKey>>,
}

impl ChangeAnalysis {
    /// Split generated analysis into text and model targets
    pub fn from_generated(raw: &str) -> Self {
        Self {
            text: strip_target_marker(raw),
            model_targets: parse_target_marker(raw),
        }
    }

    fn templated(request: &ChangeRequest, summaries: &[FileChangeSummary]) -> Self {
        Self {
            text: templated::analysis(&request.commit_message, summaries, &request.diff_text),
            model_targets: None,
        }
    }
}

pub struct ChangeAnalyzer {
    service: Option<GenerationService>,
    max_diff_chars: usize,
}

impl ChangeAnalyzer {
    pub fn new(service: Option<GenerationService>, config: &UpdateConfig) -> Self {
        Self {
            service: service.filter(|_| !config.templated),
            max_diff_chars: config.max_analysis_diff_chars,
        }
    }

    pub async fn analyze(
        &self,
        request: &ChangeRequest,
        summaries: &[FileChangeSummary],
    ) -> ChangeAnalysis {
        let Some(service) = &self.service else {
            return ChangeAnalysis::templated(request, summaries);
        };

        let diff = truncate_with_marker(&request.diff_text, self.max_diff_chars);
        let prompt = prompts::analysis_prompt(
            &request.commit_message,
            &request.changed_files,
            summaries,
            &diff,
        );

        let generated = match service.factory.create() {
            Ok(provider) => {
                service
                    .invoker
                    .invoke(provider.as_ref(), &prompt.system, &prompt.user, "change analysis")
                    .await
            }
            Err(e) => Err(e),
        };

        match log_filter_warn(generated, "Change analysis failed, using template") {
            Some(raw) if !raw.trim().is_empty() => {
                let analysis = ChangeAnalysis::from_generated(&raw);
                debug!(
                    "Change analysis: {} chars, model targets: {:?}",
                    analysis.text.len(),
                    analysis.model_targets
                );
                analysis
            }
            Some(_) => {
                warn!("Empty change analysis, using template");
                ChangeAnalysis::templated(request, summaries)
            }
            None => ChangeAnalysis::templated(request, summaries),
        }
    }
}
