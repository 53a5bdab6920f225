//! Incremental Update Pipeline
//!
//! One cycle per commit: classify changed files, analyze the change,
//! resolve target sections, regenerate them and reassemble the document.
//! A request without an existing document generates every section from
//! scratch through the same stages.
//!
//! ```text
//! ChangeRequest
//!   -> FileChangeClassifier   (file summaries)
//!   -> ChangeAnalyzer         (analysis text, model targets)
//!   -> targets::resolve       (target section set)
//!   -> ParsedDocument::parse
//!   -> SectionUpdateOrchestrator
//!   -> ParsedDocument::merge  -> DocumentUpdate
//! ```

use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::GenerationService;
use super::analyzer::ChangeAnalyzer;
use super::classifier::FileChangeClassifier;
use super::orchestrator::{MergeReport, SectionUpdateInput, SectionUpdateOrchestrator};
use super::sections::{ParsedDocument, recognize_heading};
use super::targets::{self, ResolvedTargets, TargetSectionSet};
use crate::ai::{ConfigProviderFactory, ProviderConfig, ProviderFactory, ResilientInvoker, SharedFactory};
use crate::config::{Config, UpdateConfig};
use crate::types::{
    ChangeRequest, DocError, DocumentUpdate, Result, SectionKey, TargetSource, UpdateAction,
    UpdateStage,
};

const DEFAULT_TITLE: &str = "Project Documentation";

/// Logs how long each stage of a cycle took
struct StageClock {
    stage: UpdateStage,
    start: Instant,
}

impl StageClock {
    fn start(stage: UpdateStage) -> Self {
        debug!("Stage {} started", stage);
        Self {
            stage,
            start: Instant::now(),
        }
    }

    fn finish(self) {
        debug!(
            "Stage {} finished in {}ms",
            self.stage,
            self.start.elapsed().as_millis()
        );
    }
}

/// Runs update cycles against an injected generation service
pub struct IncrementalUpdater {
    service: Option<GenerationService>,
    config: UpdateConfig,
}

impl IncrementalUpdater {
    /// Updater generating through `factory`
    pub fn new(factory: SharedFactory, config: &Config) -> Self {
        Self {
            service: Some(GenerationService::new(
                factory,
                ResilientInvoker::from_config(config),
            )),
            config: config.update.clone(),
        }
    }

    /// Updater that never calls the generation service
    pub fn templated(config: &Config) -> Self {
        Self {
            service: None,
            config: UpdateConfig {
                templated: true,
                ..config.update.clone()
            },
        }
    }

    /// Build from configuration, falling back to templated mode when no
    /// provider can be constructed
    pub fn from_config(config: &Config) -> Self {
        if config.update.templated {
            return Self::templated(config);
        }

        let factory = ConfigProviderFactory::new(ProviderConfig::from_llm_config(&config.llm));
        match factory.create() {
            Ok(provider) => {
                info!("Using {} ({})", provider.name(), provider.model());
                Self::new(Arc::new(factory), config)
            }
            Err(e) => {
                warn!("Provider unavailable, switching to templated mode: {}", e);
                Self::templated(config)
            }
        }
    }

    pub fn is_templated(&self) -> bool {
        self.service.is_none() || self.config.templated
    }

    pub fn classifier(&self) -> FileChangeClassifier {
        FileChangeClassifier::new(self.service.clone(), &self.config)
    }

    /// Run one cycle: update the existing document, or generate a new one
    /// when the request carries none
    pub async fn run(&self, request: &ChangeRequest) -> Result<DocumentUpdate> {
        match request.existing_document {
            Some(_) => self.update(request).await,
            None => self.generate(request).await,
        }
    }

    /// Update the request's existing document; a missing or blank document
    /// fails before any work
    pub async fn update(&self, request: &ChangeRequest) -> Result<DocumentUpdate> {
        self.cycle(request, UpdateAction::Updated).await
    }

    /// Generate every canonical section of a new document
    pub async fn generate(&self, request: &ChangeRequest) -> Result<DocumentUpdate> {
        self.cycle(request, UpdateAction::Created).await
    }

    async fn cycle(&self, request: &ChangeRequest, action: UpdateAction) -> Result<DocumentUpdate> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("update_cycle", id = %cycle_id, action = %action);
        self.run_cycle(request, action).instrument(span).await
    }

    async fn run_cycle(&self, request: &ChangeRequest, action: UpdateAction) -> Result<DocumentUpdate> {
        let (title, parsed) = match action {
            UpdateAction::Updated => {
                let document = request
                    .existing_document
                    .as_ref()
                    .filter(|doc| !doc.content.trim().is_empty())
                    .ok_or(DocError::MissingDocument)?;
                (document.title.as_str(), ParsedDocument::parse(&document.content))
            }
            UpdateAction::Created => {
                let title = request
                    .title
                    .as_deref()
                    .or(request.existing_document.as_ref().map(|doc| doc.title.as_str()))
                    .unwrap_or("");
                (title, ParsedDocument::default())
            }
        };

        info!(
            "{} document for {} changed files{}",
            match action {
                UpdateAction::Updated => "Updating",
                UpdateAction::Created => "Generating",
            },
            request.changed_files.len(),
            if self.is_templated() { " (templated)" } else { "" }
        );

        let clock = StageClock::start(UpdateStage::Classification);
        let classification = self.classifier().classify(request).await;
        let analysis = ChangeAnalyzer::new(self.service.clone(), &self.config)
            .analyze(request, &classification.summaries)
            .await;
        let resolved = match action {
            UpdateAction::Updated => targets::resolve(
                &request.changed_files,
                analysis.model_targets.as_deref(),
            ),
            UpdateAction::Created => ResolvedTargets {
                sections: TargetSectionSet::from_keys(SectionKey::ALL),
                source: TargetSource::Initial,
            },
        };
        clock.finish();

        let clock = StageClock::start(UpdateStage::SectionGeneration);
        let input = SectionUpdateInput {
            document: &parsed,
            targets: &resolved.sections,
            summaries: &classification.summaries,
            analysis: &analysis.text,
            commit_message: &request.commit_message,
        };
        let report = SectionUpdateOrchestrator::new(self.service.clone(), &self.config)
            .update_sections(&input)
            .await
            .map_err(|e| match e {
                DocError::Pipeline { .. } => e,
                other => DocError::pipeline(UpdateStage::SectionGeneration, other.to_string()),
            })?;
        clock.finish();

        let clock = StageClock::start(UpdateStage::Merge);
        let merged = parsed.merge(&report.updated_bodies);
        if merged.trim().is_empty() {
            return Err(DocError::pipeline(
                UpdateStage::Merge,
                "merged document is empty",
            ));
        }
        let content = with_title(title, &merged);
        clock.finish();

        let summary = summarize(action, &resolved.sections.to_string(), &report);
        info!("{}", summary);

        Ok(DocumentUpdate {
            action,
            content,
            summary,
            updated_sections: report.results,
            target_source: resolved.source,
        })
    }
}

/// Prefix `# <title>` unless the document already opens with an H1
fn with_title(title: &str, merged: &str) -> String {
    let opens_with_h1 = merged
        .lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| {
            let line = line.trim_start();
            line.starts_with("# ") && recognize_heading(line).is_none()
        });
    if opens_with_h1 {
        return merged.to_string();
    }

    let title = match title.trim() {
        "" => DEFAULT_TITLE,
        title => title,
    };
    format!("# {}\n\n{}", title, merged)
}

fn summarize(action: UpdateAction, sections: &str, report: &MergeReport) -> String {
    let failed: Vec<String> = report.failed().map(|r| r.key.to_string()).collect();
    let mut summary = match action {
        UpdateAction::Updated => format!("Incremental update applied to sections: {}", sections),
        UpdateAction::Created => format!("Document generated with sections: {}", sections),
    };
    if !failed.is_empty() {
        summary.push_str(&format!(" (failed: {})", failed.join(", ")));
    }
    summary
}
