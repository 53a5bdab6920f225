//! Update Command
//!
//! Run one cycle for a change request. `update` revises the request's
//! existing document, or generates one when the request has none;
//! `generate` always writes a new document.
//!
//! Usage:
//!   docweave update --request change.json [--output doc.md] [--report report.json]
//!                   [--templated] [--format json]
//!   docweave generate --request change.json [--output doc.md] ...

use std::path::PathBuf;

use crate::cli::Output;
use crate::cli::util::{CommandContext, OutputFormat, read_request, write_file};
use crate::types::{Result, TargetSource, UpdateAction};
use crate::update::IncrementalUpdater;

pub struct UpdateOptions {
    pub request: PathBuf,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub templated: bool,
    pub format: OutputFormat,
    /// Force new-document generation instead of deciding from the request
    pub generate: bool,
}

pub async fn run(ctx: CommandContext, options: UpdateOptions) -> Result<()> {
    let request = read_request(&options.request)?;

    let mut config = ctx.config;
    if options.templated {
        config.update.templated = true;
    }
    config.validate()?;

    let updater = IncrementalUpdater::from_config(&config);
    let update = if options.generate {
        updater.generate(&request).await?
    } else {
        updater.run(&request).await?
    };

    if let Some(path) = &options.output {
        write_file(path, &update.content)?;
    }
    if let Some(path) = &options.report {
        write_file(path, &serde_json::to_string_pretty(&update)?)?;
    }

    if options.format.is_json() {
        println!("{}", serde_json::to_string_pretty(&update)?);
        return Ok(());
    }

    let out = Output::new();
    out.header(match update.action {
        UpdateAction::Created => "Document Generation",
        UpdateAction::Updated => "Document Update",
    });
    for result in &update.updated_sections {
        out.section_result(result);
    }
    println!();

    if update.is_partial() {
        out.warning(&update.summary);
    } else {
        out.success(&update.summary);
    }
    out.info(match update.target_source {
        TargetSource::Heuristic => "Targets inferred from changed paths",
        TargetSource::Model => "Targets chosen by change analysis",
        TargetSource::Initial => "All sections generated for a new document",
    });

    match &options.output {
        Some(path) => out.info(&format!("Document written to {}", path.display())),
        None => {
            out.section("Content");
            println!("{}", update.content);
        }
    }
    if let Some(path) = &options.report {
        out.info(&format!("Report written to {}", path.display()));
    }

    Ok(())
}
