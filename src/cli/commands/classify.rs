//! Classify Command
//!
//! Show per-file priority and summaries, plus the sections the changed
//! paths point at, without touching any document.

use std::path::Path;

use crate::cli::Output;
use crate::cli::util::{CommandContext, OutputFormat, read_request};
use crate::types::{Priority, Result};
use crate::update::IncrementalUpdater;
use crate::update::targets::heuristic_targets;

pub async fn run(ctx: CommandContext, request: &Path, format: OutputFormat) -> Result<()> {
    let request = read_request(request)?;
    let updater = IncrementalUpdater::from_config(&ctx.config);
    let result = updater.classifier().classify(&request).await;
    let targets = heuristic_targets(&request.changed_files);

    if format.is_json() {
        let output = serde_json::json!({
            "summaries": result.summaries,
            "targets": targets,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let out = Output::new();
    out.header(&format!("{} changed files", result.summaries.len()));
    for summary in &result.summaries {
        println!(
            "  [{:<6}] {:<8} {}",
            summary.priority.to_string(),
            summary.change_type.to_string(),
            summary.summary
        );
    }
    println!();
    out.info(&format!(
        "high: {}, medium: {}, low: {}",
        result.count_by_priority(Priority::High),
        result.count_by_priority(Priority::Medium),
        result.count_by_priority(Priority::Low)
    ));
    out.info(&format!("Path-inferred sections: {}", targets));

    Ok(())
}
