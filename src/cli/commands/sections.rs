//! Sections Command
//!
//! Show how a markdown document splits into recognized sections.

use std::path::Path;

use crate::cli::Output;
use crate::cli::util::OutputFormat;
use crate::types::Result;
use crate::update::ParsedDocument;

pub fn run(path: &Path, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let parsed = ParsedDocument::parse(&content);
    let outline = parsed.outline();

    if format.is_json() {
        let output = serde_json::json!({
            "preambleChars": parsed.preamble.chars().count(),
            "sections": outline,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let out = Output::new();
    out.header(&path.display().to_string());
    if parsed.is_unsectioned() {
        out.warning("No recognized sections; the document is treated as one block");
    }
    if !parsed.preamble.is_empty() {
        println!("  {:<14} {} chars", "(preamble)", parsed.preamble.chars().count());
    }
    for row in &outline {
        println!("  {:<14} {:<24} {} chars", row.slot, row.heading, row.chars);
    }

    Ok(())
}
