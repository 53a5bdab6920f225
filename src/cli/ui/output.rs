use console::style;

use crate::types::SectionUpdateResult;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// One row of the per-section report
    pub fn section_result(&self, result: &SectionUpdateResult) {
        let lengths = format!("{} → {} chars", result.old_length, result.new_length);
        match &result.error {
            Some(error) => println!(
                "  {} {:<14} {} {}",
                style("✗").red(),
                result.key.as_str(),
                style(lengths).dim(),
                style(error).red()
            ),
            None if result.changed => println!(
                "  {} {:<14} {}",
                style("✓").green(),
                result.key.as_str(),
                style(lengths).dim()
            ),
            None => println!(
                "  {} {:<14} {}",
                style("·").dim(),
                result.key.as_str(),
                style("unchanged").dim()
            ),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
