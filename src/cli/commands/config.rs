//! Config Command
//!
//! Manage docweave configuration.
//!
//! Usage:
//!   docweave config show [-f json]
//!   docweave config path
//!   docweave config init [-g] [--force]

use crate::cli::Output;
use crate::cli::util::{CommandContext, OutputFormat};
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the effective configuration
pub fn show(ctx: &CommandContext, format: OutputFormat) -> Result<()> {
    if !format.is_json() {
        match &ctx.config_path {
            Some(path) => println!("# Config: {}\n", path.display()),
            None => println!("# Effective config (defaults, global, project, env)\n"),
        }
    }
    println!("{}", ConfigLoader::render(&ctx.config, format.is_json())?);
    Ok(())
}

/// Show configuration file paths
pub fn path() -> Result<()> {
    let out = Output::new();
    for layer in ConfigLoader::paths() {
        match &layer.path {
            Some(path) if layer.exists() => {
                out.success(&format!("{:<8} {}", layer.label, path.display()))
            }
            Some(path) => out.info(&format!("{:<8} {} (not found)", layer.label, path.display())),
            None => out.warning(&format!("{:<8} cannot determine location", layer.label)),
        }
    }
    out.info("Environment: DOCWEAVE_<SECTION>__<KEY>");
    Ok(())
}

/// Write a default configuration file
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };
    Output::new().success(&format!("Configuration ready at {}", path.display()));
    Ok(())
}
