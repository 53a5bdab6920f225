use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docweave::cli::commands::update::UpdateOptions;
use docweave::cli::{CommandContext, OutputFormat};

#[derive(Parser)]
#[command(name = "docweave")]
#[command(
    version,
    about = "Incremental, section-level updates of project documentation from code changes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file (skips global/project layers)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a change request to its existing document (or create one)
    Update {
        #[arg(long, short, help = "Change request (JSON, or YAML by extension)")]
        request: PathBuf,
        #[arg(long, short, help = "Write the updated document here")]
        output: Option<PathBuf>,
        #[arg(long, help = "Write the JSON update report here")]
        report: Option<PathBuf>,
        #[arg(long, help = "Generate deterministic text without a provider")]
        templated: bool,
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate a new document from a change request
    Generate {
        #[arg(long, short, help = "Change request (JSON, or YAML by extension)")]
        request: PathBuf,
        #[arg(long, short, help = "Write the generated document here")]
        output: Option<PathBuf>,
        #[arg(long, help = "Write the JSON update report here")]
        report: Option<PathBuf>,
        #[arg(long, help = "Generate deterministic text without a provider")]
        templated: bool,
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Classify and summarize the changed files of a request
    Classify {
        #[arg(long, short, help = "Change request (JSON, or YAML by extension)")]
        request: PathBuf,
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the recognized sections of a markdown document
    Sections {
        #[arg(help = "Markdown file")]
        path: PathBuf,
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mdocweave encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "docweave=debug,info"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Update {
            request,
            output,
            report,
            templated,
            format,
        } => {
            let ctx = CommandContext::load(cli.config)?;
            let rt = Runtime::new()?;
            rt.block_on(docweave::cli::commands::update::run(
                ctx,
                UpdateOptions {
                    request,
                    output,
                    report,
                    templated,
                    format,
                    generate: false,
                },
            ))?;
        }
        Commands::Generate {
            request,
            output,
            report,
            templated,
            format,
        } => {
            let ctx = CommandContext::load(cli.config)?;
            let rt = Runtime::new()?;
            rt.block_on(docweave::cli::commands::update::run(
                ctx,
                UpdateOptions {
                    request,
                    output,
                    report,
                    templated,
                    format,
                    generate: true,
                },
            ))?;
        }
        Commands::Classify { request, format } => {
            let ctx = CommandContext::load(cli.config)?;
            let rt = Runtime::new()?;
            rt.block_on(docweave::cli::commands::classify::run(ctx, &request, format))?;
        }
        Commands::Sections { path, format } => {
            docweave::cli::commands::sections::run(&path, format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                let ctx = CommandContext::load(cli.config)?;
                docweave::cli::commands::config::show(&ctx, format)?;
            }
            ConfigAction::Path => {
                docweave::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                docweave::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
