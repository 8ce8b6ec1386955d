use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use complyflow::cli::CommandContext;
use complyflow::cli::commands::analyze::AnalyzeOptions;
use complyflow::cli::ui::Output;
use complyflow::constants::storage::RECENT_RUNS_LIMIT;

#[derive(Parser)]
#[command(name = "complyflow")]
#[command(
    version,
    about = "Compliance review orchestrator for law-finder and risk-evaluator agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Project config file (default: .complyflow/config.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize complyflow in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Run the HTTP API
    Serve {
        #[arg(long, help = "Bind address override")]
        host: Option<String>,
        #[arg(long, short, help = "Port override")]
        port: Option<u16>,
    },

    /// Review one feature from the terminal
    Analyze {
        #[arg(long, short, help = "Feature title")]
        title: String,
        #[arg(long, short, help = "Feature description")]
        description: String,
        #[arg(long = "region", short, help = "Region to check (repeatable)")]
        regions: Vec<String>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
        #[arg(long, help = "Do not record the run in the database")]
        no_persist: bool,
    },

    /// List recent runs
    Runs {
        #[arg(short = 'n', long, default_value_t = RECENT_RUNS_LIMIT, help = "Maximum runs to list")]
        limit: usize,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
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

        eprintln!("\n{}", console::style("━━━ PANIC ━━━").red().bold());
        eprintln!(
            "{}",
            console::style("complyflow encountered an unexpected error:").red()
        );
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "{}",
                console::style(format!(
                    "Location: {}:{}:{}",
                    location.file(),
                    location.line(),
                    location.column()
                ))
                .dim()
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
            Output::new().error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
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

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => {
            complyflow::cli::commands::init::run(force)?;
        }
        Commands::Serve { host, port } => {
            let ctx = CommandContext::load(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(complyflow::cli::commands::serve::run(&ctx, host, port))?;
        }
        Commands::Analyze {
            title,
            description,
            regions,
            format,
            no_persist,
        } => {
            let ctx = CommandContext::load(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(complyflow::cli::commands::analyze::run(
                &ctx,
                AnalyzeOptions {
                    title,
                    description,
                    regions,
                    format,
                    no_persist,
                },
            ))?;
        }
        Commands::Runs { limit, format } => {
            let ctx = CommandContext::load(config_path)?;
            complyflow::cli::commands::runs::run(&ctx, limit, &format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                let ctx = CommandContext::load(config_path)?;
                complyflow::cli::commands::config::show(&ctx, &format)?;
            }
            ConfigAction::Path => {
                complyflow::cli::commands::config::path()?;
            }
        },
    }

    Ok(())
}
