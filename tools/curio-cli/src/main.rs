//! Curio CLI - Command line tool for the Curio checkout.
//!
//! Commands:
//! - `curio quote` - Price an order for every shipping tier
//! - `curio checkout` - Place an order and capture payment
//! - `curio launches` - Show or watch scheduled product launches
//! - `curio config` - Manage configuration

mod commands;
mod config;
mod context;
mod order;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::{CheckoutArgs, ConfigArgs, LaunchesArgs, QuoteArgs};

/// Curio CLI - Quote and run storefront checkouts
#[derive(Parser)]
#[command(name = "curio")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an order for every shipping tier
    Quote(QuoteArgs),

    /// Place an order and capture payment
    Checkout(CheckoutArgs),

    /// Show scheduled product launches
    Launches(LaunchesArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "curio_cli=debug,curio_commerce=debug,curio_gateway=debug"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Quote(args) => commands::quote::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Launches(args) => commands::launches::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
