//! CLI command implementations.

pub mod checkout;
pub mod config;
pub mod launches;
pub mod quote;

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    /// Order file (TOML or JSON) with items and addresses.
    pub order: PathBuf,
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Order file (TOML or JSON) with items, email and addresses.
    pub order: PathBuf,

    /// Payment token from the payment form.
    #[arg(short, long)]
    pub token: String,

    /// Shipping tier to use (default: cheapest).
    #[arg(long)]
    pub tier: Option<String>,

    /// Use the in-memory gateway instead of the configured one.
    #[arg(long)]
    pub stub: bool,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the launches command.
#[derive(Args)]
pub struct LaunchesArgs {
    /// Keep running and report launches as they go live.
    #[arg(short, long)]
    pub watch: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Write curio.toml and store.toml in the current directory.
    Init {
        /// Force overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the store configuration.
    Validate,
}
