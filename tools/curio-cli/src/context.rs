//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use curio_commerce::checkout::{PaymentGateway, StubGateway};
use curio_commerce::StoreConfig;
use curio_gateway::HttpGateway;

use crate::config::CliConfig;
use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["curio.toml", ".curio.toml", "curio.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let path = cwd.join(path);
                (CliConfig::load(&path)?, Some(path))
            }
            None => match find_config(&cwd) {
                Some(path) => (CliConfig::load(&path)?, Some(path)),
                None => (CliConfig::default(), None),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Load the store configuration, falling back to defaults.
    pub fn store_config(&self) -> Result<StoreConfig> {
        match &self.config.store {
            Some(path) => {
                let path = self.resolve_path(path);
                self.output
                    .debug(&format!("Loading store config from {}", path.display()));
                StoreConfig::load(&path)
                    .with_context(|| format!("Invalid store config: {}", path.display()))
            }
            None => {
                self.output.debug("No store config set, using defaults");
                Ok(StoreConfig::default())
            }
        }
    }

    /// The payment gateway to check out against.
    pub fn gateway(&self, stub: bool) -> Result<Arc<dyn PaymentGateway>> {
        if stub {
            self.output.debug("Using in-memory stub gateway");
            return Ok(Arc::new(StubGateway::new()));
        }
        let config = self.config.gateway.to_gateway_config().context(
            "No gateway URL configured. Set [gateway].url in curio.toml or pass --stub",
        )?;
        self.output
            .debug(&format!("Using gateway at {}", config.base_url));
        Ok(Arc::new(HttpGateway::new(config)?))
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// Find a config file in the directory tree.
fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}
