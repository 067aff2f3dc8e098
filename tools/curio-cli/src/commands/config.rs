//! Configuration management commands.

use anyhow::{bail, Result};
use curio_commerce::StoreConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;
use crate::output::format_rate;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let store = ctx.store_config()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "cli": ctx.config,
            "store": store,
        }));
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    ctx.output.info("");
    ctx.output.info("[gateway]");
    ctx.output.kv(
        "url",
        ctx.config.gateway.url.as_deref().unwrap_or("(not set)"),
    );
    ctx.output.kv("api_key_env", &ctx.config.gateway.api_key_env);
    ctx.output
        .kv("timeout_secs", &ctx.config.gateway.timeout_secs.to_string());

    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("currency", store.currency.code());
    ctx.output.kv(
        "home_country",
        store
            .home_country
            .as_deref()
            .unwrap_or(&store.shipping.home_country),
    );
    ctx.output
        .kv("default_unit_weight", &store.default_unit_weight.to_string());

    ctx.output.info("");
    ctx.output.info("Shipping tiers:");
    for tier in &store.shipping.tiers {
        ctx.output.kv(tier.id.as_str(), &tier.label);
    }

    ctx.output.info("");
    ctx.output.info("Tax nexus:");
    if store.tax.jurisdictions.is_empty() {
        ctx.output.kv("(none)", "no sales tax collected");
    }
    for (region, rules) in &store.tax.jurisdictions {
        ctx.output.kv(region, &format_rate(rules.default_rate));
    }

    ctx.output.info("");
    ctx.output
        .kv("launches", &store.launches.len().to_string());

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let cli_path = ctx.cwd.join("curio.toml");
    let store_path = ctx.cwd.join("store.toml");

    for path in [&cli_path, &store_path] {
        if path.exists() && !force {
            bail!(
                "{} already exists. Use --force to overwrite.",
                path.display()
            );
        }
    }

    std::fs::write(&cli_path, generate_default_config())?;
    std::fs::write(&store_path, StoreConfig::default().to_toml_string()?)?;

    ctx.output.success("Created curio.toml and store.toml");
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    let store = ctx.store_config()?;
    store.validate()?;

    if ctx.config.gateway.url.is_none() {
        ctx.output
            .warn("No gateway URL set; only `checkout --stub` will work");
    } else if std::env::var(&ctx.config.gateway.api_key_env).is_err() {
        ctx.output.warn(&format!(
            "{} is not set; requests will be sent without an API key",
            ctx.config.gateway.api_key_env
        ));
    }

    ctx.output.success("Configuration is valid");
    Ok(())
}
