//! Config command implementation
//!
//! Utilities for validating, inspecting and editing the saved configuration.

use clap::{Parser, Subcommand};

use super::AppContext;
use crate::settings::Settings;

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the configuration with secrets masked
    Show {
        /// Output format: json or toml
        #[arg(short, long, default_value = "json")]
        format: String,
    },
    /// Show the configuration file path
    Path,
    /// Check that the configuration file parses
    Validate,
    /// Change a stream setting (title, game, audience_type)
    Set {
        key: String,
        value: String,
    },
}

/// Run the config command
pub fn run(ctx: &AppContext, args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { format } => println!("{}", render(&ctx.load_settings(), &format)?),
        ConfigCommand::Path => show_path(ctx),
        ConfigCommand::Validate => validate(ctx)?,
        ConfigCommand::Set { key, value } => set(ctx, &key, &value)?,
    }
    Ok(())
}

/// Serialize the redacted settings in the requested format
fn render(settings: &Settings, format: &str) -> anyhow::Result<String> {
    let redacted = settings.redacted();
    match format.to_lowercase().as_str() {
        "json" => Ok(serde_json::to_string_pretty(&redacted)?),
        "toml" => Ok(toml::to_string_pretty(&redacted)?),
        _ => anyhow::bail!("Unknown format '{}'. Supported formats: json, toml", format),
    }
}

fn show_path(ctx: &AppContext) {
    let exists = if ctx.config_path.exists() {
        ""
    } else {
        " (not found)"
    };
    println!("{}{}", ctx.config_path.display(), exists);
}

fn validate(ctx: &AppContext) -> anyhow::Result<()> {
    print!("Checking {}... ", ctx.config_path.display());

    if !ctx.config_path.exists() {
        println!("NOT FOUND (using defaults)");
        return Ok(());
    }

    match Settings::load_from(&ctx.config_path) {
        Ok(settings) => {
            println!("OK");
            if !settings.has_token() {
                println!("  Warning: no API token saved");
            }
            if settings.title.trim().is_empty() {
                println!("  Warning: no stream title saved");
            }
            Ok(())
        }
        Err(e) => {
            println!("INVALID");
            Err(e.into())
        }
    }
}

fn set(ctx: &AppContext, key: &str, value: &str) -> anyhow::Result<()> {
    let mut settings = ctx.load_settings();
    settings.set_field(key, value)?;
    ctx.save_settings(&settings)?;
    println!("Set {} = {}", key, value);
    Ok(())
}
