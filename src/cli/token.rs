//! Token command implementation
//!
//! Loads the Streamlabs API token from Streamlabs Desktop or a browser
//! login, and manages the saved copy.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use super::{prompt, AppContext, CliError};
use crate::core::mask_token;
use crate::token::browser_login::DEFAULT_LOGIN_TIMEOUT_SECS;
use crate::token::{BrowserLoginSource, LocalStorageSource, TokenSource};

/// Arguments for the token command
#[derive(Parser, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Read the token from an installed Streamlabs Desktop
    LoadLocal {
        /// Local Storage leveldb directory to scan instead of the default
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Sign in to Streamlabs with TikTok in the browser
    Login {
        /// Browser to launch instead of the system default (e.g. "chrome")
        #[arg(long)]
        browser: Option<String>,
        /// Seconds to wait for the login to complete
        #[arg(long, default_value_t = DEFAULT_LOGIN_TIMEOUT_SECS)]
        timeout: u64,
    },
    /// Save a token you already have
    Set {
        /// Streamlabs API token
        value: String,
    },
    /// Print the saved token
    Show {
        /// Print the full token instead of a masked one
        #[arg(long)]
        reveal: bool,
    },
    /// Remove the saved token
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Run the token command
pub async fn run(ctx: &AppContext, args: TokenArgs) -> anyhow::Result<()> {
    match args.command {
        TokenCommand::LoadLocal { dir } => {
            let source = match dir {
                Some(dir) => LocalStorageSource::with_dir(dir),
                None => LocalStorageSource::new(),
            };
            load_from(ctx, &source).await
        }
        TokenCommand::Login { browser, timeout } => {
            println!("Complete the TikTok login in your browser...");
            let source = BrowserLoginSource::new()
                .with_browser(browser)
                .with_timeout(Duration::from_secs(timeout));
            load_from(ctx, &source).await
        }
        TokenCommand::Set { value } => store_token(ctx, value.trim()).await,
        TokenCommand::Show { reveal } => show_token(ctx, reveal),
        TokenCommand::Clear { yes } => clear_token(ctx, yes),
    }
}

async fn load_from(ctx: &AppContext, source: &dyn TokenSource) -> anyhow::Result<()> {
    tracing::debug!("Loading token from {}", source.name());
    let token = source
        .fetch()
        .await
        .with_context(|| format!("Failed to load token from {}", source.name()))?;

    println!("Token loaded successfully from {}.", source.name());
    store_token(ctx, &token).await
}

/// Save the token and show whose account it belongs to
async fn store_token(ctx: &AppContext, token: &str) -> anyhow::Result<()> {
    if token.is_empty() {
        anyhow::bail!("Token is empty");
    }

    let mut settings = ctx.load_settings();
    if settings.token != token {
        // A live session belongs to the previous token
        settings.live = None;
    }
    settings.token = token.to_string();
    ctx.save_settings(&settings)?;

    println!("Saved token {} to {}", mask_token(token), ctx.config_path.display());

    let client = ctx.client(&settings)?;
    match client.info().await {
        Ok(info) => {
            println!(
                "Account: {} (can go live: {})",
                info.username,
                ctx.status(&info.can_be_live.to_string(), info.can_be_live)
            );
        }
        Err(e) => tracing::warn!("Could not load account info: {}", e),
    }

    Ok(())
}

fn show_token(ctx: &AppContext, reveal: bool) -> anyhow::Result<()> {
    let settings = ctx.load_settings();
    if !settings.has_token() {
        return Err(CliError::NoToken.into());
    }

    if reveal {
        println!("{}", settings.token);
    } else {
        println!("{}", mask_token(&settings.token));
    }
    Ok(())
}

fn clear_token(ctx: &AppContext, yes: bool) -> anyhow::Result<()> {
    let mut settings = ctx.load_settings();
    if !settings.has_token() {
        println!("No token saved.");
        return Ok(());
    }

    if !yes
        && !prompt::confirm(
            "Are you sure you want to clear the token? This will require you to reload it.",
        )?
    {
        return Err(CliError::Cancelled.into());
    }

    settings.clear_token();
    ctx.save_settings(&settings)?;
    println!("Token cleared.");
    Ok(())
}
