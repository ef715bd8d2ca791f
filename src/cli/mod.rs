//! CLI module - command-line interface
//!
//! - `streamkey` - defaults to the info command
//! - `streamkey token ...` - load, set, show or clear the Streamlabs token
//! - `streamkey search <game>` - look up TikTok categories
//! - `streamkey start` / `streamkey end` - go live and stop
//! - `streamkey config ...` - inspect and edit the saved configuration

pub mod config;
pub mod info;
pub mod live;
pub mod prompt;
pub mod search;
pub mod token;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::settings::Settings;
use crate::streamlabs::{StreamlabsClient, API_BASE};

/// Exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNEXPECTED_FAILURE: i32 = 1;
    pub const AUTH_REQUIRED: i32 = 2;
    pub const PARSE_ERROR: i32 = 3;
    pub const TIMEOUT: i32 = 4;
}

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("STREAMKEY_GIT_VERSION"),
    ", built ",
    env!("STREAMKEY_BUILD_DATE"),
    ")"
);

/// Errors raised by the command layer itself
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No API token configured. Run 'streamkey token load-local' or 'streamkey token login' first.")]
    NoToken,

    #[error("No live stream recorded. Pass --id to end a stream started elsewhere.")]
    NoActiveStream,

    #[error("Cancelled")]
    Cancelled,
}

/// StreamKey - TikTok LIVE stream keys through Streamlabs
///
/// Loads your Streamlabs token, starts a TikTok LIVE and prints the RTMP
/// URL and stream key for OBS. Defaults to the info command when no
/// subcommand is given.
#[derive(Parser, Debug)]
#[command(name = "streamkey")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit machine-readable logs (JSON) to stderr
    #[arg(long = "json-output", global = true)]
    pub json_output: bool,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", global = true, value_parser = ["trace", "verbose", "debug", "info", "warning", "warn", "error", "critical"])]
    pub log_level: Option<String>,

    /// Disable ANSI colors in output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "STREAMKEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Streamlabs TikTok API base URL
    #[arg(long = "api-base", global = true, env = "STREAMKEY_API_BASE", default_value = API_BASE, hide = true)]
    pub api_base: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, set, show or clear the Streamlabs API token
    Token(token::TokenArgs),

    /// Show account info and whether it can go live (default command)
    Info(info::InfoArgs),

    /// Search TikTok categories
    Search(search::SearchArgs),

    /// Start a TikTok LIVE and print the RTMP URL and stream key
    Start(live::StartArgs),

    /// End the TikTok LIVE started with `start`
    End(live::EndArgs),

    /// Inspect and edit the saved configuration
    Config(config::ConfigArgs),

    /// Check for a newer release
    Update,

    /// Open TikTok LIVE Center's stream monitor in the browser
    Monitor,
}

/// Shared state handed to every command
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config_path: PathBuf,
    pub api_base: String,
    pub use_color: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = Settings::resolve_path(cli.config.as_deref())?;
        Ok(Self {
            config_path,
            api_base: cli.api_base.clone(),
            use_color: !cli.no_color && is_terminal(),
        })
    }

    pub fn load_settings(&self) -> Settings {
        Settings::load(&self.config_path)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        settings.save_to(&self.config_path)?;
        Ok(())
    }

    /// API client for the saved token
    pub fn client(&self, settings: &Settings) -> anyhow::Result<StreamlabsClient> {
        if !settings.has_token() {
            return Err(CliError::NoToken.into());
        }
        Ok(StreamlabsClient::with_base_url(&settings.token, &self.api_base)?)
    }

    /// Bold text when colors are enabled
    pub fn bold(&self, text: &str) -> String {
        if self.use_color {
            format!("\x1b[1m{}\x1b[0m", text)
        } else {
            text.to_string()
        }
    }

    /// Green for good news, red otherwise
    pub fn status(&self, text: &str, ok: bool) -> String {
        if !self.use_color {
            return text.to_string();
        }
        let color = if ok { "\x1b[32m" } else { "\x1b[31m" };
        format!("{}{}\x1b[0m", color, text)
    }
}

/// Check if stdout is a terminal
fn is_terminal() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}

/// Run the update check
pub async fn run_update() -> anyhow::Result<()> {
    match crate::updater::check_for_updates().await {
        Some(update) => {
            println!(
                "Version {} is available (current: {}).",
                update.version,
                crate::updater::current_version()
            );
            println!("Download: {}", update.release_url);
            if !update.release_notes.trim().is_empty() {
                println!();
                println!("{}", update.release_notes.trim());
            }
        }
        None => println!(
            "StreamKey {} is up to date.",
            crate::updater::current_version()
        ),
    }
    Ok(())
}

/// TikTok LIVE Center stream monitor
pub const LIVE_MONITOR_URL: &str = "https://livecenter.tiktok.com/live_monitor?lang=en-US";

/// Open the LIVE Center monitor
pub fn run_monitor() -> anyhow::Result<()> {
    open::that(LIVE_MONITOR_URL)
        .map_err(|e| anyhow::anyhow!("Could not open {}: {}", LIVE_MONITOR_URL, e))?;
    println!("Opened {}", LIVE_MONITOR_URL);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["streamkey"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.api_base, API_BASE);
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["streamkey", "info", "--config", "/tmp/sk.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/sk.json")));
        assert!(matches!(cli.command, Some(Commands::Info(_))));
    }

    #[test]
    fn test_client_requires_token() {
        let ctx = AppContext {
            config_path: PathBuf::from("config.json"),
            api_base: API_BASE.to_string(),
            use_color: false,
        };
        let err = ctx.client(&Settings::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::NoToken)));
    }

    #[test]
    fn test_long_version_names_git_build() {
        assert!(LONG_VERSION.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(LONG_VERSION.contains(env!("STREAMKEY_GIT_VERSION")));
    }

    #[test]
    fn test_plain_output_without_color() {
        let ctx = AppContext {
            config_path: PathBuf::from("config.json"),
            api_base: API_BASE.to_string(),
            use_color: false,
        };
        assert_eq!(ctx.bold("x"), "x");
        assert_eq!(ctx.status("yes", true), "yes");
    }
}
