//! StreamKey - TikTok LIVE stream keys through the Streamlabs API
//!
//! Loads the Streamlabs token from Streamlabs Desktop or a browser login,
//! then starts and ends TikTok LIVE streams and prints the RTMP URL and
//! stream key for use in OBS.

mod cli;
mod core;
mod logging;
mod settings;
mod streamlabs;
mod token;
mod updater;

use clap::Parser;
use cli::{exit_codes, AppContext, Cli, CliError, Commands};
use settings::SettingsError;
use streamlabs::StreamlabsError;
use token::TokenError;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = logging::init(cli.verbose, cli.json_output, cli.log_level.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        return exit_codes::UNEXPECTED_FAILURE;
    }

    let ctx = match AppContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::UNEXPECTED_FAILURE;
        }
    };
    tracing::debug!("Using config {}", ctx.config_path.display());

    // Create tokio runtime for async commands
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {}", e);
            return exit_codes::UNEXPECTED_FAILURE;
        }
    };

    let command = cli.command;
    let result = rt.block_on(async {
        match command {
            Some(Commands::Token(args)) => cli::token::run(&ctx, args).await,
            Some(Commands::Info(args)) => cli::info::run(&ctx, args).await,
            Some(Commands::Search(args)) => cli::search::run(&ctx, args).await,
            Some(Commands::Start(args)) => cli::live::run_start(&ctx, args).await,
            Some(Commands::End(args)) => cli::live::run_end(&ctx, args).await,
            Some(Commands::Config(args)) => cli::config::run(&ctx, args),
            Some(Commands::Update) => cli::run_update().await,
            Some(Commands::Monitor) => cli::run_monitor(),
            None => cli::info::run(&ctx, cli::info::InfoArgs::default()).await,
        }
    });

    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            categorize_error(&e)
        }
    }
}

/// Categorize an error into the appropriate exit code
fn categorize_error(e: &anyhow::Error) -> i32 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<StreamlabsError>() {
            match err {
                StreamlabsError::Unauthorized(_) | StreamlabsError::InvalidToken(_) => {
                    return exit_codes::AUTH_REQUIRED
                }
                StreamlabsError::Parse(_) | StreamlabsError::MissingField(_) => {
                    return exit_codes::PARSE_ERROR
                }
                StreamlabsError::Timeout => return exit_codes::TIMEOUT,
                _ => {}
            }
        }
        if let Some(err) = cause.downcast_ref::<TokenError>() {
            match err {
                TokenError::TokenNotFound
                | TokenError::NoStorageFiles(_)
                | TokenError::UnsupportedPlatform => return exit_codes::AUTH_REQUIRED,
                TokenError::LoginTimedOut(_) => return exit_codes::TIMEOUT,
                _ => {}
            }
        }
        if let Some(CliError::NoToken) = cause.downcast_ref::<CliError>() {
            return exit_codes::AUTH_REQUIRED;
        }
        if let Some(SettingsError::Parse { .. }) = cause.downcast_ref::<SettingsError>() {
            return exit_codes::PARSE_ERROR;
        }
    }
    exit_codes::UNEXPECTED_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_categorize_error() {
        let auth: anyhow::Error = StreamlabsError::Unauthorized(401).into();
        assert_eq!(categorize_error(&auth), exit_codes::AUTH_REQUIRED);

        let no_token: anyhow::Error = CliError::NoToken.into();
        assert_eq!(categorize_error(&no_token), exit_codes::AUTH_REQUIRED);

        let parse: anyhow::Error = StreamlabsError::MissingField("key").into();
        assert_eq!(categorize_error(&parse), exit_codes::PARSE_ERROR);

        let timeout: anyhow::Error = TokenError::LoginTimedOut(300).into();
        assert_eq!(categorize_error(&timeout), exit_codes::TIMEOUT);

        let other = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&other), exit_codes::UNEXPECTED_FAILURE);
    }

    #[test]
    fn test_categorize_looks_through_context() {
        let wrapped = Err::<(), _>(StreamlabsError::Timeout)
            .context("Failed to start stream")
            .unwrap_err();
        assert_eq!(categorize_error(&wrapped), exit_codes::TIMEOUT);
    }
}
