//! Start and end commands

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use super::{prompt, AppContext, CliError};
use crate::core::{AudienceType, LiveSession};
use crate::settings::Settings;
use crate::streamlabs::{StreamlabsClient, StreamlabsError};

/// Arguments for the start command
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Stream title (defaults to the saved title)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Category name as shown by `search` (defaults to the saved category)
    #[arg(short, long)]
    pub game: Option<String>,

    /// Restrict the stream to mature (18+) audiences
    #[arg(long, conflicts_with = "general")]
    pub mature: bool,

    /// Make the stream available to everyone
    #[arg(long)]
    pub general: bool,

    /// Copy the stream key to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Do not save title/category/audience changes to the config
    #[arg(long = "no-save")]
    pub no_save: bool,
}

/// Arguments for the end command
#[derive(Args, Debug, Default)]
pub struct EndArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// End this stream id instead of the one recorded by `start`
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
struct StartPayload<'a> {
    id: &'a str,
    rtmp_url: &'a str,
    stream_key: &'a str,
}

/// Apply command-line overrides to the saved stream setup
fn apply_overrides(settings: &mut Settings, args: &StartArgs) {
    if let Some(ref title) = args.title {
        settings.title = title.clone();
    }
    if let Some(ref game) = args.game {
        settings.game = game.clone();
    }
    if args.mature {
        settings.audience_type = AudienceType::Mature;
    } else if args.general {
        settings.audience_type = AudienceType::General;
    }
}

/// Game mask id for the configured category, empty when unknown
async fn resolve_category(client: &StreamlabsClient, game: &str) -> String {
    if game.trim().is_empty() {
        return String::new();
    }
    match client.resolve_category(game).await {
        Ok(id) => {
            if id.is_empty() {
                tracing::warn!("Category '{}' not found; streaming as Other", game);
            }
            id
        }
        Err(e) => {
            tracing::warn!("Category search failed ({}); streaming as Other", e);
            String::new()
        }
    }
}

/// Run the start command
pub async fn run_start(ctx: &AppContext, args: StartArgs) -> anyhow::Result<()> {
    let mut settings = ctx.load_settings();
    apply_overrides(&mut settings, &args);

    if settings.title.trim().is_empty() {
        anyhow::bail!("Please enter a stream title before going live (--title or 'config set title').");
    }

    if let Some(ref live) = settings.live {
        anyhow::bail!(
            "Stream {} is already live (started {} ago). Run 'streamkey end' first.",
            live.id,
            live.format_elapsed()
        );
    }

    if !args.no_save {
        ctx.save_settings(&settings)?;
    }

    let client = ctx.client(&settings)?;

    match client.info().await {
        Ok(info) if !info.can_be_live => {
            anyhow::bail!(
                "Account {} cannot go live yet (application status: {}).",
                info.username,
                info.application_status
            );
        }
        Ok(_) => {}
        Err(e @ StreamlabsError::Unauthorized(_)) => return Err(e.into()),
        Err(e) => tracing::warn!("Could not check account status: {}", e),
    }

    let category = resolve_category(&client, &settings.game).await;

    let session = client
        .start(settings.title.trim(), &category, settings.audience_type)
        .await
        .context("Failed to start stream")?;

    record_live_session(ctx, &args, settings, session.clone())?;

    if args.copy {
        copy_to_clipboard(&session.stream_key);
    }

    if args.json {
        let payload = StartPayload {
            id: &session.id,
            rtmp_url: &session.rtmp_url,
            stream_key: &session.stream_key,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", ctx.status("Stream started successfully!", true));
        println!();
        println!("  Server URL: {}", session.rtmp_url);
        println!("  Stream Key: {}", session.stream_key);
        println!();
        println!("Use these in OBS Studio. Run 'streamkey end' when you are done.");
    }

    Ok(())
}

/// Persist the live session so a later `end` can find it
fn record_live_session(
    ctx: &AppContext,
    args: &StartArgs,
    settings: Settings,
    session: LiveSession,
) -> anyhow::Result<()> {
    // With --no-save only the live session reaches the file
    let mut to_save = if args.no_save {
        ctx.load_settings()
    } else {
        settings
    };
    to_save.live = Some(session);
    ctx.save_settings(&to_save)
}

fn copy_to_clipboard(text: &str) {
    let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
    match result {
        Ok(()) => println!("Stream key copied to clipboard."),
        Err(e) => tracing::warn!("Could not copy to clipboard: {}", e),
    }
}

/// Run the end command
pub async fn run_end(ctx: &AppContext, args: EndArgs) -> anyhow::Result<()> {
    let mut settings = ctx.load_settings();

    let stream_id = match (&args.id, &settings.live) {
        (Some(id), _) => id.clone(),
        (None, Some(live)) => live.id.clone(),
        (None, None) => return Err(CliError::NoActiveStream.into()),
    };

    if !args.yes && !prompt::confirm("Are you sure you want to end the live stream?")? {
        return Err(CliError::Cancelled.into());
    }

    let client = ctx.client(&settings)?;
    let ended = client
        .end(&stream_id)
        .await
        .context("Failed to end stream")?;

    if !ended {
        anyhow::bail!("Streamlabs did not confirm that stream {} ended. Please try again.", stream_id);
    }

    if settings.live.as_ref().is_some_and(|l| l.id == stream_id) {
        settings.live = None;
        ctx.save_settings(&settings)?;
    }

    println!("{}", ctx.status("Stream ended successfully!", true));
    Ok(())
}
