//! Info command implementation

use clap::Args;
use serde::Serialize;

use super::AppContext;
use crate::core::{mask_token, AccountInfo};
use crate::settings::Settings;

/// Arguments for the info command
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// JSON output payload
#[derive(Debug, Serialize)]
struct InfoPayload<'a> {
    account: &'a AccountInfo,
    title: &'a str,
    game: &'a str,
    audience_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    live_since: Option<String>,
}

/// Run the info command
pub async fn run(ctx: &AppContext, args: InfoArgs) -> anyhow::Result<()> {
    let settings = ctx.load_settings();
    let client = ctx.client(&settings)?;

    let info = client.info().await?;
    tracing::debug!("Account info: {:?}", info);

    if args.json {
        let payload = InfoPayload {
            account: &info,
            title: &settings.title,
            game: &settings.game,
            audience_type: settings.audience_type.to_string(),
            live_since: settings.live.as_ref().map(|l| l.started_at.to_rfc3339()),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", render_text(ctx, &info, &settings));
    }

    Ok(())
}

/// Render account and stream setup as text
pub fn render_text(ctx: &AppContext, info: &AccountInfo, settings: &Settings) -> String {
    let mut lines = Vec::new();

    lines.push(ctx.bold("Account"));
    lines.push(format!("  Username:    {}", info.username));
    lines.push(format!("  Application: {}", info.application_status));
    lines.push(format!(
        "  Can go live: {}",
        ctx.status(&info.can_be_live.to_string(), info.can_be_live)
    ));
    lines.push(format!("  Token:       {}", mask_token(&settings.token)));

    lines.push(String::new());
    lines.push(ctx.bold("Stream setup"));
    lines.push(format!("  Title:       {}", display_or_unset(&settings.title)));
    lines.push(format!("  Category:    {}", display_or_unset(&settings.game)));
    lines.push(format!("  Audience:    {}", settings.audience_type));

    if let Some(ref live) = settings.live {
        lines.push(String::new());
        lines.push(ctx.bold("Live"));
        lines.push(format!("  Stream id:   {} (live for {})", live.id, live.format_elapsed()));
        lines.push(format!("  Server URL:  {}", live.rtmp_url));
    }

    lines.join("\n")
}

fn display_or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "(not set)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AudienceType, LiveSession};
    use std::path::PathBuf;

    fn plain_ctx() -> AppContext {
        AppContext {
            config_path: PathBuf::from("config.json"),
            api_base: String::new(),
            use_color: false,
        }
    }

    #[test]
    fn test_render_text() {
        let info = AccountInfo {
            username: "streamer".to_string(),
            application_status: "approved".to_string(),
            can_be_live: true,
        };
        let settings = Settings {
            title: "Speedrun".to_string(),
            audience_type: AudienceType::Mature,
            token: "0123456789abcdef".to_string(),
            live: Some(LiveSession::new("77", "rtmp://ingest", "secret")),
            ..Default::default()
        };

        let text = render_text(&plain_ctx(), &info, &settings);
        assert!(text.contains("Username:    streamer"));
        assert!(text.contains("Can go live: true"));
        assert!(text.contains("Token:       0123...cdef"));
        assert!(text.contains("Category:    (not set)"));
        assert!(text.contains("Audience:    mature"));
        assert!(text.contains("Stream id:   77"));
        assert!(!text.contains("secret"));
    }
}
