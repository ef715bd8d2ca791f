//! Streamlabs TikTok data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label of the catch-all category appended to every search result
pub const OTHER_CATEGORY: &str = "Other";

/// Who the stream is intended for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudienceType {
    /// Everyone
    #[default]
    #[serde(rename = "0")]
    General,
    /// 18+ only
    #[serde(rename = "1")]
    Mature,
}

impl AudienceType {
    /// Form value sent to the stream start endpoint
    pub fn as_form_value(&self) -> &'static str {
        match self {
            AudienceType::General => "0",
            AudienceType::Mature => "1",
        }
    }

    /// Parse from config/CLI input
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "0" | "general" | "everyone" | "false" => Some(AudienceType::General),
            "1" | "mature" | "18+" | "true" => Some(AudienceType::Mature),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudienceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudienceType::General => write!(f, "general"),
            AudienceType::Mature => write!(f, "mature"),
        }
    }
}

/// A TikTok game category as returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub full_name: String,
    #[serde(default)]
    pub game_mask_id: String,
}

impl Category {
    /// The catch-all category with an empty mask id
    pub fn other() -> Self {
        Self {
            full_name: OTHER_CATEGORY.to_string(),
            game_mask_id: String::new(),
        }
    }
}

/// Account metadata from the info endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub username: String,
    pub application_status: String,
    pub can_be_live: bool,
}

impl AccountInfo {
    /// Build from the raw info response, tolerating missing fields
    pub fn from_json(json: &serde_json::Value) -> Self {
        let username = json
            .get("user")
            .and_then(|u| u.get("username"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();

        let application_status = json
            .get("application_status")
            .and_then(|s| s.get("status"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();

        let can_be_live = json
            .get("can_be_live")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Self {
            username,
            application_status,
            can_be_live,
        }
    }
}

/// A stream started through Streamlabs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSession {
    /// Streamlabs stream id, needed to end the stream
    pub id: String,
    /// RTMP ingest server
    pub rtmp_url: String,
    pub stream_key: String,
    pub started_at: DateTime<Utc>,
}

impl LiveSession {
    pub fn new(
        id: impl Into<String>,
        rtmp_url: impl Into<String>,
        stream_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rtmp_url: rtmp_url.into(),
            stream_key: stream_key.into(),
            started_at: Utc::now(),
        }
    }

    /// Human-readable time since the stream started
    pub fn format_elapsed(&self) -> String {
        let secs = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
            .max(0);
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        if hours > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}m", minutes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_type_serializes_as_flag_string() {
        assert_eq!(serde_json::to_string(&AudienceType::General).unwrap(), "\"0\"");
        assert_eq!(serde_json::to_string(&AudienceType::Mature).unwrap(), "\"1\"");

        let parsed: AudienceType = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(parsed, AudienceType::Mature);
    }

    #[test]
    fn test_audience_type_parse() {
        assert_eq!(AudienceType::parse("0"), Some(AudienceType::General));
        assert_eq!(AudienceType::parse("Mature"), Some(AudienceType::Mature));
        assert_eq!(AudienceType::parse(" 1 "), Some(AudienceType::Mature));
        assert_eq!(AudienceType::parse("2"), None);
    }

    #[test]
    fn test_account_info_from_json() {
        let json = serde_json::json!({
            "user": { "username": "streamer" },
            "application_status": { "status": "approved" },
            "can_be_live": true
        });

        let info = AccountInfo::from_json(&json);
        assert_eq!(info.username, "streamer");
        assert_eq!(info.application_status, "approved");
        assert!(info.can_be_live);
    }

    #[test]
    fn test_account_info_defaults() {
        let info = AccountInfo::from_json(&serde_json::json!({}));
        assert_eq!(info.username, "Unknown");
        assert_eq!(info.application_status, "Unknown");
        assert!(!info.can_be_live);
    }

    #[test]
    fn test_category_missing_mask_id() {
        let cat: Category = serde_json::from_str(r#"{"full_name":"Minecraft"}"#).unwrap();
        assert_eq!(cat.full_name, "Minecraft");
        assert!(cat.game_mask_id.is_empty());
    }

    #[test]
    fn test_live_session_elapsed() {
        let mut session = LiveSession::new("1", "rtmp://example", "key");
        session.started_at = Utc::now() - chrono::Duration::minutes(75);
        assert_eq!(session.format_elapsed(), "1h 15m");
    }
}
