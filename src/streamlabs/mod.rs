//! Streamlabs TikTok API client
//!
//! Talks to the endpoints Streamlabs Desktop uses for TikTok LIVE:
//! account info, category search, and stream start/end.
//! Authenticates with the Streamlabs API token as a Bearer header.

mod retry;

pub use retry::RetryPolicy;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use std::time::Duration;
use thiserror::Error;

use crate::core::{AccountInfo, AudienceType, Category, LiveSession};

pub const API_BASE: &str = "https://streamlabs.com/api/v5/slobs/tiktok";

/// Streamlabs rejects requests that do not look like its desktop client
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) StreamlabsDesktop/1.17.0 Chrome/122.0.6261.156 Electron/29.3.1 Safari/537.36";

/// Longer category names make the search endpoint answer 500
pub const MAX_CATEGORY_QUERY_CHARS: usize = 25;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const START_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors returned by the Streamlabs API client
#[derive(Debug, Error)]
pub enum StreamlabsError {
    #[error("Token rejected by Streamlabs (HTTP {0}); load a fresh token")]
    Unauthorized(u16),

    #[error("Streamlabs API error: HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Response is missing field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<reqwest::Error> for StreamlabsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StreamlabsError::Timeout
        } else {
            StreamlabsError::Network(err)
        }
    }
}

/// Client for the Streamlabs TikTok endpoints
#[derive(Debug)]
pub struct StreamlabsClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl StreamlabsClient {
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, StreamlabsError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(StreamlabsError::InvalidToken("token is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DESKTOP_USER_AGENT));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| StreamlabsError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    #[cfg(test)]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch account metadata (username, application status, live permission)
    pub async fn info(&self) -> Result<AccountInfo, StreamlabsError> {
        let url = format!("{}/info", self.base_url);
        let json = self.get_json(&url, &[]).await?;
        Ok(AccountInfo::from_json(&json))
    }

    /// Search TikTok categories by name
    ///
    /// The catch-all "Other" category is always appended to a successful result.
    /// An empty query returns an empty list without touching the network.
    pub async fn search(&self, game: &str) -> Result<Vec<Category>, StreamlabsError> {
        if game.is_empty() {
            return Ok(Vec::new());
        }

        let query = truncate_category_query(game);
        let url = format!("{}/info", self.base_url);
        let json = self.get_json(&url, &[("category", query.as_str())]).await?;

        let raw = json
            .get("categories")
            .cloned()
            .ok_or(StreamlabsError::MissingField("categories"))?;
        let mut categories: Vec<Category> =
            serde_json::from_value(raw).map_err(|e| StreamlabsError::Parse(e.to_string()))?;
        categories.push(Category::other());

        tracing::debug!("Category search '{}' returned {} entries", query, categories.len());
        Ok(categories)
    }

    /// Resolve a category name to its game mask id
    ///
    /// Returns an empty id when no category matches the name exactly,
    /// which Streamlabs treats as "Other".
    pub async fn resolve_category(&self, game: &str) -> Result<String, StreamlabsError> {
        let categories = self.search(game).await?;
        Ok(find_mask_id(&categories, game))
    }

    /// Start a TikTok LIVE stream and return its ingest URL and key
    pub async fn start(
        &self,
        title: &str,
        category: &str,
        audience: AudienceType,
    ) -> Result<LiveSession, StreamlabsError> {
        let url = format!("{}/stream/start", self.base_url);
        let form = reqwest::multipart::Form::new()
            .text("title", title.to_string())
            .text("device_platform", "win32")
            .text("category", category.to_string())
            .text("audience_type", audience.as_form_value());

        tracing::debug!("POST {}", url);
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(START_TIMEOUT)
            .send()
            .await?;
        let json = Self::read_json(resp).await?;

        let id = json
            .get("id")
            .and_then(json_id)
            .ok_or(StreamlabsError::MissingField("id"))?;
        let rtmp = json
            .get("rtmp")
            .and_then(|v| v.as_str())
            .ok_or(StreamlabsError::MissingField("rtmp"))?;
        let key = json
            .get("key")
            .and_then(|v| v.as_str())
            .ok_or(StreamlabsError::MissingField("key"))?;

        tracing::info!("Stream {} started", id);
        Ok(LiveSession::new(id, rtmp, key))
    }

    /// End a stream previously started with [`start`](Self::start)
    ///
    /// Returns the `success` flag reported by Streamlabs.
    pub async fn end(&self, stream_id: &str) -> Result<bool, StreamlabsError> {
        let url = format!("{}/stream/{}/end", self.base_url, stream_id);

        tracing::debug!("POST {}", url);
        let resp = self.http.post(&url).send().await?;
        let json = Self::read_json(resp).await?;

        Ok(json.get("success").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// GET with retries on transient failures
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, StreamlabsError> {
        let mut attempt = 0;
        loop {
            tracing::debug!("GET {} (attempt {})", url, attempt + 1);
            let result = self.http.get(url).query(query).send().await;
            let can_retry = attempt < self.retry.max_retries;

            match result {
                Ok(resp) if can_retry && self.retry.should_retry_status(resp.status().as_u16()) => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        "GET {} returned {}, retrying in {:?}",
                        url,
                        resp.status(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(resp) => return Self::read_json(resp).await,
                Err(e) if can_retry && self.retry.should_retry_error(&e) => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!("GET {} failed ({}), retrying in {:?}", url, e, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, StreamlabsError> {
        let status = resp.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(StreamlabsError::Unauthorized(status.as_u16()));
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(StreamlabsError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| StreamlabsError::Parse(e.to_string()))
    }
}

/// Limit a category query to what the search endpoint accepts
pub fn truncate_category_query(game: &str) -> String {
    game.chars().take(MAX_CATEGORY_QUERY_CHARS).collect()
}

/// Mask id of the category named exactly `game`, or empty
pub fn find_mask_id(categories: &[Category], game: &str) -> String {
    categories
        .iter()
        .find(|c| c.full_name == game)
        .map(|c| c.game_mask_id.clone())
        .unwrap_or_default()
}

/// Stream ids come back as strings or numbers
fn json_id(v: &serde_json::Value) -> Option<String> {
    v.as_str()
        .map(|s| s.to_string())
        .or_else(|| v.as_i64().map(|n| n.to_string()))
        .or_else(|| v.as_u64().map(|n| n.to_string()))
}
