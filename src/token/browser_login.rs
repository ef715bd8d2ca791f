//! Streamlabs browser login
//!
//! Implements the login Streamlabs Desktop performs for TikTok accounts:
//! the user signs in through the browser while we poll Streamlabs with a
//! PKCE code verifier until the OAuth token for that verifier is issued.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use super::{TokenError, TokenSource};

const LOGIN_URL: &str = "https://streamlabs.com/m/login";
const AUTH_DATA_URL: &str = "https://streamlabs.com/api/v5/slobs/auth/data";

pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 300;
const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// PKCE verifier/challenge pair
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Random 64-byte verifier, base64url encoded
    pub fn generate() -> Self {
        let mut bytes = [0u8; 64];
        rand::rng().fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = Self::challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// S256 challenge: base64url(sha256(verifier)) without padding
    pub fn challenge_for(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

/// Browser login against streamlabs.com
pub struct BrowserLoginSource {
    client: reqwest::Client,
    login_url: String,
    auth_data_url: String,
    /// Browser binary to launch instead of the system default
    browser: Option<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl BrowserLoginSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            login_url: LOGIN_URL.to_string(),
            auth_data_url: AUTH_DATA_URL.to_string(),
            browser: None,
            timeout: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_browser(mut self, browser: Option<String>) -> Self {
        self.browser = browser.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(test)]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[cfg(test)]
    pub fn with_auth_data_url(mut self, url: impl Into<String>) -> Self {
        self.auth_data_url = url.into();
        self
    }

    /// Login page URL for a PKCE challenge
    pub fn authorize_url(&self, challenge: &str) -> Result<String, TokenError> {
        let mut url = url::Url::parse(&self.login_url)
            .map_err(|e| TokenError::LoginFailed(format!("invalid login URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("force_verify", "1")
            .append_pair("external", "mobile")
            .append_pair("skip_splash", "1")
            .append_key_only("tiktok")
            .append_pair("code_challenge", challenge);
        Ok(url.to_string())
    }

    fn open_browser(&self, url: &str) -> Result<(), TokenError> {
        let result = match &self.browser {
            Some(browser) => open::with(url, browser),
            None => open::that(url),
        };
        result.map_err(|e| TokenError::BrowserUnavailable(e.to_string()))
    }

    /// Ask Streamlabs whether the login for `verifier` has completed
    async fn poll_once(&self, verifier: &str) -> Result<Option<String>, TokenError> {
        let resp = self
            .client
            .get(&self.auth_data_url)
            .query(&[("code_verifier", verifier)])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            tracing::debug!("Login still pending (HTTP {})", resp.status());
            return Ok(None);
        }

        let json: serde_json::Value = match resp.json().await {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!("Unparseable auth data response: {}", e);
                return Ok(None);
            }
        };

        Ok(parse_oauth_token(&json))
    }

    /// Poll until the token is issued or the timeout elapses
    pub async fn wait_for_token(&self, verifier: &str) -> Result<String, TokenError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            match self.poll_once(verifier).await {
                Ok(Some(token)) => {
                    tracing::info!("Browser login completed");
                    return Ok(token);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Polling for login failed: {}", e),
            }

            if Instant::now() >= deadline {
                return Err(TokenError::LoginTimedOut(self.timeout.as_secs()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl Default for BrowserLoginSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSource for BrowserLoginSource {
    fn name(&self) -> &'static str {
        "browser login"
    }

    async fn fetch(&self) -> Result<String, TokenError> {
        let pkce = PkcePair::generate();
        let url = self.authorize_url(&pkce.challenge)?;

        tracing::info!("Opening Streamlabs login: {}", url);
        self.open_browser(&url)?;

        self.wait_for_token(&pkce.verifier).await
    }
}

/// Extract `data.oauth_token` from the auth data response
fn parse_oauth_token(json: &serde_json::Value) -> Option<String> {
    json.get("data")
        .and_then(|d| d.get("oauth_token"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_challenge_is_sha256_base64url() {
        let challenge = PkcePair::challenge_for("dBjftJeZ4CVP-mJ92IrhoBkrxdJEkRwWBVUpbNiVHqI");
        assert_eq!(challenge, "48Fi4cRAUcr9LkseERuoJyfsGefbcTAFeR7O0yH4bFo");
    }

    #[test]
    fn test_generated_pair_is_consistent() {
        let pair = PkcePair::generate();
        assert_eq!(pair.verifier.len(), 86);
        assert!(!pair.verifier.contains('='));
        assert_eq!(pair.challenge, PkcePair::challenge_for(&pair.verifier));
        assert_ne!(pair.verifier, PkcePair::generate().verifier);
    }

    #[test]
    fn test_authorize_url() {
        let source = BrowserLoginSource::new();
        let url = source.authorize_url("abc_-123").unwrap();
        assert_eq!(
            url,
            "https://streamlabs.com/m/login?force_verify=1&external=mobile&skip_splash=1&tiktok&code_challenge=abc_-123"
        );
    }

    #[test]
    fn test_parse_oauth_token() {
        let json = serde_json::json!({ "success": true, "data": { "oauth_token": "tok" } });
        assert_eq!(parse_oauth_token(&json), Some("tok".to_string()));
        assert_eq!(parse_oauth_token(&serde_json::json!({ "data": {} })), None);
        assert_eq!(
            parse_oauth_token(&serde_json::json!({ "data": { "oauth_token": "" } })),
            None
        );
    }

    #[tokio::test]
    async fn test_wait_for_token_polls_until_issued() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/data"))
            .and(query_param("code_verifier", "verifier-1"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/data"))
            .and(query_param("code_verifier", "verifier-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": { "oauth_token": "fresh-token" }
            })))
            .mount(&server)
            .await;

        let source = BrowserLoginSource::new()
            .with_auth_data_url(format!("{}/auth/data", server.uri()))
            .with_poll_interval(Duration::from_millis(5))
            .with_timeout(Duration::from_secs(5));

        assert_eq!(source.wait_for_token("verifier-1").await.unwrap(), "fresh-token");
    }

    #[tokio::test]
    async fn test_wait_for_token_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false
            })))
            .mount(&server)
            .await;

        let source = BrowserLoginSource::new()
            .with_auth_data_url(format!("{}/auth/data", server.uri()))
            .with_poll_interval(Duration::from_millis(5))
            .with_timeout(Duration::from_millis(30));

        assert!(matches!(
            source.wait_for_token("v").await,
            Err(TokenError::LoginTimedOut(_))
        ));
    }
}
