//! Update checker for StreamKey
//! Checks GitHub releases for new versions

use serde::Deserialize;

const GITHUB_REPO: &str = "Loukious/StreamLabsTikTokStreamKeyGenerator";
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct UpdateInfo {
    pub version: String,
    pub release_url: String,
    pub release_notes: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    html_url: String,
    body: Option<String>,
}

/// Check GitHub for a release newer than this build
///
/// Network or API failures are not errors: they just mean no update is known.
pub async fn check_for_updates() -> Option<UpdateInfo> {
    let url = format!("https://api.github.com/repos/{}/releases/latest", GITHUB_REPO);
    check_for_updates_at(&url).await
}

async fn check_for_updates_at(url: &str) -> Option<UpdateInfo> {
    let client = reqwest::Client::builder()
        .user_agent("StreamKey")
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .ok()?;

    let response = client.get(url).send().await.ok()?;

    if !response.status().is_success() {
        tracing::debug!("GitHub API returned status: {}", response.status());
        return None;
    }

    let release: GitHubRelease = response.json().await.ok()?;

    let remote_version = release.tag_name.trim_start_matches('v');

    if is_newer_version(remote_version, CURRENT_VERSION) {
        Some(UpdateInfo {
            version: release.tag_name.clone(),
            release_url: release.html_url,
            release_notes: release.body.unwrap_or_default(),
        })
    } else {
        None
    }
}

/// Compare dotted versions numerically, returns true if remote is newer
fn is_newer_version(remote: &str, current: &str) -> bool {
    let parse_version = |v: &str| -> (u32, u32, u32) {
        let parts: Vec<u32> = v
            .split('.')
            .map(|p| {
                p.chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
            })
            .filter_map(|p| p.parse().ok())
            .collect();
        (
            parts.first().copied().unwrap_or(0),
            parts.get(1).copied().unwrap_or(0),
            parts.get(2).copied().unwrap_or(0),
        )
    };

    parse_version(remote) > parse_version(current)
}

/// Get the current version
pub fn current_version() -> &'static str {
    CURRENT_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_version_comparison() {
        assert!(is_newer_version("1.0.3", "1.0.2"));
        assert!(is_newer_version("1.1", "1.0.2"));
        assert!(is_newer_version("2.0.0", "1.9.9"));
        assert!(!is_newer_version("1.0.2", "1.0.2"));
        assert!(!is_newer_version("0.9.0", "1.0.0"));
        assert!(is_newer_version("1.0.10", "1.0.9"));
        assert!(is_newer_version("1.2.0-beta", "1.1.0"));
    }

    #[tokio::test]
    async fn test_newer_release_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": "v99.0.0",
                "html_url": "https://github.com/example/releases/v99.0.0",
                "body": "Notes"
            })))
            .mount(&server)
            .await;

        let info = check_for_updates_at(&format!("{}/latest", server.uri()))
            .await
            .unwrap();
        assert_eq!(info.version, "v99.0.0");
        assert_eq!(info.release_notes, "Notes");
    }

    #[tokio::test]
    async fn test_same_version_not_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": format!("v{}", CURRENT_VERSION),
                "html_url": "https://github.com/example"
            })))
            .mount(&server)
            .await;

        assert!(check_for_updates_at(&format!("{}/latest", server.uri()))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_api_failure_is_not_an_update() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(check_for_updates_at(&server.uri()).await.is_none());
    }
}
