//! Streamlabs API token acquisition
//!
//! Two sources are supported:
//! - the Local Storage of an installed Streamlabs Desktop
//! - a browser login against streamlabs.com (PKCE)

pub mod browser_login;
pub mod local_storage;

pub use browser_login::BrowserLoginSource;
pub use local_storage::LocalStorageSource;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors while acquiring a token
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Local token retrieval is not supported on this OS; pass --dir or use 'token login'")]
    UnsupportedPlatform,

    #[error("No Streamlabs log files found in {0}. Make sure Streamlabs is installed and you're logged in using TikTok.")]
    NoStorageFiles(PathBuf),

    #[error("No API token found locally. Make sure Streamlabs is installed and you're logged in using TikTok.")]
    TokenNotFound,

    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not open a browser: {0}")]
    BrowserUnavailable(String),

    #[error("Login was not completed within {0} seconds")]
    LoginTimedOut(u64),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Token scan task failed: {0}")]
    Task(String),
}

/// A way of obtaining a Streamlabs API token
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Short label for messages and logs
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<String, TokenError>;
}
