//! Streamlabs Desktop Local Storage token importer
//!
//! Streamlabs Desktop is an Electron app. After a TikTok login it keeps the
//! Streamlabs API token in its Chromium Local Storage (a leveldb directory),
//! where the write-ahead `.log` files hold entries like `"apiToken":"<hex>"`.

use async_trait::async_trait;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use super::{TokenError, TokenSource};

/// Only the newest log files are likely to hold the current token
const MAX_FILES_SCANNED: usize = 10;

static API_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"apiToken":"([a-f0-9]+)""#).expect("apiToken pattern is a valid regex")
});

/// Reads the token from Streamlabs Desktop's Local Storage
pub struct LocalStorageSource {
    dir: Option<PathBuf>,
}

impl LocalStorageSource {
    /// Use the platform default Streamlabs Desktop location
    pub fn new() -> Self {
        Self { dir: None }
    }

    /// Scan a specific leveldb directory instead
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Default leveldb directory of Streamlabs Desktop
    pub fn default_dir() -> Option<PathBuf> {
        #[cfg(any(target_os = "windows", target_os = "macos"))]
        {
            // %APPDATA% on Windows, ~/Library/Application Support on macOS
            dirs::config_dir().map(|base| {
                base.join("slobs-client")
                    .join("Local Storage")
                    .join("leveldb")
            })
        }

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            None
        }
    }

    fn storage_dir(&self) -> Result<PathBuf, TokenError> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_dir().ok_or(TokenError::UnsupportedPlatform),
        }
    }
}

impl Default for LocalStorageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSource for LocalStorageSource {
    fn name(&self) -> &'static str {
        "Streamlabs Desktop"
    }

    async fn fetch(&self) -> Result<String, TokenError> {
        let dir = self.storage_dir()?;
        tracing::debug!("Scanning {} for an API token", dir.display());

        tokio::task::spawn_blocking(move || scan_dir(&dir))
            .await
            .map_err(|e| TokenError::Task(e.to_string()))?
    }
}

/// Find the most recent token in a leveldb directory
pub fn scan_dir(dir: &Path) -> Result<String, TokenError> {
    let files = log_files_newest_first(dir)?;
    if files.is_empty() {
        return Err(TokenError::NoStorageFiles(dir.to_path_buf()));
    }

    for path in files.iter().take(MAX_FILES_SCANNED) {
        let contents = match std::fs::read(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if let Some(token) = extract_api_token(&contents) {
            tracing::info!("Found API token in {}", path.display());
            return Ok(token);
        }
    }

    Err(TokenError::TokenNotFound)
}

/// `.log` files in `dir`, most recently modified first
fn log_files_newest_first(dir: &Path) -> Result<Vec<PathBuf>, TokenError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(TokenError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files: Vec<(SystemTime, PathBuf)> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
        .map(|path| {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();

    files.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Last `"apiToken":"<hex>"` occurrence in raw leveldb bytes
///
/// Later entries in a log file supersede earlier ones.
pub fn extract_api_token(data: &[u8]) -> Option<String> {
    let content = String::from_utf8_lossy(data);
    API_TOKEN_PATTERN
        .captures_iter(&content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .last()
}
