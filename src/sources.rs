//! Line-oriented input sources
//!
//! Credentials and proxy candidates are plain text, one entry per line.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{BotError, Result};
use crate::models::Account;

/// Ordered, trimmed, non-blank lines from somewhere
#[async_trait]
pub trait LineSource: Send + Sync {
    async fn load(&self) -> Result<Vec<String>>;

    /// Human-readable origin, used in log lines and errors
    fn describe(&self) -> String;
}

/// Lines read from a file on disk; a missing file is created empty
pub struct FileLineSource {
    path: PathBuf,
}

impl FileLineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Like [`LineSource::load`], also reporting whether the file had to be created
    pub async fn load_or_create(&self) -> Result<(Vec<String>, bool)> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok((split_lines(&content), false)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::write(&self.path, "").await?;
                info!("Created empty {}", self.path.display());
                Ok((Vec::new(), true))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LineSource for FileLineSource {
    async fn load(&self) -> Result<Vec<String>> {
        self.load_or_create().await.map(|(lines, _)| lines)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory lines
pub struct StaticLineSource {
    lines: Vec<String>,
}

impl StaticLineSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl LineSource for StaticLineSource {
    async fn load(&self) -> Result<Vec<String>> {
        Ok(split_lines(&self.lines.join("\n")))
    }

    fn describe(&self) -> String {
        "in-memory list".to_string()
    }
}

fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// One account per credential line, indexed in load order
///
/// Zero credentials is fatal.
pub async fn load_accounts(source: &dyn LineSource) -> Result<Vec<Account>> {
    let cookies = source.load().await?;
    if cookies.is_empty() {
        return Err(BotError::NoCredentials {
            path: source.describe(),
        });
    }

    let accounts: Vec<Account> = cookies
        .into_iter()
        .enumerate()
        .map(|(index, cookie)| Account::new(index, cookie))
        .collect();

    info!("Loaded {} accounts from {}", accounts.len(), source.describe());
    Ok(accounts)
}

/// Proxy candidate lines; missing or empty input degrades to direct mode
pub async fn load_proxy_candidates(source: &dyn LineSource) -> Vec<String> {
    match source.load().await {
        Ok(lines) if lines.is_empty() => {
            warn!(
                "No proxies in {}, using direct connections",
                source.describe()
            );
            lines
        }
        Ok(lines) => {
            info!("Loaded {} proxy candidates", lines.len());
            lines
        }
        Err(e) => {
            warn!(
                "Could not read proxies from {}: {}; using direct connections",
                source.describe(),
                e
            );
            Vec::new()
        }
    }
}
