//! Where the client finds the user's auth token.
//!
//! The token is read once per activation, at connect time. An absent token
//! is not an error: the bridge simply stays inactive.

use std::path::PathBuf;

use async_trait::async_trait;

/// Errors while reading a stored token.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("Failed to read token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of the bearer token used for the channel handshake and REST calls.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// `Ok(None)` when no token is stored.
    async fn load(&self) -> Result<Option<String>, TokenStoreError>;
}

/// Blank tokens count as absent.
fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Token fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenStore {
    token: Option<String>,
}

impl StaticTokenStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: non_blank(&token.into()),
        }
    }

    /// A store that never has a token.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for StaticTokenStore {
    async fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable on every load.
#[derive(Debug, Clone)]
pub struct EnvTokenStore {
    var: String,
}

impl EnvTokenStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl TokenStore for EnvTokenStore {
    async fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(std::env::var(&self.var).ok().and_then(|v| non_blank(&v)))
    }
}

/// Reads the token from a file, e.g. one written by a login command.
///
/// A missing file means "logged out".
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>, TokenStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(non_blank(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TokenStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
