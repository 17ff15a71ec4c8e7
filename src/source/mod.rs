//! Asset source module
//!
//! Abstracts where icon files come from. The request handler only talks to
//! [`AssetSource`], so routing and recoloring are written once for both the
//! CDN proxy and the local directory.

pub mod cdn;
pub mod local;

use async_trait::async_trait;
use hyper::body::Bytes;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{SourceConfig, SourceKind};

pub use cdn::CdnSource;
pub use local::LocalSource;

/// Reasons an asset could not be produced. All of them end up as a 404.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("path escapes asset root: {0}")]
    OutsideRoot(String),

    #[error("upstream returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetching {0} timed out")]
    Timeout(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A place icon files can be read from.
///
/// `path` is always relative to the source root, e.g. `svg/aws-light.svg`.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Cheap existence probe; every failure counts as "does not exist".
    async fn exists(&self, path: &str) -> bool;

    /// Fetch the raw bytes of an asset.
    async fn fetch(&self, path: &str) -> Result<Bytes, AssetError>;

    /// Fetch an asset as text. Invalid UTF-8 is replaced, not rejected.
    async fn fetch_text(&self, path: &str) -> Result<String, AssetError> {
        let bytes = self.fetch(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn kind(&self) -> SourceKind;

    /// Plain-text body for 404 responses
    fn not_found_body(&self) -> &'static str {
        match self.kind() {
            SourceKind::Cdn => "File not found",
            SourceKind::Local => "Not found",
        }
    }

    /// Base URL or root directory, for startup logs
    fn describe(&self) -> String;
}

/// Build the asset source selected by the configuration
pub fn from_config(cfg: &SourceConfig) -> Result<Arc<dyn AssetSource>, AssetError> {
    let timeout = Duration::from_secs(cfg.fetch_timeout);
    let source: Arc<dyn AssetSource> = match cfg.kind {
        SourceKind::Cdn => Arc::new(CdnSource::new(&cfg.cdn_root, timeout)?),
        SourceKind::Local => Arc::new(LocalSource::new(&cfg.local_root, timeout)),
    };
    Ok(source)
}

#[cfg(test)]
pub mod memory {
    //! In-memory source used by handler tests

    use super::{AssetError, AssetSource};
    use crate::config::SourceKind;
    use async_trait::async_trait;
    use hyper::body::Bytes;
    use std::collections::HashMap;

    pub struct MemorySource {
        kind: SourceKind,
        files: HashMap<String, Bytes>,
    }

    impl MemorySource {
        pub fn new(kind: SourceKind) -> Self {
            Self {
                kind,
                files: HashMap::new(),
            }
        }

        pub fn with_file(mut self, path: &str, content: impl Into<Bytes>) -> Self {
            self.files.insert(path.to_string(), content.into());
            self
        }
    }

    #[async_trait]
    impl AssetSource for MemorySource {
        async fn exists(&self, path: &str) -> bool {
            self.files.contains_key(path)
        }

        async fn fetch(&self, path: &str) -> Result<Bytes, AssetError> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| AssetError::NotFound(path.to_string()))
        }

        fn kind(&self) -> SourceKind {
            self.kind
        }

        fn describe(&self) -> String {
            format!("memory ({} files)", self.files.len())
        }
    }
}
