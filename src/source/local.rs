//! Local directory source
//!
//! Serves `<root>/{svg,png,webp}/<filename>` from disk.

use async_trait::async_trait;
use hyper::body::Bytes;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use super::{AssetError, AssetSource};
use crate::config::SourceKind;
use crate::logger;

pub struct LocalSource {
    root: PathBuf,
    timeout: Duration,
}

impl LocalSource {
    pub fn new(root: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            timeout,
        }
    }

    /// Run `fut` under the fetch timeout; an expired timeout is [`AssetError::Timeout`]
    async fn timed<T>(
        &self,
        path: &str,
        fut: impl Future<Output = Result<T, AssetError>>,
    ) -> Result<T, AssetError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or_else(|_| Err(AssetError::Timeout(path.to_string())))
    }

    /// Resolve `path` under the root, refusing anything that lands outside it
    async fn resolve(&self, path: &str) -> Result<PathBuf, AssetError> {
        let root = fs::canonicalize(&self.root)
            .await
            .map_err(|source| AssetError::Io {
                path: self.root.display().to_string(),
                source,
            })?;

        // File not found is common (404), no need to log at warning level
        let candidate = fs::canonicalize(self.root.join(path.trim_start_matches('/')))
            .await
            .map_err(|_| AssetError::NotFound(path.to_string()))?;

        if !candidate.starts_with(&root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                path,
                candidate.display()
            ));
            return Err(AssetError::OutsideRoot(path.to_string()));
        }
        Ok(candidate)
    }
}

#[async_trait]
impl AssetSource for LocalSource {
    async fn exists(&self, path: &str) -> bool {
        self.timed(path, async {
            let file = self.resolve(path).await?;
            Ok(fs::metadata(&file).await.is_ok_and(|m| m.is_file()))
        })
        .await
        .unwrap_or(false)
    }

    async fn fetch(&self, path: &str) -> Result<Bytes, AssetError> {
        self.timed(path, async {
            let file = self.resolve(path).await?;
            fs::read(&file)
                .await
                .map(Bytes::from)
                .map_err(|source| AssetError::Io {
                    path: file.display().to_string(),
                    source,
                })
        })
        .await
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempdir::TempDir;

    fn fixture() -> (TempDir, LocalSource) {
        let dir = TempDir::new("icon-local").unwrap();
        std_fs::create_dir_all(dir.path().join("svg")).unwrap();
        std_fs::create_dir_all(dir.path().join("png")).unwrap();
        std_fs::write(dir.path().join("svg/aws.svg"), "<svg/>").unwrap();
        std_fs::write(dir.path().join("png/aws.png"), [0x89, b'P', b'N', b'G']).unwrap();
        std_fs::write(dir.path().join("secret.txt"), "nope").unwrap();
        let source = LocalSource::new(dir.path(), Duration::from_secs(10));
        (dir, source)
    }

    #[tokio::test]
    async fn test_fetch_existing() {
        let (_dir, source) = fixture();
        let bytes = source.fetch("png/aws.png").await.unwrap();
        assert_eq!(&bytes[..], &[0x89, b'P', b'N', b'G']);
        assert_eq!(source.fetch_text("svg/aws.svg").await.unwrap(), "<svg/>");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (_dir, source) = fixture();
        assert!(!source.exists("svg/missing.svg").await);
        assert!(matches!(
            source.fetch("svg/missing.svg").await,
            Err(AssetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_is_not_an_asset() {
        let (_dir, source) = fixture();
        assert!(source.exists("svg/aws.svg").await);
        assert!(!source.exists("svg").await);
    }

    #[tokio::test]
    async fn test_expired_timeout_is_timeout_error() {
        let (dir, _) = fixture();
        let source = LocalSource::new(dir.path(), Duration::from_millis(50));
        let stalled = std::future::pending::<Result<PathBuf, AssetError>>();
        assert!(matches!(
            source.timed("svg/aws.svg", stalled).await,
            Err(AssetError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_timed_lookup_serves_existing_file() {
        let (dir, _) = fixture();
        let source = LocalSource::new(dir.path(), Duration::from_secs(5));
        assert!(source.exists("svg/aws.svg").await);
        assert_eq!(&source.fetch("svg/aws.svg").await.unwrap()[..], b"<svg/>");
    }

    #[tokio::test]
    async fn test_traversal_blocked() {
        let (dir, _) = fixture();
        let inner = dir.path().join("svg");
        let source = LocalSource::new(&inner, Duration::from_secs(10));
        assert!(!source.exists("../secret.txt").await);
        assert!(matches!(
            source.fetch("../secret.txt").await,
            Err(AssetError::OutsideRoot(_))
        ));
    }
}
