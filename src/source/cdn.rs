//! CDN proxy source
//!
//! Fetches `<root>/{svg,png,webp}/<filename>` over HTTPS. One client is shared
//! by all requests so connections to the CDN are pooled.

use async_trait::async_trait;
use hyper::body::Bytes;
use reqwest::Client;
use std::time::Duration;

use super::{AssetError, AssetSource};
use crate::config::SourceKind;

pub struct CdnSource {
    root: String,
    client: Client,
}

impl CdnSource {
    pub fn new(root: &str, timeout: Duration) -> Result<Self, AssetError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AssetError::Client)?;

        Ok(Self {
            root: root.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }
}

fn transport_error(url: String, source: reqwest::Error) -> AssetError {
    if source.is_timeout() {
        AssetError::Timeout(url)
    } else {
        AssetError::Transport { url, source }
    }
}

#[async_trait]
impl AssetSource for CdnSource {
    async fn exists(&self, path: &str) -> bool {
        self.client
            .head(self.url_for(path))
            .send()
            .await
            .is_ok_and(|resp| resp.status().is_success())
    }

    async fn fetch(&self, path: &str) -> Result<Bytes, AssetError> {
        let url = self.url_for(path);
        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => return Err(transport_error(url, e)),
        };

        let status = resp.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url,
                status: status.as_u16(),
            });
        }

        resp.bytes().await.map_err(|e| transport_error(url, e))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Cdn
    }

    fn describe(&self) -> String {
        self.root.clone()
    }
}
