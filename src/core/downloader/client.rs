use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::core::error::{DistroError, DistroResult};
use crate::core::http::build_http_client;

/// Retrieves the raw bytes behind a URL.
///
/// The resolvers and the promotion index only ever talk to this trait, so
/// tests can swap the network for fixtures.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> DistroResult<Vec<u8>>;
}

/// reqwest-backed fetcher used by the command line.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> DistroResult<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> DistroResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DistroError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Fetched {} ({} bytes)", url, bytes.len());
        Ok(bytes.to_vec())
    }
}
