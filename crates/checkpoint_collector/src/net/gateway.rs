use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::trace;

use super::{ContentSource, IpfsSource, SourceError, validate_name};

/// Fetches site files and IPFS objects through a local HTTP gateway.
///
/// Site files resolve to `{base}/{address}/{filename}` (the layout of a ZeroNet UI
/// proxy) and IPFS objects to `{base}/ipfs/{hash}` (the layout of an IPFS gateway).
/// Both may be the same process or two different ones.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base: Url,
}

impl HttpGateway {
    /// Creates a gateway client for `base_url`, e.g. `http://127.0.0.1:43110`.
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        Self::with_client(base_url, Client::new())
    }

    /// Like `new`, but every request is bounded by `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, client)
    }

    fn with_client(base_url: &str, client: Client) -> Result<Self, SourceError> {
        let base = Url::parse(base_url).map_err(|e| SourceError::Url(e.to_string()))?;
        match base.scheme() {
            "http" | "https" => {}
            _ => return Err(SourceError::NonHttpUrl),
        }
        if base.cannot_be_a_base() {
            return Err(SourceError::Url(format!("{base_url} cannot be a base URL")));
        }
        Ok(HttpGateway { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, address: &str, filename: &str) -> Result<Vec<u8>, SourceError> {
        trace!(%url, "gateway GET");
        let res = self.client.get(url).send().await?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound {
                address: address.to_string(),
                filename: filename.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }

        Ok(res.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ContentSource for HttpGateway {
    async fn fetch_named_file(
        &self,
        address: &str,
        filename: &str,
    ) -> Result<Vec<u8>, SourceError> {
        let url = self.url_for(&[validate_name(address)?, validate_name(filename)?])?;
        self.get(url, address, filename).await
    }
}

#[async_trait]
impl IpfsSource for HttpGateway {
    async fn fetch_ipfs(&self, hash: &str) -> Result<Vec<u8>, SourceError> {
        let url = self.url_for(&["ipfs", validate_name(hash)?])?;
        self.get(url, "ipfs", hash).await
    }
}
