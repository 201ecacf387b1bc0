//! Content sources: the external network as seen by the collector.
//!
//! A source resolves `(address, filename)` to raw bytes. Everything behind it (site
//! sync, peer discovery, IPFS block exchange) belongs to the node it talks to.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

pub mod gateway;
pub mod site_dir;

pub use gateway::HttpGateway;
pub use site_dir::SiteDir;

/// Errors that can occur when fetching a file from a content source.
///
/// The collector treats every variant as the same transient failure; the variants
/// only exist so logs say what went wrong.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("only http:// and https:// gateway URLs are supported")]
    NonHttpUrl,
    #[error("invalid gateway URL: {0}")]
    Url(String),
    #[error("invalid site address or filename: {0:?}")]
    InvalidName(String),
    #[error("{address}/{filename} not found")]
    NotFound { address: String, filename: String },
    #[error("unexpected HTTP status: {0}")]
    Status(StatusCode),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Resolves a named file published under a site address.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_named_file(&self, address: &str, filename: &str)
    -> Result<Vec<u8>, SourceError>;
}

/// Resolves raw IPFS objects by content hash.
#[async_trait]
pub trait IpfsSource: Send + Sync {
    async fn fetch_ipfs(&self, hash: &str) -> Result<Vec<u8>, SourceError>;
}

#[async_trait]
impl<T: ContentSource + ?Sized> ContentSource for Box<T> {
    async fn fetch_named_file(
        &self,
        address: &str,
        filename: &str,
    ) -> Result<Vec<u8>, SourceError> {
        (**self).fetch_named_file(address, filename).await
    }
}

#[async_trait]
impl<T: ContentSource + ?Sized> ContentSource for Arc<T> {
    async fn fetch_named_file(
        &self,
        address: &str,
        filename: &str,
    ) -> Result<Vec<u8>, SourceError> {
        (**self).fetch_named_file(address, filename).await
    }
}

/// Rejects names that would escape their parent when used as a path segment.
pub(crate) fn validate_name(name: &str) -> Result<&str, SourceError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(SourceError::InvalidName(name.to_string()));
    }
    Ok(name)
}
