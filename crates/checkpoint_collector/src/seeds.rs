//! Seed node list published through a site.
//!
//! The site holds `ipfs.hash`, the content hash of the current list; the list
//! itself is an IPFS object containing a JSON array of node addresses.
use thiserror::Error;
use tracing::debug;

use crate::net::{ContentSource, IpfsSource, SourceError};

/// File on the seed site that names the IPFS object holding the list.
pub const IPFS_HASH_FILE: &str = "ipfs.hash";

#[derive(Debug, Error)]
pub enum SeedListError {
    #[error("unable to fetch from ZeroNet: {0}")]
    Site(#[source] SourceError),
    #[error("ipfs.hash is empty or not UTF-8")]
    InvalidHash,
    #[error("unable to fetch data from IPFS: {0}")]
    Ipfs(#[source] SourceError),
    #[error("invalid seedlist format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Resolves the seed list published at `address`.
pub async fn fetch_seed_list<S, I>(
    site: &S,
    ipfs: &I,
    address: &str,
) -> Result<Vec<String>, SeedListError>
where
    S: ContentSource + ?Sized,
    I: IpfsSource + ?Sized,
{
    let content = site
        .fetch_named_file(address, IPFS_HASH_FILE)
        .await
        .map_err(SeedListError::Site)?;
    let hash = std::str::from_utf8(&content)
        .map(str::trim)
        .map_err(|_| SeedListError::InvalidHash)?;
    if hash.is_empty() {
        return Err(SeedListError::InvalidHash);
    }
    debug!("seed list for {address} is at IPFS object {hash}");

    let data = ipfs.fetch_ipfs(hash).await.map_err(SeedListError::Ipfs)?;
    Ok(serde_json::from_slice(&data)?)
}
