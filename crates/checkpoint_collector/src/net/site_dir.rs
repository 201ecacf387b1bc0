use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ContentSource, SourceError, validate_name};

/// Reads site files from a directory kept in sync by a local site node.
///
/// Files live at `{root}/{address}/{filename}`, which is how a ZeroNet data
/// directory is laid out.
#[derive(Debug, Clone)]
pub struct SiteDir {
    root: PathBuf,
}

impl SiteDir {
    /// Opens `root`, creating it if it does not exist yet.
    pub fn open<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            create_dir_all(&root)?;
        }
        Ok(SiteDir { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, address: &str, filename: &str) -> Result<PathBuf, SourceError> {
        Ok(self
            .root
            .join(validate_name(address)?)
            .join(validate_name(filename)?))
    }
}

#[async_trait]
impl ContentSource for SiteDir {
    async fn fetch_named_file(
        &self,
        address: &str,
        filename: &str,
    ) -> Result<Vec<u8>, SourceError> {
        let path = self.path_for(address, filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SourceError::NotFound {
                address: address.to_string(),
                filename: filename.to_string(),
            }),
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}
