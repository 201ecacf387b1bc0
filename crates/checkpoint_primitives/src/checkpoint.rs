use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::parse::{ParseError, RECORD_SEPARATOR, parse_checkpoint_str};

/// A `(height, hash)` pair identifying a known-good chain state.
///
/// The hash is kept exactly as published, minus surrounding whitespace. It is an
/// opaque identifier here; nothing in this crate interprets or verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCheckpoint")]
pub struct Checkpoint {
    height: u64,
    hash: String,
}

#[derive(Deserialize)]
struct RawCheckpoint {
    height: u64,
    hash: String,
}

impl TryFrom<RawCheckpoint> for Checkpoint {
    type Error = ParseError;

    fn try_from(raw: RawCheckpoint) -> Result<Self, Self::Error> {
        Checkpoint::new(raw.height, raw.hash)
    }
}

impl Checkpoint {
    /// Builds a checkpoint, trimming the hash. Fails with `InvalidHash` if nothing is left.
    pub fn new(height: u64, hash: impl AsRef<str>) -> Result<Self, ParseError> {
        let hash = hash.as_ref().trim();
        if hash.is_empty() {
            return Err(ParseError::InvalidHash);
        }
        Ok(Checkpoint {
            height,
            hash: hash.to_string(),
        })
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Splits the checkpoint into its parts.
    pub fn into_parts(self) -> (u64, String) {
        (self.height, self.hash)
    }
}

/// Formats as the wire record, `<height>:<hash>`.
impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.height, RECORD_SEPARATOR, self.hash)
    }
}

impl FromStr for Checkpoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_checkpoint_str(s)
    }
}
