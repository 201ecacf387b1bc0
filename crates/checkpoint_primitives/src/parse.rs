use thiserror::Error;

use crate::checkpoint::Checkpoint;

/// Separator between the height and the hash in a checkpoint record.
pub const RECORD_SEPARATOR: char = ':';

/// Reasons a fetched payload is not a usable checkpoint record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Payload bytes are not UTF-8 text.
    #[error("checkpoint record is not valid UTF-8")]
    NotUtf8,
    /// Splitting on `:` did not yield exactly two fields.
    #[error("checkpoint record has {fields} field(s), expected 2")]
    MalformedRecord { fields: usize },
    /// The height field is not a non-negative base-10 integer.
    #[error("checkpoint height {0:?} is not a number")]
    InvalidHeight(String),
    /// The hash field is empty once surrounding whitespace is trimmed.
    #[error("checkpoint hash is empty")]
    InvalidHash,
}

/// Parses raw bytes fetched from a publisher into a `Checkpoint`.
pub fn parse_checkpoint(raw: &[u8]) -> Result<Checkpoint, ParseError> {
    let text = core::str::from_utf8(raw).map_err(|_| ParseError::NotUtf8)?;
    parse_checkpoint_str(text)
}

/// Parses `<height>:<hash>`.
///
/// The height must be digits only (no whitespace around it); the hash is trimmed.
/// Checks happen in that order, so `"abc:"` reports the height, not the hash.
pub fn parse_checkpoint_str(text: &str) -> Result<Checkpoint, ParseError> {
    let fields: Vec<&str> = text.split(RECORD_SEPARATOR).collect();
    let [height, hash] = fields.as_slice() else {
        return Err(ParseError::MalformedRecord {
            fields: fields.len(),
        });
    };

    let height: u64 = height
        .parse()
        .map_err(|_| ParseError::InvalidHeight(height.to_string()))?;

    Checkpoint::new(height, hash)
}
