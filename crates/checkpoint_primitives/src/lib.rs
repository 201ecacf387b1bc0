//! Checkpoint records as published to a ZeroNet site.
//!
//! A publisher writes the latest known-good block as the literal text
//! `<height>:<hash>` (no length prefix, no escaping, no trailing newline implied).
//! This crate exposes:
//! - The immutable value type: `Checkpoint`
//! - The record parser: `parse_checkpoint`, `parse_checkpoint_str`
//! - The classified rejection reasons: `ParseError`
pub mod checkpoint;
pub mod parse;

pub use checkpoint::Checkpoint;
pub use parse::{ParseError, RECORD_SEPARATOR, parse_checkpoint, parse_checkpoint_str};
