//! Checkpoint collection from a ZeroNet site.
//!
//! A background poller fetches the site's latest `height:hash` record on a fixed
//! interval, keeps the most recent checkpoints in a bounded cache and serves
//! lookups by height to any number of concurrent readers.
//!
//! - Content sources: `net::{ContentSource, HttpGateway, SiteDir}`
//! - Cache: `store::CheckpointStore`
//! - Poll cycle: `poller::fetch_checkpoint`, `poller::CollectorStats`
//! - Lifecycle: `collection::{start_collection, CheckpointCollection}`
//! - Reads: `lookup::CheckpointLookup`
//! - Seed list retrieval: `seeds::fetch_seed_list`
pub mod collection;
pub mod config;
pub mod lookup;
pub mod net;
pub mod poller;
pub mod seeds;
pub mod store;

pub use checkpoint_primitives::{Checkpoint, ParseError};
pub use collection::{
    CheckpointCollection, CollectionError, CollectionHandle, CollectionState, start_collection,
};
pub use config::CollectorConfig;
pub use lookup::CheckpointLookup;
