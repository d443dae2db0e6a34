//! # packdb
//!
//! A minimal block-structured, file-backed key/value store:
//! - Records (CSV rows keyed by integer id) packed into fixed-size blocks
//! - Fixed-size 1 MiB container files ("shards"), fully rewritten per mutation
//! - In-memory B-tree index, serialized into index blocks
//! - File-control table (FCB) cataloging each stored file's blocks
//! - A logical database may span several shard files (`name.db0`, `name.db1`, ...)
//!
//! ## Container Layout
//!
//! ```text
//! ┌────────────┬────────────────┬──────────────────┬─────────────────────┐
//! │  block 0   │   blocks 1-2   │   blocks 3-10    │   blocks 11-4095    │
//! │  metadata  │     bitmap     │  8 x FCB slots   │  data/index region  │
//! └────────────┴────────────────┴──────────────────┴─────────────────────┘
//!       4096 blocks x 256 bytes = 1,048,576 bytes per shard file
//! ```
//!
//! A `put` parses a CSV source into an ordered id→text map, packs the entries
//! into data blocks, builds a B-tree over id→block-id, serializes the tree
//! into index blocks, records an FCB, and flushes the whole container image.
//! A `find` reverses the path: FCB → index blocks → B-tree → data block.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod layout;

pub mod bitmap;
pub mod block;
pub mod entry;
pub mod metadata;
pub mod fcb;
pub mod index;
pub mod records;
pub mod db;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DbError, Result};
pub use config::Config;
pub use db::Db;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of packdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
