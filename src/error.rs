//! Error types for packdb
//!
//! Provides a unified error type for all operations.
//!
//! "Not found" is deliberately absent: a missing FCB or a missing key is an
//! ordinary outcome of `find`/`get`/`locate_shard` and is reported as `None`,
//! never as an error.

use thiserror::Error;

/// Result type alias using DbError
pub type Result<T> = std::result::Result<T, DbError>;

/// Unified error type for packdb operations
#[derive(Debug, Error)]
pub enum DbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Block Errors
    // -------------------------------------------------------------------------
    /// A write would run past the end of the block. With correct allocation
    /// arithmetic this never fires; seeing it means a sizing bug upstream.
    #[error("block full: write of {requested} bytes exceeds {remaining} remaining")]
    BlockFull { requested: usize, remaining: usize },

    // -------------------------------------------------------------------------
    // Codec / Corruption Errors
    // -------------------------------------------------------------------------
    /// A data entry decode received a buffer that is not exactly 44 bytes.
    /// Indicates on-disk corruption; unrecoverable for the open container.
    #[error("invalid data entry length: {0} bytes")]
    InvalidEntryLength(usize),

    /// A serialized structure (index token stream, FCB record) could not be
    /// parsed back. Unrecoverable for the open container.
    #[error("corruption: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Allocation Errors
    // -------------------------------------------------------------------------
    /// No free slot in the 8-entry file-control table.
    #[error("file-control table full")]
    TableFull,

    /// Fewer free blocks than the operation requires.
    #[error("allocation shortfall: needed {needed} blocks, {available} available")]
    AllocationShortfall { needed: usize, available: usize },

    /// The source needs more block ids than an FCB record can list.
    #[error("file too large: {blocks} blocks exceed FCB capacity")]
    FileTooLarge { blocks: usize },

    // -------------------------------------------------------------------------
    // Record Source Errors
    // -------------------------------------------------------------------------
    /// A CSV row that should carry an integer id could not be parsed.
    #[error("bad record: {0}")]
    BadRecord(String),
}
