//! Fixed-size block buffer
//!
//! A block is an opaque 256-byte buffer written sequentially from a cursor.
//! Data blocks and index blocks share this type but pack differently:
//!
//! - **Data blocks** start with a 36-byte sentinel header, then up to five
//!   44-byte entries; trailing entry slots are sentinel-filled so an
//!   all-sentinel stride reads as "empty" during a scan.
//! - **Index blocks** are written start-to-end with the serialized B-tree
//!   stream; the last block is sentinel padded and `valid_len()` trims the
//!   padding back off on read.

use crate::entry::DataEntry;
use crate::error::{DbError, Result};
use crate::layout::{BLOCK_SIZE, DATA_BLOCK_HEADER, ENTRY_SIZE, SENTINEL};

/// One fixed-size block of a container
#[derive(Debug, Clone)]
pub struct Block {
    /// Raw block contents
    pub data: [u8; BLOCK_SIZE],
    /// Append cursor; the block is full once this reaches `BLOCK_SIZE`
    write_pos: usize,
}

impl Block {
    /// Create an empty, zeroed block with the cursor at 0.
    pub fn new() -> Self {
        Self {
            data: [0u8; BLOCK_SIZE],
            write_pos: 0,
        }
    }

    /// Rebuild a block from raw bytes read off disk. The cursor is left at 0;
    /// on-disk blocks are only ever scanned, never appended to.
    pub fn from_bytes(bytes: &[u8; BLOCK_SIZE]) -> Self {
        Self {
            data: *bytes,
            write_pos: 0,
        }
    }

    /// Append `bytes` at the cursor.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let remaining = BLOCK_SIZE - self.write_pos;
        if bytes.len() > remaining {
            return Err(DbError::BlockFull {
                requested: bytes.len(),
                remaining,
            });
        }
        self.data[self.write_pos..self.write_pos + bytes.len()].copy_from_slice(bytes);
        self.write_pos += bytes.len();
        Ok(())
    }

    /// Whether the cursor has reached the end of the block.
    pub fn is_full(&self) -> bool {
        self.write_pos >= BLOCK_SIZE
    }

    /// Sentinel-pad from the cursor to the end of the block.
    pub fn fill_remaining(&mut self) {
        for b in self.data[self.write_pos..].iter_mut() {
            *b = SENTINEL;
        }
    }

    /// Prepare a data block: sentinel-fill the 36-byte reserved header and
    /// park the cursor just past it.
    pub fn init_data_header(&mut self) {
        for b in self.data[..DATA_BLOCK_HEADER].iter_mut() {
            *b = SENTINEL;
        }
        self.write_pos = DATA_BLOCK_HEADER;
    }

    /// Scan the data-block region in 44-byte strides, decoding every stride
    /// that is not entirely sentinel bytes.
    pub fn entries(&self) -> Result<Vec<DataEntry>> {
        let mut entries = Vec::new();
        let mut offset = DATA_BLOCK_HEADER;
        while offset + ENTRY_SIZE <= BLOCK_SIZE {
            let stride = &self.data[offset..offset + ENTRY_SIZE];
            if stride.iter().any(|b| *b != SENTINEL) {
                entries.push(DataEntry::decode(stride)?);
            }
            offset += ENTRY_SIZE;
        }
        Ok(entries)
    }

    /// Length of the block contents with trailing sentinel padding trimmed.
    /// Used to reassemble the index stream from its chunked blocks.
    pub fn valid_len(&self) -> usize {
        let mut len = BLOCK_SIZE;
        while len > 0 && self.data[len - 1] == SENTINEL {
            len -= 1;
        }
        len
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}
