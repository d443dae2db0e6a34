//! Container metadata
//!
//! Block 0 of every shard: the database name (128 bytes, zero padded) and the
//! shard suffix (4-byte big-endian integer). The rest of the block is zeros.

use crate::layout::{BLOCK_SIZE, METADATA_NAME_LEN};

/// Metadata record stored in block 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub db_name: String,
    pub suffix: u32,
}

impl Metadata {
    pub fn new(db_name: impl Into<String>, suffix: u32) -> Self {
        Self {
            db_name: db_name.into(),
            suffix,
        }
    }

    /// Serialize into a full 256-byte metadata block.
    pub fn serialize(&self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];
        let name = self.db_name.as_bytes();
        let len = name.len().min(METADATA_NAME_LEN);
        out[..len].copy_from_slice(&name[..len]);
        out[METADATA_NAME_LEN..METADATA_NAME_LEN + 4].copy_from_slice(&self.suffix.to_be_bytes());
        out
    }

    /// Deserialize from a metadata block, trimming the name's zero padding.
    pub fn deserialize(bytes: &[u8; BLOCK_SIZE]) -> Self {
        let db_name = String::from_utf8_lossy(&bytes[..METADATA_NAME_LEN])
            .trim_end_matches('\0')
            .to_string();
        let suffix = u32::from_be_bytes(
            bytes[METADATA_NAME_LEN..METADATA_NAME_LEN + 4]
                .try_into()
                .expect("4-byte suffix"),
        );
        Self { db_name, suffix }
    }
}
