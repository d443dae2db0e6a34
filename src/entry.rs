//! Data entry codec
//!
//! A data entry is the fixed 44-byte unit stored in data blocks: a 4-byte
//! big-endian id followed by a 40-byte value field. Values shorter than 40
//! bytes are NUL-padded; longer values are truncated by the record reader
//! before they get here.

use crate::error::{DbError, Result};
use crate::layout::{ENTRY_ID_SIZE, ENTRY_SIZE, ENTRY_VAL_SIZE};

/// One (id, text) record as stored in a data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub id: u32,
    pub val: String,
}

impl DataEntry {
    pub fn new(id: u32, val: impl Into<String>) -> Self {
        Self { id, val: val.into() }
    }

    /// Encode into the fixed 44-byte layout.
    pub fn encode(&self) -> [u8; ENTRY_SIZE] {
        let mut out = [0u8; ENTRY_SIZE];
        out[..ENTRY_ID_SIZE].copy_from_slice(&self.id.to_be_bytes());
        let val = self.val.as_bytes();
        let len = val.len().min(ENTRY_VAL_SIZE);
        out[ENTRY_ID_SIZE..ENTRY_ID_SIZE + len].copy_from_slice(&val[..len]);
        out
    }

    /// Decode a 44-byte buffer, trimming trailing NUL/space padding from the
    /// value field. Any other length means corruption.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ENTRY_SIZE {
            return Err(DbError::InvalidEntryLength(bytes.len()));
        }
        let id = u32::from_be_bytes(bytes[..ENTRY_ID_SIZE].try_into().expect("4-byte id"));
        let val = String::from_utf8_lossy(&bytes[ENTRY_ID_SIZE..])
            .trim_end_matches(|c| c == '\0' || c == ' ')
            .to_string();
        Ok(Self { id, val })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let entry = DataEntry::new(42, "Cars,Animation");
        let decoded = DataEntry::decode(&entry.encode()).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn long_value_is_truncated_to_field_width() {
        let entry = DataEntry::new(7, "x".repeat(60));
        let decoded = DataEntry::decode(&entry.encode()).unwrap();
        assert_eq!(decoded.val.len(), ENTRY_VAL_SIZE);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(matches!(
            DataEntry::decode(&[0u8; 43]),
            Err(DbError::InvalidEntryLength(43))
        ));
    }
}
