//! File-control blocks
//!
//! An FCB is the fixed 256-byte directory record for one stored file: its
//! name, its type, and the lists of index and data blocks holding it. Eight
//! slots live in blocks 3-10 of every container; a slot with empty name and
//! type is unused. FCB identity is the (name, type) pair.
//!
//! Serialized layout (256 bytes):
//!
//! ```text
//! ┌──────────┬──────────┬─────────────────────┬─────────────────────┐
//! │ name 20B │ type 10B │ index blocks 50B    │ data blocks 176B    │
//! │          │          │ (u32 count + ids)   │ (u32 count + ids)   │
//! └──────────┴──────────┴─────────────────────┴─────────────────────┘
//! ```
//!
//! All integers are big-endian.

use crate::bitmap::Bitmap;
use crate::error::{DbError, Result};
use crate::layout::{BLOCK_SIZE, FCB_SLOT_CNT};

/// Bytes of the name field; stored names are truncated to fit
pub const NAME_SIZE: usize = 20;

/// Bytes of the type field
pub const TYPE_SIZE: usize = 10;
const INDEX_LIST_SIZE: usize = 50;
const DATA_LIST_SIZE: usize = 176;

/// Most index-block ids one FCB can list
pub const MAX_INDEX_BLOCKS: usize = (INDEX_LIST_SIZE - 4) / 4;

/// Most data-block ids one FCB can list
pub const MAX_DATA_BLOCKS: usize = (DATA_LIST_SIZE - 4) / 4;

/// Directory record for one stored file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fcb {
    pub name: String,
    pub kind: String,
    pub index_blocks: Vec<u32>,
    pub data_blocks: Vec<u32>,
}

impl Fcb {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        index_blocks: Vec<u32>,
        data_blocks: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            index_blocks,
            data_blocks,
        }
    }

    /// An unused slot has empty name and type.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.kind.is_empty()
    }

    /// Serialize into the fixed 256-byte slot layout. Works identically for
    /// empty and live records; empty records serialize as blank fields.
    pub fn serialize(&self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];

        let name = self.name.as_bytes();
        let len = name.len().min(NAME_SIZE);
        out[..len].copy_from_slice(&name[..len]);

        let kind = self.kind.as_bytes();
        let len = kind.len().min(TYPE_SIZE);
        out[NAME_SIZE..NAME_SIZE + len].copy_from_slice(&kind[..len]);

        write_block_list(&mut out[NAME_SIZE + TYPE_SIZE..][..INDEX_LIST_SIZE], &self.index_blocks);
        write_block_list(
            &mut out[NAME_SIZE + TYPE_SIZE + INDEX_LIST_SIZE..][..DATA_LIST_SIZE],
            &self.data_blocks,
        );

        out
    }

    /// Deserialize a 256-byte slot.
    pub fn deserialize(bytes: &[u8; BLOCK_SIZE]) -> Result<Self> {
        let name = trim_field(&bytes[..NAME_SIZE]);
        let kind = trim_field(&bytes[NAME_SIZE..NAME_SIZE + TYPE_SIZE]);

        let index_blocks = read_block_list(
            &bytes[NAME_SIZE + TYPE_SIZE..][..INDEX_LIST_SIZE],
            MAX_INDEX_BLOCKS,
        )?;
        let data_blocks = read_block_list(
            &bytes[NAME_SIZE + TYPE_SIZE + INDEX_LIST_SIZE..][..DATA_LIST_SIZE],
            MAX_DATA_BLOCKS,
        )?;

        Ok(Self {
            name,
            kind,
            index_blocks,
            data_blocks,
        })
    }
}

fn trim_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

fn write_block_list(region: &mut [u8], blocks: &[u32]) {
    region[..4].copy_from_slice(&(blocks.len() as u32).to_be_bytes());
    for (i, id) in blocks.iter().enumerate() {
        region[4 + i * 4..8 + i * 4].copy_from_slice(&id.to_be_bytes());
    }
}

fn read_block_list(region: &[u8], max: usize) -> Result<Vec<u32>> {
    let count = u32::from_be_bytes(region[..4].try_into().expect("4-byte count")) as usize;
    if count > max {
        return Err(DbError::Corruption(format!(
            "FCB block list count {count} exceeds capacity {max}"
        )));
    }
    let mut blocks = Vec::with_capacity(count);
    for i in 0..count {
        blocks.push(u32::from_be_bytes(
            region[4 + i * 4..8 + i * 4].try_into().expect("4-byte id"),
        ));
    }
    Ok(blocks)
}

/// The 8-slot file-control table of one container.
///
/// Slot occupancy is tracked here as its own set rather than piggybacking on
/// the block bitmap; the two resources are unrelated even though the original
/// layout interleaves their regions on disk.
#[derive(Debug, Clone)]
pub struct FcbTable {
    slots: Vec<Fcb>,
    used: [bool; FCB_SLOT_CNT],
}

impl FcbTable {
    /// Table with all slots empty.
    pub fn new() -> Self {
        Self {
            slots: vec![Fcb::default(); FCB_SLOT_CNT],
            used: [false; FCB_SLOT_CNT],
        }
    }

    /// Rebuild a table from deserialized slots, deriving occupancy from
    /// slot emptiness.
    pub fn from_slots(slots: Vec<Fcb>) -> Self {
        debug_assert_eq!(slots.len(), FCB_SLOT_CNT);
        let mut used = [false; FCB_SLOT_CNT];
        for (i, slot) in slots.iter().enumerate() {
            used[i] = !slot.is_empty();
        }
        Self { slots, used }
    }

    /// Store `fcb` into the first free slot, returning its slot index.
    pub fn add(&mut self, fcb: Fcb) -> Result<usize> {
        for i in 0..FCB_SLOT_CNT {
            if !self.used[i] {
                self.used[i] = true;
                self.slots[i] = fcb;
                return Ok(i);
            }
        }
        Err(DbError::TableFull)
    }

    /// Linear scan for an exact (name, type) match.
    pub fn find(&self, name: &str, kind: &str) -> Option<&Fcb> {
        self.slots
            .iter()
            .enumerate()
            .find(|(i, fcb)| self.used[*i] && fcb.name == name && fcb.kind == kind)
            .map(|(_, fcb)| fcb)
    }

    /// Remove the (name, type) entry if present: free every block id it
    /// lists, reset the slot, clear its occupancy. Returns the removed record.
    pub fn remove(&mut self, name: &str, kind: &str, bitmap: &mut Bitmap) -> Option<Fcb> {
        for i in 0..FCB_SLOT_CNT {
            if self.used[i] && self.slots[i].name == name && self.slots[i].kind == kind {
                let fcb = std::mem::take(&mut self.slots[i]);
                for id in fcb.index_blocks.iter().chain(fcb.data_blocks.iter()) {
                    bitmap.free(*id);
                }
                self.used[i] = false;
                return Some(fcb);
            }
        }
        None
    }

    /// Number of occupied slots.
    pub fn live_count(&self) -> usize {
        self.used.iter().filter(|u| **u).count()
    }

    /// All slots in table order, empty or not (for serialization).
    pub fn slots(&self) -> &[Fcb] {
        &self.slots
    }
}

impl Default for FcbTable {
    fn default() -> Self {
        Self::new()
    }
}
