//! Block bitmap allocator
//!
//! One bit per block, `true` = allocated. Blocks 0-10 (metadata, bitmap, FCB
//! table) are permanently reserved; allocation is first-fit from block 11.
//!
//! The bitmap serializes to 512 bytes (4096 bits, LSB-first within each
//! byte), split across the two bitmap blocks of the container.

use crate::layout::{BLOCK_CNT, DATA_REGION_START};

/// Free/used state of every block in one container
#[derive(Debug, Clone)]
pub struct Bitmap {
    bits: Vec<bool>,
}

impl Bitmap {
    /// Serialized size in bytes
    pub const SERIALIZED_LEN: usize = BLOCK_CNT / 8;

    /// Create a bitmap for a fresh container: only the reserved region is set.
    pub fn new() -> Self {
        let mut bits = vec![false; BLOCK_CNT];
        for bit in bits.iter_mut().take(DATA_REGION_START) {
            *bit = true;
        }
        Self { bits }
    }

    /// Allocate up to `n` blocks, first-fit from the start of the data region.
    ///
    /// Returns the allocated block ids, marking each set. A short result
    /// means the container lacks space; the caller decides whether that is
    /// fatal (no rollback happens here).
    pub fn allocate(&mut self, n: usize) -> Vec<u32> {
        let mut out = Vec::with_capacity(n);
        for i in DATA_REGION_START..self.bits.len() {
            if out.len() == n {
                break;
            }
            if !self.bits[i] {
                self.bits[i] = true;
                out.push(i as u32);
            }
        }
        out
    }

    /// Clear the bit for `block`, returning it to the free pool.
    pub fn free(&mut self, block: u32) {
        self.bits[block as usize] = false;
    }

    /// Number of free blocks in the data region.
    pub fn count_free(&self) -> usize {
        self.bits[DATA_REGION_START..].iter().filter(|b| !**b).count()
    }

    /// Whether `block` is currently allocated.
    pub fn is_set(&self, block: u32) -> bool {
        self.bits[block as usize]
    }

    /// Pack into 512 bytes, bit `i` at byte `i / 8`, position `i % 8`.
    pub fn serialize(&self) -> [u8; Self::SERIALIZED_LEN] {
        let mut bytes = [0u8; Self::SERIALIZED_LEN];
        for (i, set) in self.bits.iter().enumerate() {
            if *set {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        bytes
    }

    /// Rebuild from the 512-byte packed form. The reserved region is forced
    /// set regardless of the stored bits.
    pub fn deserialize(bytes: &[u8]) -> Self {
        let mut bits = vec![false; BLOCK_CNT];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = (bytes[i / 8] >> (i % 8)) & 1 == 1;
        }
        for bit in bits.iter_mut().take(DATA_REGION_START) {
            *bit = true;
        }
        Self { bits }
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}
