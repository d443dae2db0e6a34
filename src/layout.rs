//! On-disk layout constants
//!
//! Every size here is load-bearing: the container file is exactly
//! `BLOCK_CNT * BLOCK_SIZE` bytes, and the reserved regions partition it as
//! metadata (block 0), bitmap (blocks 1-2), FCB table (blocks 3-10), then the
//! data/index region (blocks 11+).

/// Size of one block in bytes
pub const BLOCK_SIZE: usize = 256;

/// Number of blocks in one container file
pub const BLOCK_CNT: usize = 4096;

/// Total size of one container file (1 MiB)
pub const FILE_SIZE: usize = BLOCK_CNT * BLOCK_SIZE;

/// Blocks holding the metadata record
pub const METADATA_BLOCK_CNT: usize = 1;

/// Blocks holding the bitmap (4096 bits = 512 bytes)
pub const BITMAP_BLOCK_CNT: usize = 2;

/// Number of slots in the file-control table
pub const FCB_SLOT_CNT: usize = 8;

/// First block of the FCB region
pub const FCB_REGION_START: usize = METADATA_BLOCK_CNT + BITMAP_BLOCK_CNT;

/// First allocable block: everything below is permanently reserved
pub const DATA_REGION_START: usize = FCB_REGION_START + FCB_SLOT_CNT;

/// Serialized size of one data entry: 4-byte id + 40-byte value
pub const ENTRY_SIZE: usize = ENTRY_ID_SIZE + ENTRY_VAL_SIZE;

/// Bytes of the big-endian id prefix in a data entry
pub const ENTRY_ID_SIZE: usize = 4;

/// Bytes of the value field in a data entry
pub const ENTRY_VAL_SIZE: usize = 40;

/// Reserved header bytes at the start of every data block
pub const DATA_BLOCK_HEADER: usize = 36;

/// Data entries that fit in one block after the header
pub const ENTRIES_PER_BLOCK: usize = (BLOCK_SIZE - DATA_BLOCK_HEADER) / ENTRY_SIZE;

/// Padding byte marking unused buffer regions and empty entry slots
pub const SENTINEL: u8 = b' ';

/// Bytes reserved for the database name in the metadata block
pub const METADATA_NAME_LEN: usize = 128;

/// Shard file suffix; full names are `{db}.db{n}` with n starting at 0
pub const FILE_SUFFIX: &str = ".db";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_partition_the_container() {
        assert_eq!(FILE_SIZE, 1024 * 1024);
        assert_eq!(DATA_REGION_START, 11);
        assert_eq!(ENTRIES_PER_BLOCK, 5);
        // header + 5 entries fills a block exactly
        assert_eq!(DATA_BLOCK_HEADER + ENTRIES_PER_BLOCK * ENTRY_SIZE, BLOCK_SIZE);
    }
}
