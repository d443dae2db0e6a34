//! Tests for FCB records and the file-control table
//!
//! These tests verify:
//! - Fixed 256-byte serialization round trip, live and empty slots alike
//! - Field truncation to the fixed widths
//! - Slot allocation, lookup by (name, type), TableFull
//! - remove() freeing every referenced block id

use packdb::bitmap::Bitmap;
use packdb::fcb::{Fcb, FcbTable, NAME_SIZE};
use packdb::layout::FCB_SLOT_CNT;
use packdb::DbError;

// =============================================================================
// Record Codec
// =============================================================================

#[test]
fn serialization_round_trip() {
    let fcb = Fcb::new("movies", "csv", vec![2, 19, 8], vec![20, 109, 82]);
    let decoded = Fcb::deserialize(&fcb.serialize()).unwrap();
    assert_eq!(decoded, fcb);
}

#[test]
fn empty_record_round_trips_as_empty() {
    let decoded = Fcb::deserialize(&Fcb::default().serialize()).unwrap();
    assert!(decoded.is_empty());
    assert!(decoded.index_blocks.is_empty());
    assert!(decoded.data_blocks.is_empty());
}

#[test]
fn overlong_name_is_truncated_to_field_width() {
    let fcb = Fcb::new("a".repeat(30), "csv", vec![], vec![]);
    let decoded = Fcb::deserialize(&fcb.serialize()).unwrap();
    assert_eq!(decoded.name.len(), NAME_SIZE);
}

#[test]
fn corrupt_list_count_is_rejected() {
    let fcb = Fcb::new("movies", "csv", vec![11], vec![12]);
    let mut bytes = fcb.serialize();
    // Overwrite the index-list count with a value past capacity.
    bytes[30..34].copy_from_slice(&u32::MAX.to_be_bytes());
    assert!(matches!(Fcb::deserialize(&bytes), Err(DbError::Corruption(_))));
}

// =============================================================================
// Table
// =============================================================================

#[test]
fn add_fills_first_free_slot() {
    let mut table = FcbTable::new();
    assert_eq!(table.add(Fcb::new("a", "csv", vec![], vec![])).unwrap(), 0);
    assert_eq!(table.add(Fcb::new("b", "csv", vec![], vec![])).unwrap(), 1);
    assert_eq!(table.live_count(), 2);
}

#[test]
fn find_matches_on_name_and_type() {
    let mut table = FcbTable::new();
    table.add(Fcb::new("movies", "csv", vec![11], vec![12])).unwrap();

    assert!(table.find("movies", "csv").is_some());
    assert!(table.find("movies", "tsv").is_none());
    assert!(table.find("shows", "csv").is_none());
}

#[test]
fn table_full_after_eight_entries() {
    let mut table = FcbTable::new();
    for i in 0..FCB_SLOT_CNT {
        table.add(Fcb::new(format!("f{i}"), "csv", vec![], vec![])).unwrap();
    }
    assert!(matches!(
        table.add(Fcb::new("extra", "csv", vec![], vec![])),
        Err(DbError::TableFull)
    ));
}

#[test]
fn remove_frees_every_referenced_block() {
    let mut bitmap = Bitmap::new();
    let index_blocks = bitmap.allocate(2);
    let data_blocks = bitmap.allocate(3);
    let before = bitmap.count_free();

    let mut table = FcbTable::new();
    table
        .add(Fcb::new("movies", "csv", index_blocks.clone(), data_blocks.clone()))
        .unwrap();

    let removed = table.remove("movies", "csv", &mut bitmap);
    assert!(removed.is_some());
    assert_eq!(table.live_count(), 0);
    assert!(table.find("movies", "csv").is_none());

    assert_eq!(bitmap.count_free(), before + 5);
    for id in index_blocks.iter().chain(data_blocks.iter()) {
        assert!(!bitmap.is_set(*id));
    }
}

#[test]
fn remove_of_absent_entry_is_none() {
    let mut bitmap = Bitmap::new();
    let mut table = FcbTable::new();
    assert!(table.remove("ghost", "csv", &mut bitmap).is_none());
}

#[test]
fn slot_reuse_after_remove() {
    let mut bitmap = Bitmap::new();
    let mut table = FcbTable::new();
    table.add(Fcb::new("a", "csv", vec![], vec![])).unwrap();
    table.add(Fcb::new("b", "csv", vec![], vec![])).unwrap();

    table.remove("a", "csv", &mut bitmap);
    assert_eq!(table.add(Fcb::new("c", "csv", vec![], vec![])).unwrap(), 0);
}

// =============================================================================
// Occupancy Derivation
// =============================================================================

#[test]
fn from_slots_derives_occupancy_from_emptiness() {
    let slots = vec![
        Fcb::new("live", "csv", vec![11], vec![12]),
        Fcb::default(),
        Fcb::default(),
        Fcb::default(),
        Fcb::default(),
        Fcb::default(),
        Fcb::default(),
        Fcb::default(),
    ];
    let table = FcbTable::from_slots(slots);
    assert_eq!(table.live_count(), 1);
    assert!(table.find("live", "csv").is_some());
}
