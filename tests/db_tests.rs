//! End-to-end container tests
//!
//! These tests verify:
//! - put/find/get/remove against real shard files
//! - Whole-image persistence across reopen
//! - Multi-block packing (more than five records)
//! - Shard selection and location across container files
//! - Fixed 1 MiB shard file size
//! - dir/kill directory operations

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use packdb::db::{self, shard_path};
use packdb::layout::{BLOCK_CNT, DATA_REGION_START, FCB_SLOT_CNT, FILE_SIZE};
use packdb::{Config, Db, DbError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (TempDir, Config) {
    let temp = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp.path().join("data")).build();
    (temp, config)
}

/// Write a CSV source file of `id,name,type` rows into the temp dir.
fn write_csv(temp: &TempDir, file: &str, rows: &[(u32, &str, &str)]) -> PathBuf {
    let path = temp.path().join(file);
    let mut contents = String::new();
    for (id, name, kind) in rows {
        contents.push_str(&format!("{id},{name},{kind}\n"));
    }
    fs::write(&path, contents).unwrap();
    path
}

fn movies(temp: &TempDir) -> PathBuf {
    write_csv(
        temp,
        "movies.csv",
        &[
            (1, "Up", "Animation"),
            (2, "Cars", "Animation"),
            (3, "Her", "Drama"),
        ],
    )
}

// =============================================================================
// Put / Find
// =============================================================================

#[test]
fn put_then_find_returns_stored_value() {
    let (temp, config) = setup();
    let source = movies(&temp);

    let mut db = Db::open(&config, "library").unwrap();
    db.put(&source).unwrap();

    assert_eq!(
        db.find("movies.csv", 2).unwrap(),
        Some("Cars,Animation".to_string())
    );
    assert_eq!(db.find("movies.csv", 99).unwrap(), None);
}

#[test]
fn find_on_unknown_file_is_none() {
    let (_temp, config) = setup();
    let db = Db::open(&config, "library").unwrap();
    assert_eq!(db.find("ghost.csv", 1).unwrap(), None);
}

#[test]
fn put_accounts_for_data_and_index_blocks() {
    let (temp, config) = setup();
    let source = movies(&temp);

    let mut db = Db::open(&config, "library").unwrap();
    let before = db.count_empty_block();
    db.put(&source).unwrap();

    // 3 records = 1 data block; the tiny index fits in 1 block.
    assert_eq!(db.count_empty_block(), before - 2);
}

// =============================================================================
// Get (Bulk Scan)
// =============================================================================

#[test]
fn six_records_span_two_data_blocks_and_all_come_back() {
    let (temp, config) = setup();
    let genres = ["A", "B", "C", "D", "E", "F"];
    let rows: Vec<(u32, &str, &str)> = (1..=6u32)
        .map(|i| (i, "M", genres[i as usize - 1]))
        .collect();
    let source = write_csv(&temp, "six.csv", &rows);

    let mut db = Db::open(&config, "library").unwrap();
    let before = db.count_empty_block();
    db.put(&source).unwrap();

    // ceil(6 / 5) = 2 data blocks + 1 index block.
    assert_eq!(db.count_empty_block(), before - 3);

    let lines = db.get("six.csv").unwrap().unwrap();
    assert_eq!(lines.len(), 6, "no duplicates, no omissions");
    for i in 1..=6u32 {
        assert!(lines.contains_key(&i), "missing id {i}");
    }
}

#[test]
fn get_on_unknown_file_is_none() {
    let (_temp, config) = setup();
    let db = Db::open(&config, "library").unwrap();
    assert!(db.get("ghost.csv").unwrap().is_none());
}

#[test]
fn empty_source_stores_an_empty_file() {
    let (temp, config) = setup();
    let source = write_csv(&temp, "empty.csv", &[]);

    let mut db = Db::open(&config, "library").unwrap();
    db.put(&source).unwrap();

    let lines = db.get("empty.csv").unwrap().unwrap();
    assert!(lines.is_empty());
    assert_eq!(db.find("empty.csv", 1).unwrap(), None);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn shard_file_is_exactly_one_mebibyte() {
    let (_temp, config) = setup();
    let _db = Db::open(&config, "library").unwrap();

    let path = shard_path(&config.data_dir, "library", 0);
    assert_eq!(fs::metadata(path).unwrap().len(), FILE_SIZE as u64);
}

#[test]
fn records_survive_reopen() {
    let (temp, config) = setup();
    let source = movies(&temp);

    {
        let mut db = Db::open(&config, "library").unwrap();
        db.put(&source).unwrap();
    }

    let db = Db::open(&config, "library").unwrap();
    assert_eq!(db.name(), "library");
    assert_eq!(
        db.find("movies.csv", 3).unwrap(),
        Some("Her,Drama".to_string())
    );
    let lines = db.get("movies.csv").unwrap().unwrap();
    assert_eq!(lines.len(), 3);
}

#[test]
fn long_values_are_truncated_to_entry_width() {
    let (temp, config) = setup();
    let source = write_csv(
        &temp,
        "long.csv",
        &[(1, "AVeryVeryLongMovieTitleIndeed", "DocumentaryDrama")],
    );

    let mut db = Db::open(&config, "library").unwrap();
    db.put(&source).unwrap();

    let val = db.find("long.csv", 1).unwrap().unwrap();
    assert_eq!(val, "AVeryVeryLongMovieTitleIndeed,Documentar");
    assert!(val.len() <= 40);
}

// =============================================================================
// Remove
// =============================================================================

#[test]
fn remove_frees_blocks_and_keeps_other_files_intact() {
    let (temp, config) = setup();
    let movies_src = movies(&temp);
    let shows_src = write_csv(&temp, "shows.csv", &[(7, "Severance", "Drama")]);

    let mut db = Db::open(&config, "library").unwrap();
    let empty = db.count_empty_block();
    db.put(&movies_src).unwrap();
    db.put(&shows_src).unwrap();

    assert!(db.remove("movies.csv").unwrap());
    assert_eq!(db.find("movies.csv", 1).unwrap(), None);
    assert!(db.get("movies.csv").unwrap().is_none());

    // The other file is untouched after the removal.
    assert_eq!(
        db.find("shows.csv", 7).unwrap(),
        Some("Severance,Drama".to_string())
    );

    // Only shows.csv's blocks remain allocated (1 data + 1 index).
    assert_eq!(db.count_empty_block(), empty - 2);
}

#[test]
fn remove_of_absent_file_is_false() {
    let (_temp, config) = setup();
    let mut db = Db::open(&config, "library").unwrap();
    assert!(!db.remove("ghost.csv").unwrap());
}

#[test]
fn removal_persists_across_reopen() {
    let (temp, config) = setup();
    let source = movies(&temp);

    {
        let mut db = Db::open(&config, "library").unwrap();
        db.put(&source).unwrap();
        db.remove("movies.csv").unwrap();
    }

    let db = Db::open(&config, "library").unwrap();
    assert_eq!(db.find("movies.csv", 1).unwrap(), None);
    assert_eq!(db.live_files(), 0);
}

// =============================================================================
// Capacity Limits
// =============================================================================

#[test]
fn oversized_source_is_rejected_up_front() {
    let (temp, config) = setup();
    // 220 records need 44 data blocks; an FCB can list at most 43.
    let rows: Vec<(u32, &str, &str)> = (1..=220).map(|i| (i, "M", "G")).collect();
    let source = write_csv(&temp, "big.csv", &rows);

    let mut db = Db::open(&config, "library").unwrap();
    let before = db.count_empty_block();
    assert!(matches!(db.put(&source), Err(DbError::FileTooLarge { .. })));
    // Rejected before any allocation took hold.
    assert_eq!(db.count_empty_block(), before);
}

#[test]
fn index_overflow_rolls_back_data_allocation() {
    let (temp, config) = setup();
    // 215 records fit in 43 data blocks, but ten-digit ids push the
    // serialized index past the 11 blocks an FCB can list.
    let rows: Vec<(u32, &str, &str)> = (0..215u32)
        .map(|i| (4_000_000_000 + i, "M", "G"))
        .collect();
    let source = write_csv(&temp, "wide.csv", &rows);

    let mut db = Db::open(&config, "library").unwrap();
    let before = db.count_empty_block();
    assert!(matches!(db.put(&source), Err(DbError::FileTooLarge { .. })));
    // The data blocks taken before the failure are back in the free pool.
    assert_eq!(db.count_empty_block(), before);
}

#[test]
fn put_into_a_full_table_fails_without_allocating() {
    let (temp, config) = setup();
    let mut db = Db::open(&config, "library").unwrap();
    for i in 0..FCB_SLOT_CNT {
        let source = write_csv(&temp, &format!("f{i}.csv"), &[(1, "A", "B")]);
        db.put(&source).unwrap();
    }

    let before = db.count_empty_block();
    let extra = write_csv(&temp, "extra.csv", &[(1, "A", "B")]);
    assert!(matches!(db.put(&extra), Err(DbError::TableFull)));
    assert_eq!(db.count_empty_block(), before);
}

#[test]
fn allocation_shortfall_reports_needed_and_available() {
    let (_temp, config) = setup();
    let mut db = Db::open(&config, "library").unwrap();
    let capacity = BLOCK_CNT - DATA_REGION_START;

    db.allocate_blocks(capacity - 1).unwrap();
    let err = db.allocate_blocks(2).unwrap_err();
    assert!(matches!(
        err,
        DbError::AllocationShortfall { needed: 2, available: 1 }
    ));
}

// =============================================================================
// Sharding
// =============================================================================

#[test]
fn full_shard_pushes_put_into_next_suffix() {
    let (temp, config) = setup();
    let source = movies(&temp);

    // Fill shard 0 until fewer blocks remain than any put needs.
    {
        let mut shard0 = Db::open_shard(&config, "library", 0).unwrap();
        let capacity = BLOCK_CNT - DATA_REGION_START;
        shard0.allocate_blocks(capacity - 1).unwrap();
        shard0.flush().unwrap();
    }

    let mut db = db::select_shard(&config, "library", &source).unwrap();
    assert_eq!(db.suffix(), 1);
    db.put(&source).unwrap();

    let located = db::locate_shard(&config, "library", "movies.csv")
        .unwrap()
        .expect("stored file must be locatable");
    assert_eq!(located.suffix(), 1, "shard 1 holds the file, not shard 0");
    assert_eq!(
        located.find("movies.csv", 2).unwrap(),
        Some("Cars,Animation".to_string())
    );
}

#[test]
fn select_prefers_the_first_shard_with_room() {
    let (temp, config) = setup();
    let source = movies(&temp);

    let db = db::select_shard(&config, "library", &source).unwrap();
    assert_eq!(db.suffix(), 0);
}

#[test]
fn locate_miss_after_scanning_existing_shards() {
    let (_temp, config) = setup();
    let _shard0 = Db::open_shard(&config, "library", 0).unwrap();

    assert!(db::locate_shard(&config, "library", "ghost.csv")
        .unwrap()
        .is_none());
}

#[test]
fn ninth_file_overflows_into_a_new_shard() {
    let (temp, config) = setup();

    let mut sources = Vec::new();
    for i in 0..9 {
        sources.push(write_csv(
            &temp,
            &format!("file{i}.csv"),
            &[(1, "A", "B")],
        ));
    }

    for source in &sources {
        let mut db = db::select_shard(&config, "library", source).unwrap();
        db.put(source).unwrap();
    }

    // Eight FCB slots filled shard 0; the ninth file lands in shard 1.
    let located = db::locate_shard(&config, "library", "file8.csv")
        .unwrap()
        .unwrap();
    assert_eq!(located.suffix(), 1);
    assert_eq!(located.find("file8.csv", 1).unwrap(), Some("A,B".to_string()));
}

// =============================================================================
// Directory Operations
// =============================================================================

#[test]
fn dir_lists_shard_files() {
    let (_temp, config) = setup();
    let _a = Db::open(&config, "alpha").unwrap();
    let _b = Db::open(&config, "beta").unwrap();

    let files = db::dir(&config).unwrap();
    assert_eq!(files, vec!["alpha.db0".to_string(), "beta.db0".to_string()]);
}

#[test]
fn kill_deletes_only_the_named_database() {
    let (_temp, config) = setup();
    let _a = Db::open_shard(&config, "alpha", 0).unwrap();
    let _a1 = Db::open_shard(&config, "alpha", 1).unwrap();
    let _b = Db::open(&config, "beta").unwrap();

    db::kill(&config, "alpha").unwrap();

    let files = db::dir(&config).unwrap();
    assert_eq!(files, vec!["beta.db0".to_string()]);
}

// =============================================================================
// Record Source Round Trip
// =============================================================================

#[test]
fn recovered_map_writes_back_as_csv() {
    let (temp, config) = setup();
    let source = movies(&temp);

    let mut db = Db::open(&config, "library").unwrap();
    db.put(&source).unwrap();

    let lines = db.get("movies.csv").unwrap().unwrap();
    let out = temp.path().join("movies.csv.output");
    packdb::records::write_records(&lines, &out).unwrap();

    let reread = packdb::records::read_records(&out).unwrap();
    let expected: BTreeMap<u32, String> = [
        (1, "Up,Animation".to_string()),
        (2, "Cars,Animation".to_string()),
        (3, "Her,Drama".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(reread, expected);
}
