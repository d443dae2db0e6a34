//! Record source collaborator
//!
//! The thin text I/O edge of the store: parses a delimited record source
//! (`id,name,type` rows) into an ordered id→text map, and writes such a map
//! back out in the same shape. The stored text value is `name + "," + type`,
//! truncated to the 40-byte entry field if longer.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::layout::ENTRY_VAL_SIZE;

/// Parse a CSV source into an ordered id→text map.
///
/// Rows that do not have exactly three fields are skipped; a row whose id
/// field is not an integer is an error.
pub fn read_records(path: &Path) -> Result<BTreeMap<u32, String>> {
    let contents = fs::read_to_string(path)?;
    let mut records = BTreeMap::new();

    for line in contents.lines() {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != 3 {
            continue;
        }
        let id: u32 = parts[0]
            .trim()
            .parse()
            .map_err(|_| DbError::BadRecord(format!("non-integer id in row: {line}")))?;
        let val = format!("{},{}", parts[1].trim(), parts[2].trim());
        records.insert(id, truncate(val));
    }

    Ok(records)
}

/// Write an id→text map back out as `id,name,type` rows in id order.
pub fn write_records(records: &BTreeMap<u32, String>, path: &Path) -> Result<()> {
    let mut out = fs::File::create(path)?;
    for (id, val) in records {
        writeln!(out, "{id},{val}")?;
    }
    Ok(())
}

/// Truncate to the entry value field width on a UTF-8 boundary.
fn truncate(mut val: String) -> String {
    if val.len() <= ENTRY_VAL_SIZE {
        return val;
    }
    let mut cut = ENTRY_VAL_SIZE;
    while !val.is_char_boundary(cut) {
        cut -= 1;
    }
    val.truncate(cut);
    val
}
