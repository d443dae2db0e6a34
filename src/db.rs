//! Container (DB)
//!
//! One `Db` owns the in-memory image of a single shard file: its block
//! array, metadata, bitmap, and FCB table. Mutations (`put`, `remove`) run
//! entirely in memory and then rewrite the whole 1 MiB image in one pass, so
//! an operation that fails before `flush` leaves the on-disk image untouched.
//!
//! A logical database spans shard files `{name}.db0`, `{name}.db1`, ... in
//! one data directory. `select_shard` picks (or creates) the first shard
//! with room for an incoming source; `locate_shard` scans existing shards
//! for the one already holding a stored file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::bitmap::Bitmap;
use crate::block::Block;
use crate::config::Config;
use crate::entry::DataEntry;
use crate::error::{DbError, Result};
use crate::fcb::{Fcb, FcbTable, MAX_DATA_BLOCKS, MAX_INDEX_BLOCKS, NAME_SIZE, TYPE_SIZE};
use crate::index::{self, BTree};
use crate::layout::{
    BLOCK_CNT, BLOCK_SIZE, DATA_REGION_START, ENTRIES_PER_BLOCK, FCB_REGION_START, FCB_SLOT_CNT,
    FILE_SIZE, FILE_SUFFIX,
};
use crate::metadata::Metadata;
use crate::records;

/// In-memory image of one open shard
pub struct Db {
    data_dir: PathBuf,
    metadata: Metadata,
    bitmap: Bitmap,
    fcbs: FcbTable,
    blocks: Vec<Block>,
}

impl Db {
    // =========================================================================
    // Open / Create
    // =========================================================================

    /// Open shard 0 of `db_name`, creating it if absent.
    pub fn open(config: &Config, db_name: &str) -> Result<Self> {
        Self::open_shard(config, db_name, 0)
    }

    /// Open one shard of `db_name`. A missing shard file means "create a
    /// fresh container", never an error.
    pub fn open_shard(config: &Config, db_name: &str, suffix: u32) -> Result<Self> {
        let path = shard_path(&config.data_dir, db_name, suffix);
        if !path.exists() {
            return Self::create(config, db_name, suffix);
        }

        let data = fs::read(&path)?;
        if data.len() != FILE_SIZE {
            return Err(DbError::Corruption(format!(
                "shard {} is {} bytes, expected {}",
                path.display(),
                data.len(),
                FILE_SIZE
            )));
        }

        let mut blocks = Vec::with_capacity(BLOCK_CNT);
        for i in 0..BLOCK_CNT {
            let chunk: &[u8; BLOCK_SIZE] = data[i * BLOCK_SIZE..][..BLOCK_SIZE]
                .try_into()
                .expect("exact block slice");
            blocks.push(Block::from_bytes(chunk));
        }

        let metadata = Metadata::deserialize(&blocks[0].data);

        let mut bitmap_bytes = [0u8; Bitmap::SERIALIZED_LEN];
        bitmap_bytes[..BLOCK_SIZE].copy_from_slice(&blocks[1].data);
        bitmap_bytes[BLOCK_SIZE..].copy_from_slice(&blocks[2].data);
        let bitmap = Bitmap::deserialize(&bitmap_bytes);

        let mut slots = Vec::with_capacity(FCB_SLOT_CNT);
        for i in 0..FCB_SLOT_CNT {
            slots.push(Fcb::deserialize(&blocks[FCB_REGION_START + i].data)?);
        }
        let fcbs = FcbTable::from_slots(slots);

        Ok(Self {
            data_dir: config.data_dir.clone(),
            metadata,
            bitmap,
            fcbs,
            blocks,
        })
    }

    fn create(config: &Config, db_name: &str, suffix: u32) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let db = Self {
            data_dir: config.data_dir.clone(),
            metadata: Metadata::new(db_name, suffix),
            bitmap: Bitmap::new(),
            fcbs: FcbTable::new(),
            blocks: vec![Block::new(); BLOCK_CNT],
        };
        db.flush()?;

        info!(db = db_name, suffix, "created new shard");
        Ok(db)
    }

    /// Database name from the metadata block.
    pub fn name(&self) -> &str {
        &self.metadata.db_name
    }

    /// Shard suffix from the metadata block.
    pub fn suffix(&self) -> u32 {
        self.metadata.suffix
    }

    // =========================================================================
    // Core Operations
    // =========================================================================

    /// Store a record source in this shard.
    ///
    /// Parses the source, packs its entries into freshly allocated data
    /// blocks, builds and serializes the id→block-id B-tree into index
    /// blocks, records an FCB, and flushes the whole image. Any failure
    /// before the flush leaves the on-disk image unchanged.
    pub fn put(&mut self, source: &Path) -> Result<()> {
        let lines = records::read_records(source)?;
        let (name, kind) = derive_identity(source);

        // A full table must abort before any block is allocated.
        if self.fcbs.live_count() == FCB_SLOT_CNT {
            return Err(DbError::TableFull);
        }

        // Data blocks: five entries per block.
        let data_block_num = lines.len().div_ceil(ENTRIES_PER_BLOCK);
        if data_block_num > MAX_DATA_BLOCKS {
            return Err(DbError::FileTooLarge {
                blocks: data_block_num,
            });
        }
        let data_blocks = self.allocate_blocks(data_block_num)?;

        let mut id_to_block: BTreeMap<u32, u32> = BTreeMap::new();
        let mut p = 0usize;
        let mut active = false;
        for (id, val) in &lines {
            if !active {
                active = true;
                self.start_data_block(data_blocks[p]);
            } else if self.blocks[data_blocks[p] as usize].is_full() {
                p += 1;
                self.start_data_block(data_blocks[p]);
            }
            let entry = DataEntry::new(*id, val.as_str());
            self.blocks[data_blocks[p] as usize].write(&entry.encode())?;
            id_to_block.insert(*id, data_blocks[p]);
        }
        if active {
            self.blocks[data_blocks[p] as usize].fill_remaining();
        }

        // Index blocks: serialize the tree and chunk the stream.
        let mut tree = BTree::new();
        for (id, block) in &id_to_block {
            tree.insert(*id, *block);
        }
        let stream = index::serialize(tree.root());
        let bytes = stream.as_bytes();

        let index_block_num = bytes.len().div_ceil(BLOCK_SIZE);
        let allocated = if index_block_num > MAX_INDEX_BLOCKS {
            Err(DbError::FileTooLarge {
                blocks: index_block_num,
            })
        } else {
            self.allocate_blocks(index_block_num)
        };
        let index_blocks = match allocated {
            Ok(blocks) => blocks,
            Err(e) => {
                // Hand the data blocks back; nothing was flushed.
                for bid in &data_blocks {
                    self.bitmap.free(*bid);
                }
                return Err(e);
            }
        };

        for (i, bid) in index_blocks.iter().enumerate() {
            let from = i * BLOCK_SIZE;
            let to = bytes.len().min(from + BLOCK_SIZE);
            let block = &mut self.blocks[*bid as usize];
            *block = Block::new();
            block.write(&bytes[from..to])?;
            if i == index_blocks.len() - 1 {
                block.fill_remaining();
            }
        }

        debug!(
            file = %source.display(),
            records = lines.len(),
            data_blocks = data_blocks.len(),
            index_blocks = index_blocks.len(),
            "packed source into blocks"
        );

        self.fcbs
            .add(Fcb::new(&name, &kind, index_blocks, data_blocks))?;

        self.flush()?;
        info!(db = %self.name(), suffix = self.suffix(), file = %name, "put complete");
        Ok(())
    }

    /// Recover every record of a stored file as an ordered id→text map.
    ///
    /// Returns `None` when no FCB matches the derived (name, type).
    pub fn get(&self, source_name: &str) -> Result<Option<BTreeMap<u32, String>>> {
        let (name, kind) = derive_identity(Path::new(source_name));
        let fcb = match self.fcbs.find(&name, &kind) {
            Some(fcb) => fcb,
            None => return Ok(None),
        };

        let mut lines = BTreeMap::new();
        for bid in &fcb.data_blocks {
            for entry in self.blocks[*bid as usize].entries()? {
                lines.insert(entry.id, entry.val);
            }
        }
        Ok(Some(lines))
    }

    /// Look up one record by id via the stored B-tree index.
    ///
    /// Reconstitutes the tree from the file's index blocks, searches it for
    /// the data-block id, then scans that block for the exact id. A missing
    /// file or missing id is `None`.
    pub fn find(&self, source_name: &str, id: u32) -> Result<Option<String>> {
        let (name, kind) = derive_identity(Path::new(source_name));
        let fcb = match self.fcbs.find(&name, &kind) {
            Some(fcb) => fcb,
            None => return Ok(None),
        };

        let mut stream = Vec::new();
        for bid in &fcb.index_blocks {
            let block = &self.blocks[*bid as usize];
            stream.extend_from_slice(&block.data[..block.valid_len()]);
        }
        let text = std::str::from_utf8(&stream)
            .map_err(|_| DbError::Corruption("index stream is not UTF-8".into()))?;
        let tree = BTree::from_root(index::deserialize(text)?);

        let data_block = match tree.search(id) {
            Some(bid) => bid,
            None => return Ok(None),
        };
        for entry in self.blocks[data_block as usize].entries()? {
            if entry.id == id {
                return Ok(Some(entry.val));
            }
        }
        Ok(None)
    }

    /// Remove a stored file: free its index and data blocks, reset its FCB
    /// slot, flush. Returns whether anything was removed.
    ///
    /// The index is simply discarded with its blocks; there is no tree
    /// deletion or rebalancing.
    pub fn remove(&mut self, source_name: &str) -> Result<bool> {
        let (name, kind) = derive_identity(Path::new(source_name));
        let removed = match self.fcbs.remove(&name, &kind, &mut self.bitmap) {
            Some(fcb) => fcb,
            None => return Ok(false),
        };

        for bid in removed
            .index_blocks
            .iter()
            .chain(removed.data_blocks.iter())
        {
            self.blocks[*bid as usize] = Block::new();
        }

        self.flush()?;
        info!(db = %self.name(), suffix = self.suffix(), file = %name, "removed stored file");
        Ok(true)
    }

    // =========================================================================
    // Allocator Forwarders
    // =========================================================================

    /// Free blocks remaining in this shard's data region.
    pub fn count_empty_block(&self) -> usize {
        self.bitmap.count_free()
    }

    /// Allocate exactly `n` blocks or fail with `AllocationShortfall`,
    /// leaving the bitmap untouched on failure.
    pub fn allocate_blocks(&mut self, n: usize) -> Result<Vec<u32>> {
        let available = self.bitmap.count_free();
        if available < n {
            return Err(DbError::AllocationShortfall {
                needed: n,
                available,
            });
        }
        Ok(self.bitmap.allocate(n))
    }

    /// Occupied FCB slots in this shard.
    pub fn live_files(&self) -> usize {
        self.fcbs.live_count()
    }

    fn start_data_block(&mut self, bid: u32) {
        let block = &mut self.blocks[bid as usize];
        *block = Block::new();
        block.init_data_header();
    }

    // =========================================================================
    // Flush
    // =========================================================================

    /// Rewrite the whole container image: metadata block, bitmap, the eight
    /// FCB slots, then every block of the data region, in that fixed order.
    pub fn flush(&self) -> Result<()> {
        let mut image = Vec::with_capacity(FILE_SIZE);
        image.extend_from_slice(&self.metadata.serialize());
        image.extend_from_slice(&self.bitmap.serialize());
        for fcb in self.fcbs.slots() {
            image.extend_from_slice(&fcb.serialize());
        }
        for block in &self.blocks[DATA_REGION_START..] {
            image.extend_from_slice(&block.data);
        }
        debug_assert_eq!(image.len(), FILE_SIZE);

        let path = shard_path(&self.data_dir, &self.metadata.db_name, self.metadata.suffix);
        fs::write(&path, image)?;
        debug!(shard = %path.display(), "flushed container image");
        Ok(())
    }
}

// =============================================================================
// Multi-Shard Selection
// =============================================================================

/// Pick the first shard of `db_name` with room for `source`, opening shards
/// in increasing suffix order and creating a fresh one when every existing
/// shard is too full. "Room" means both enough free blocks and a free FCB
/// slot; a shard with eight live files takes no more.
pub fn select_shard(config: &Config, db_name: &str, source: &Path) -> Result<Db> {
    let needed = estimate_blocks(source)?;
    for suffix in 0.. {
        let db = Db::open_shard(config, db_name, suffix)?;
        if db.count_empty_block() >= needed && db.live_files() < FCB_SLOT_CNT {
            debug!(db = db_name, suffix, needed, "selected shard");
            return Ok(db);
        }
    }
    unreachable!("a fresh shard always has capacity once `needed` fits a container")
}

/// Estimate the blocks a source will occupy: data blocks plus the index
/// blocks of a placeholder tree built over the same key set.
fn estimate_blocks(source: &Path) -> Result<usize> {
    let lines = records::read_records(source)?;

    let data_block_num = lines.len().div_ceil(ENTRIES_PER_BLOCK);
    if data_block_num > MAX_DATA_BLOCKS {
        return Err(DbError::FileTooLarge {
            blocks: data_block_num,
        });
    }

    // Worst-case placeholder value: the widest block id a shard can hold,
    // so the estimate never undershoots the real serialized length.
    let mut tree = BTree::new();
    for id in lines.keys() {
        tree.insert(*id, (BLOCK_CNT - 1) as u32);
    }
    let index_block_num = tree.serialized_len().div_ceil(BLOCK_SIZE);
    if index_block_num > MAX_INDEX_BLOCKS {
        return Err(DbError::FileTooLarge {
            blocks: index_block_num,
        });
    }

    Ok(data_block_num + index_block_num)
}

/// Scan shards in increasing suffix order for the one whose FCB table holds
/// `source_name`. `None` once the next shard file does not exist.
pub fn locate_shard(config: &Config, db_name: &str, source_name: &str) -> Result<Option<Db>> {
    let (name, kind) = derive_identity(Path::new(source_name));
    for suffix in 0.. {
        if !shard_path(&config.data_dir, db_name, suffix).exists() {
            return Ok(None);
        }
        let db = Db::open_shard(config, db_name, suffix)?;
        if db.fcbs.find(&name, &kind).is_some() {
            return Ok(Some(db));
        }
    }
    unreachable!("loop exits when a shard file is absent")
}

// =============================================================================
// Directory Operations
// =============================================================================

/// List every file in the data directory.
pub fn dir(config: &Config) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if !config.data_dir.exists() {
        return Ok(names);
    }
    for entry in fs::read_dir(&config.data_dir)? {
        let entry = entry?;
        if entry.path().is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Delete every shard file of `db_name`.
pub fn kill(config: &Config, db_name: &str) -> Result<()> {
    if !config.data_dir.exists() {
        return Ok(());
    }
    let prefix = format!("{db_name}{FILE_SUFFIX}");
    for entry in fs::read_dir(&config.data_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_shard = name
            .strip_prefix(&prefix)
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()));
        if is_shard && entry.path().is_file() {
            fs::remove_file(entry.path())?;
            info!(shard = %name, "deleted shard file");
        }
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Path of one shard file: `{data_dir}/{db}.db{suffix}`.
pub fn shard_path(data_dir: &Path, db_name: &str, suffix: u32) -> PathBuf {
    data_dir.join(format!("{db_name}{FILE_SUFFIX}{suffix}"))
}

/// Derive the FCB identity of a source: name = file stem truncated to the
/// name field width, type = lowercased extension truncated to the type
/// field width.
fn derive_identity(source: &Path) -> (String, String) {
    let name = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = source
        .extension()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    (truncate_field(name, NAME_SIZE), truncate_field(kind, TYPE_SIZE))
}

fn truncate_field(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}

