//! B-tree index
//!
//! In-memory sorted map from record id to the data-block id holding that
//! record. The tree is rebuilt from scratch on every `put`, serialized into
//! index blocks, and reconstructed transiently during `find`. There is no
//! deletion: removing a file discards its index blocks wholesale.

mod btree;
mod codec;

pub use btree::{BTree, BTreeNode, MIN_DEGREE};
pub use codec::{deserialize, serialize};
