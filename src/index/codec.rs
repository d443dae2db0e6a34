//! Flat token-stream codec for the B-tree
//!
//! The tree serializes preorder into a comma-delimited token stream: per node
//! `leaf,keycount,` then each `key,value,` pair, then the children of an
//! internal node in order. The stream is plain ASCII so index blocks can be
//! trimmed on read by stripping trailing sentinel padding.
//!
//! Example for a root leaf holding (2, 11) and (5, 12):
//!
//! ```text
//! true,2,2,11,5,12,
//! ```

use crate::error::{DbError, Result};

use super::BTreeNode;

/// Serialize a tree into its token stream.
pub fn serialize(root: &BTreeNode) -> String {
    let mut out = String::new();
    serialize_node(root, &mut out);
    out
}

fn serialize_node(node: &BTreeNode, out: &mut String) {
    out.push_str(if node.leaf { "true," } else { "false," });
    out.push_str(&node.keys.len().to_string());
    out.push(',');
    for (key, val) in &node.keys {
        out.push_str(&key.to_string());
        out.push(',');
        out.push_str(&val.to_string());
        out.push(',');
    }
    if !node.leaf {
        for child in &node.children {
            serialize_node(child, out);
        }
    }
}

/// Reconstruct a tree from its token stream.
pub fn deserialize(data: &str) -> Result<BTreeNode> {
    let mut tokens = data.split(',').filter(|t| !t.is_empty());
    let root = deserialize_node(&mut tokens)?;
    Ok(root)
}

fn deserialize_node<'a, I>(tokens: &mut I) -> Result<BTreeNode>
where
    I: Iterator<Item = &'a str>,
{
    let leaf: bool = next_token(tokens)?
        .parse()
        .map_err(|_| corrupt("leaf flag is not a boolean"))?;
    let count: usize = next_token(tokens)?
        .parse()
        .map_err(|_| corrupt("key count is not an integer"))?;

    let mut node = BTreeNode::new(leaf);
    for _ in 0..count {
        let key: u32 = next_token(tokens)?
            .parse()
            .map_err(|_| corrupt("key is not an integer"))?;
        let val: u32 = next_token(tokens)?
            .parse()
            .map_err(|_| corrupt("value is not an integer"))?;
        node.keys.push((key, val));
    }

    if !leaf {
        for _ in 0..count + 1 {
            node.children.push(deserialize_node(tokens)?);
        }
    }

    Ok(node)
}

fn next_token<'a, I>(tokens: &mut I) -> Result<&'a str>
where
    I: Iterator<Item = &'a str>,
{
    tokens.next().ok_or_else(|| corrupt("truncated token stream"))
}

fn corrupt(msg: &str) -> DbError {
    DbError::Corruption(format!("index stream: {msg}"))
}
