//! Multiway search tree (minimum degree 3)
//!
//! Standard B-tree insertion: a full root is split before descent (the tree
//! grows upward), and any full child met on the way down is split first so
//! the insert always lands in a non-full node. Nodes hold up to `2t - 1`
//! sorted (key, value) pairs; internal nodes hold one more child than keys;
//! all leaves sit at the same depth.

/// Minimum degree `t`: nodes hold between `t - 1` and `2t - 1` keys
/// (root excepted on the low end).
pub const MIN_DEGREE: usize = 3;

const MAX_KEYS: usize = 2 * MIN_DEGREE - 1;

/// One node of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BTreeNode {
    pub leaf: bool,
    /// Sorted (key, value) pairs
    pub keys: Vec<(u32, u32)>,
    /// Child subtrees; empty for leaves, `keys.len() + 1` long otherwise
    pub children: Vec<BTreeNode>,
}

impl BTreeNode {
    pub fn new(leaf: bool) -> Self {
        Self {
            leaf,
            keys: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// B-tree mapping record id to data-block id
#[derive(Debug, Clone)]
pub struct BTree {
    root: BTreeNode,
}

impl BTree {
    /// An empty tree: a single leaf root with no keys.
    pub fn new() -> Self {
        Self {
            root: BTreeNode::new(true),
        }
    }

    /// Adopt a deserialized root.
    pub fn from_root(root: BTreeNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &BTreeNode {
        &self.root
    }

    /// Insert a (key, value) pair, splitting the root first if it is full.
    pub fn insert(&mut self, key: u32, val: u32) {
        if self.root.keys.len() == MAX_KEYS {
            let old_root = std::mem::replace(&mut self.root, BTreeNode::new(false));
            self.root.children.push(old_root);
            split_child(&mut self.root, 0);
        }
        insert_non_full(&mut self.root, key, val);
    }

    /// Exact-match search; a miss at a leaf is `None`.
    pub fn search(&self, key: u32) -> Option<u32> {
        search_node(&self.root, key)
    }

    /// All (key, value) pairs in ascending key order.
    pub fn pairs(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        collect_in_order(&self.root, &mut out);
        out
    }

    /// Serialized byte length of the tree (see [`crate::index::serialize`]).
    pub fn serialized_len(&self) -> usize {
        crate::index::serialize(&self.root).len()
    }
}

impl Default for BTree {
    fn default() -> Self {
        Self::new()
    }
}

fn search_node(node: &BTreeNode, key: u32) -> Option<u32> {
    let mut i = 0;
    while i < node.keys.len() && key > node.keys[i].0 {
        i += 1;
    }
    if i < node.keys.len() && key == node.keys[i].0 {
        Some(node.keys[i].1)
    } else if node.leaf {
        None
    } else {
        search_node(&node.children[i], key)
    }
}

fn insert_non_full(node: &mut BTreeNode, key: u32, val: u32) {
    let mut i = node
        .keys
        .iter()
        .position(|(k, _)| key < *k)
        .unwrap_or(node.keys.len());

    if node.leaf {
        node.keys.insert(i, (key, val));
    } else {
        if node.children[i].keys.len() == MAX_KEYS {
            split_child(node, i);
            if key > node.keys[i].0 {
                i += 1;
            }
        }
        insert_non_full(&mut node.children[i], key, val);
    }
}

/// Split the full child `parent.children[i]`: its median key moves up into
/// `parent` at position `i`, and the upper half of its keys (and children,
/// if internal) move into a new right sibling at `i + 1`.
fn split_child(parent: &mut BTreeNode, i: usize) {
    let t = MIN_DEGREE;
    let child = &mut parent.children[i];
    debug_assert_eq!(child.keys.len(), MAX_KEYS);

    let mut sibling = BTreeNode::new(child.leaf);
    sibling.keys = child.keys.split_off(t);
    let median = child.keys.pop().expect("full child has a median key");
    if !child.leaf {
        sibling.children = child.children.split_off(t);
    }

    parent.children.insert(i + 1, sibling);
    parent.keys.insert(i, median);
}

fn collect_in_order(node: &BTreeNode, out: &mut Vec<(u32, u32)>) {
    for (i, pair) in node.keys.iter().enumerate() {
        if !node.leaf {
            collect_in_order(&node.children[i], out);
        }
        out.push(*pair);
    }
    if !node.leaf {
        if let Some(last) = node.children.last() {
            collect_in_order(last, out);
        }
    }
}
