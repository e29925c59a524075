//! Modified Merkle-Patricia Trie over RLP values, keyed by Keccak-256 of the
//! logical key.
//!
//! This crate owns node shape, hex-prefix nibble paths, and the
//! insert/remove/get algorithms; it knows nothing about accounts or storage
//! slots — `evmcore_state` supplies the key hashing and RLP value shape for
//! the two tries it builds on top of this one (the account trie and each
//! account's per-slot storage trie).

mod error;
pub use error::Error;

mod nibbles;
pub use nibbles::{hex_prefix_decode, hex_prefix_encode, Nibbles};

mod node;
pub use node::{Node, NodeRef};

mod store;
pub use store::{MemoryNodeStore, NodeStore};

use alloy_primitives::B256;

/// A Modified Merkle-Patricia Trie rooted at `root`, backed by a [`NodeStore`].
///
/// Insert/remove mutate `store` in place and update `root`; `get` is a pure
/// read. The trie never holds a live borrow of any node across calls — every
/// operation resolves nodes from `store` fresh, so callers may commit,
/// snapshot, or share the store between tries (e.g. one per account's
/// storage) without aliasing concerns.
#[derive(Debug, Clone)]
pub struct Trie<S> {
    root: NodeRef,
    store: S,
}

impl<S: NodeStore> Trie<S> {
    /// An empty trie: `root_hash() == EMPTY_ROOT_HASH`.
    pub fn new(store: S) -> Self {
        Self {
            root: NodeRef::Empty,
            store,
        }
    }

    /// Resumes a trie whose root node is already present in `store`.
    pub fn from_root(root: B256, store: S) -> Self {
        Self {
            root: NodeRef::Hashed(root),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The Keccak-256 of this trie's top node — the value committed as
    /// `state_root`/an account's `storage_root`.
    pub fn root_hash(&self) -> B256 {
        match &self.root {
            NodeRef::Empty => *evmcore_primitives::EMPTY_ROOT_HASH,
            NodeRef::Hashed(h) => *h,
            NodeRef::Embedded(bytes) => alloy_primitives::keccak256(bytes),
        }
    }

    /// Looks up `key` (already hashed/hex-nibble'd by the caller per the
    /// trie contract — account keys are `keccak256(address)`, storage keys
    /// are `keccak256(key_word_big_endian)`). Returns `None` for an absent
    /// key, matching "storage keys absent from the trie read as zero".
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        let path = Nibbles::from_bytes(key);
        get_at(&self.root, &path.0, &self.store)
    }

    /// Inserts or overwrites `key -> value`. `value` must be non-empty;
    /// writing an empty value is a remove at the caller's level (§3's
    /// "writing zero to a key removes it" is enforced by `evmcore_state`,
    /// not here).
    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), Error> {
        let path = Nibbles::from_bytes(key);
        self.root = insert_at(&self.root, &path.0, value, &mut self.store)?;
        Ok(())
    }

    /// Removes `key` if present; a no-op if absent.
    pub fn remove(&mut self, key: &[u8]) -> Result<(), Error> {
        let path = Nibbles::from_bytes(key);
        self.root = remove_at(&self.root, &path.0, &mut self.store)?.unwrap_or(NodeRef::Empty);
        Ok(())
    }
}

fn get_at<S: NodeStore>(node_ref: &NodeRef, path: &[u8], store: &S) -> Result<Option<Vec<u8>>, Error> {
    let node = node_ref.resolve(store)?;
    match node {
        Node::Empty => Ok(None),
        Node::Leaf { path: leaf_path, value } => {
            if leaf_path.0 == path {
                Ok(Some(value))
            } else {
                Ok(None)
            }
        }
        Node::Extension { path: ext_path, child } => {
            if path.len() < ext_path.len() || path[..ext_path.len()] != ext_path.0[..] {
                Ok(None)
            } else {
                get_at(&child, &path[ext_path.len()..], store)
            }
        }
        Node::Branch { children, value } => {
            if path.is_empty() {
                Ok(value)
            } else {
                get_at(&children[path[0] as usize], &path[1..], store)
            }
        }
    }
}

fn insert_at<S: NodeStore>(
    node_ref: &NodeRef,
    path: &[u8],
    value: Vec<u8>,
    store: &mut S,
) -> Result<NodeRef, Error> {
    let node = node_ref.resolve(store)?;
    let new_node = match node {
        Node::Empty => Node::Leaf {
            path: Nibbles(path.to_vec()),
            value,
        },
        Node::Leaf { path: leaf_path, value: leaf_value } => {
            let common = leaf_path.common_prefix_len(path);
            if common == leaf_path.len() && common == path.len() {
                Node::Leaf { path: leaf_path, value }
            } else {
                branch_from_two(
                    &leaf_path.0,
                    leaf_value,
                    &path[common.min(path.len())..],
                    Some((common, &leaf_path, path, value)),
                    store,
                )?
            }
        }
        Node::Extension { path: ext_path, child } => {
            let common = ext_path.common_prefix_len(path);
            if common == ext_path.len() {
                let new_child = insert_at(&child, &path[common..], value, store)?;
                Node::Extension { path: ext_path, child: new_child }
            } else {
                split_extension(&ext_path, &child, common, path, value, store)?
            }
        }
        Node::Branch { mut children, value: branch_value } => {
            if path.is_empty() {
                Node::Branch { children, value: Some(value) }
            } else {
                let idx = path[0] as usize;
                children[idx] = insert_at(&children[idx], &path[1..], value, store)?;
                Node::Branch { children, value: branch_value }
            }
        }
    };
    Ok(NodeRef::from_node(&new_node, store))
}

/// Builds a branch (plus a leaf/extension above it as needed) splitting two
/// leaf paths that diverge after `common` shared nibbles. `existing` carries
/// the full (leaf_path, path) pair only for the leaf/leaf split case.
fn branch_from_two<S: NodeStore>(
    leaf_path: &[u8],
    leaf_value: Vec<u8>,
    _unused: &[u8],
    existing: Option<(usize, &Nibbles, &[u8], Vec<u8>)>,
    store: &mut S,
) -> Result<Node, Error> {
    let (common, full_leaf_path, full_new_path, new_value) =
        existing.expect("branch_from_two always called with the leaf/leaf case");
    let _ = leaf_path;
    let mut branch = Node::empty_branch();
    let mut branch_value = None;

    let leaf_rest = &full_leaf_path.0[common..];
    let new_rest = &full_new_path[common..];

    if leaf_rest.is_empty() {
        branch_value = Some(leaf_value.clone());
    } else {
        let nibble = leaf_rest[0];
        let sub_path = Nibbles(leaf_rest[1..].to_vec());
        let sub = Node::Leaf { path: sub_path, value: leaf_value };
        if let Node::Branch { children, .. } = &mut branch {
            children[nibble as usize] = NodeRef::from_node(&sub, store);
        }
    }

    if new_rest.is_empty() {
        branch_value = Some(new_value.clone());
    } else {
        let nibble = new_rest[0];
        let sub_path = Nibbles(new_rest[1..].to_vec());
        let sub = Node::Leaf { path: sub_path, value: new_value };
        if let Node::Branch { children, .. } = &mut branch {
            children[nibble as usize] = NodeRef::from_node(&sub, store);
        }
    }

    if let Node::Branch { value, .. } = &mut branch {
        *value = branch_value;
    }

    if common == 0 {
        Ok(branch)
    } else {
        let branch_ref = NodeRef::from_node(&branch, store);
        Ok(Node::Extension {
            path: Nibbles(full_leaf_path.0[..common].to_vec()),
            child: branch_ref,
        })
    }
}

fn split_extension<S: NodeStore>(
    ext_path: &Nibbles,
    child: &NodeRef,
    common: usize,
    new_path: &[u8],
    value: Vec<u8>,
    store: &mut S,
) -> Result<Node, Error> {
    let mut branch = Node::empty_branch();
    let mut branch_value = None;

    let ext_rest = &ext_path.0[common..];
    let new_rest = &new_path[common..];

    // the extension's remaining path (after the branch nibble) re-wraps its
    // original child, collapsing to a direct child ref if nothing remains.
    if ext_rest.len() == 1 {
        if let Node::Branch { children, .. } = &mut branch {
            children[ext_rest[0] as usize] = child.clone();
        }
    } else {
        let sub = Node::Extension {
            path: Nibbles(ext_rest[1..].to_vec()),
            child: child.clone(),
        };
        let sub_ref = NodeRef::from_node(&sub, store);
        if let Node::Branch { children, .. } = &mut branch {
            children[ext_rest[0] as usize] = sub_ref;
        }
    }

    if new_rest.is_empty() {
        branch_value = Some(value);
    } else {
        let nibble = new_rest[0];
        let sub = Node::Leaf {
            path: Nibbles(new_rest[1..].to_vec()),
            value,
        };
        let sub_ref = NodeRef::from_node(&sub, store);
        if let Node::Branch { children, .. } = &mut branch {
            children[nibble as usize] = sub_ref;
        }
    }

    if let Node::Branch { value, .. } = &mut branch {
        *value = branch_value;
    }

    if common == 0 {
        Ok(branch)
    } else {
        let branch_ref = NodeRef::from_node(&branch, store);
        Ok(Node::Extension {
            path: Nibbles(ext_path.0[..common].to_vec()),
            child: branch_ref,
        })
    }
}

/// Removes `path` below `node_ref`, returning `Ok(None)` if the resulting
/// subtree is empty (so the caller collapses its own reference to it).
fn remove_at<S: NodeStore>(
    node_ref: &NodeRef,
    path: &[u8],
    store: &mut S,
) -> Result<Option<NodeRef>, Error> {
    let node = node_ref.resolve(store)?;
    match node {
        Node::Empty => Ok(None),
        Node::Leaf { path: leaf_path, .. } => {
            if leaf_path.0 == path {
                Ok(None)
            } else {
                Ok(Some(node_ref.clone()))
            }
        }
        Node::Extension { path: ext_path, child } => {
            if path.len() < ext_path.len() || path[..ext_path.len()] != ext_path.0[..] {
                return Ok(Some(node_ref.clone()));
            }
            match remove_at(&child, &path[ext_path.len()..], store)? {
                None => Ok(None),
                Some(new_child) => Ok(Some(merge_extension(&ext_path, new_child, store)?)),
            }
        }
        Node::Branch { mut children, value } => {
            if path.is_empty() {
                if value.is_none() {
                    return Ok(Some(node_ref.clone()));
                }
                Ok(Some(collapse_branch(children, None, store)?))
            } else {
                let idx = path[0] as usize;
                match remove_at(&children[idx], &path[1..], store)? {
                    None => {
                        children[idx] = NodeRef::Empty;
                        Ok(Some(collapse_branch(children, value, store)?))
                    }
                    Some(new_child) => {
                        children[idx] = new_child;
                        let node = Node::Branch { children, value };
                        Ok(Some(NodeRef::from_node(&node, store)))
                    }
                }
            }
        }
    }
}

/// After removing one child from a branch, collapses it to a leaf/extension
/// if exactly one child (or only a value) remains — the MPT invariant that a
/// branch always has >=2 live slots (counting its own value as one).
fn collapse_branch<S: NodeStore>(
    children: [NodeRef; 16],
    value: Option<Vec<u8>>,
    store: &mut S,
) -> Result<NodeRef, Error> {
    let live: Vec<usize> = children
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_empty())
        .map(|(i, _)| i)
        .collect();

    if live.is_empty() {
        return match value {
            Some(v) => Ok(NodeRef::from_node(&Node::Leaf { path: Nibbles::default(), value: v }, store)),
            None => Ok(NodeRef::Empty),
        };
    }

    if live.len() == 1 && value.is_none() {
        let idx = live[0];
        let child = children[idx].resolve(store)?;
        let node = match child {
            Node::Leaf { path, value } => Node::Leaf {
                path: path.prepend(idx as u8),
                value,
            },
            Node::Extension { path, child: grandchild } => Node::Extension {
                path: path.prepend(idx as u8),
                child: grandchild,
            },
            Node::Branch { .. } => Node::Extension {
                path: Nibbles(vec![idx as u8]),
                child: children[idx].clone(),
            },
            Node::Empty => unreachable!("live child resolved to Empty"),
        };
        return Ok(NodeRef::from_node(&node, store));
    }

    Ok(NodeRef::from_node(&Node::Branch { children, value }, store))
}

/// After removing from an extension's child and finding it collapsed,
/// re-threads the extension's own path in front of whatever remains.
fn merge_extension<S: NodeStore>(
    ext_path: &Nibbles,
    new_child: NodeRef,
    store: &mut S,
) -> Result<NodeRef, Error> {
    let child_node = new_child.resolve(store)?;
    let node = match child_node {
        Node::Leaf { path, value } => Node::Leaf {
            path: ext_path.concat(&path),
            value,
        },
        Node::Extension { path, child } => Node::Extension {
            path: ext_path.concat(&path),
            child,
        },
        Node::Branch { .. } => Node::Extension {
            path: ext_path.clone(),
            child: new_child,
        },
        Node::Empty => return Ok(NodeRef::Empty),
    };
    Ok(NodeRef::from_node(&node, store))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie() -> Trie<MemoryNodeStore> {
        Trie::new(MemoryNodeStore::new())
    }

    #[test]
    fn empty_trie_root_is_canonical() {
        let t = trie();
        assert_eq!(t.root_hash(), *evmcore_primitives::EMPTY_ROOT_HASH);
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut t = trie();
        t.insert(b"dog", b"puppy".to_vec()).unwrap();
        t.insert(b"doge", b"coin".to_vec()).unwrap();
        t.insert(b"horse", b"stallion".to_vec()).unwrap();
        assert_eq!(t.get(b"dog").unwrap(), Some(b"puppy".to_vec()));
        assert_eq!(t.get(b"doge").unwrap(), Some(b"coin".to_vec()));
        assert_eq!(t.get(b"horse").unwrap(), Some(b"stallion".to_vec()));
        assert_eq!(t.get(b"cat").unwrap(), None);
    }

    #[test]
    fn order_independent_root_hash() {
        let pairs: Vec<(&[u8], Vec<u8>)> = vec![
            (b"a", b"1".to_vec()),
            (b"aa", b"2".to_vec()),
            (b"aabb", b"3".to_vec()),
            (b"b", b"4".to_vec()),
        ];
        let mut t1 = trie();
        for (k, v) in &pairs {
            t1.insert(k, v.clone()).unwrap();
        }
        let mut t2 = trie();
        for (k, v) in pairs.iter().rev() {
            t2.insert(k, v.clone()).unwrap();
        }
        assert_eq!(t1.root_hash(), t2.root_hash());
    }

    #[test]
    fn remove_is_inverse_of_insert() {
        let mut t = trie();
        t.insert(b"dog", b"puppy".to_vec()).unwrap();
        let root_before = t.root_hash();
        t.insert(b"doge", b"coin".to_vec()).unwrap();
        t.remove(b"doge").unwrap();
        assert_eq!(t.root_hash(), root_before);
    }

    #[test]
    fn remove_all_yields_empty_root() {
        let mut t = trie();
        t.insert(b"dog", b"puppy".to_vec()).unwrap();
        t.insert(b"doge", b"coin".to_vec()).unwrap();
        t.insert(b"horse", b"stallion".to_vec()).unwrap();
        t.remove(b"dog").unwrap();
        t.remove(b"doge").unwrap();
        t.remove(b"horse").unwrap();
        assert_eq!(t.root_hash(), *evmcore_primitives::EMPTY_ROOT_HASH);
    }

    #[test]
    fn overwrite_existing_key() {
        let mut t = trie();
        t.insert(b"dog", b"puppy".to_vec()).unwrap();
        t.insert(b"dog", b"hound".to_vec()).unwrap();
        assert_eq!(t.get(b"dog").unwrap(), Some(b"hound".to_vec()));
    }
}
