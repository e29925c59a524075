use crate::Error;
use alloy_primitives::B256;
use std::collections::HashMap;

/// A content-addressed store of RLP-encoded trie nodes, keyed by the
/// Keccak-256 of their encoding — the "persisted state layout" node store.
///
/// Only nodes whose encoding is 32 bytes or longer are ever written here;
/// shorter nodes are inlined directly into their parent's encoding.
pub trait NodeStore {
    fn get_node(&self, hash: &B256) -> Result<Option<Vec<u8>>, Error>;
    fn put_node(&mut self, hash: B256, rlp: Vec<u8>);
}

/// An in-memory, append-only node store backed by a hash map — the arena
/// described for the trie's node cache, with no LRU eviction since nodes
/// are cheap RLP blobs and a full client would back this with a disk KV
/// store instead of evicting.
#[derive(Debug, Clone, Default)]
pub struct MemoryNodeStore {
    nodes: HashMap<B256, Vec<u8>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeStore for MemoryNodeStore {
    fn get_node(&self, hash: &B256) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.nodes.get(hash).cloned())
    }

    fn put_node(&mut self, hash: B256, rlp: Vec<u8>) {
        self.nodes.insert(hash, rlp);
    }
}
