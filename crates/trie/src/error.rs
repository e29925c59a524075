/// Failure modes of trie node decoding and lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A hash referenced by a parent node has no entry in the node store.
    #[error("missing trie node for hash {0}")]
    MissingNode(alloy_primitives::B256),
    /// A node's RLP encoding did not match any of the four node shapes.
    #[error("malformed trie node: {0}")]
    Rlp(#[from] alloy_rlp::Error),
}
