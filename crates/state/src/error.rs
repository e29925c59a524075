/// Failure modes surfaced while reading or committing the world state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The account or storage trie referenced a node the store does not have.
    #[error(transparent)]
    Trie(#[from] evmcore_trie::Error),
    /// An account's trie value did not RLP-decode as `[nonce, balance,
    /// storage_root, code_hash]`.
    #[error("malformed account record: {0}")]
    MalformedAccount(#[from] alloy_rlp::Error),
}
