use alloy_primitives::B256;
use evmcore_trie::{MemoryNodeStore, Trie};

/// Builds the trie committing an ordered list of RLP-encoded items, keyed
/// by the RLP encoding of each item's index (unhashed -- the transactions
/// and receipts tries are keyed this way by consensus, unlike the state
/// trie's `keccak256`-hashed keys, per §4.3's distinction between the two
/// key schemes).
///
/// Scratch trie: nothing here is persisted past computing the root, so a
/// fresh in-memory node store is built and discarded every call.
pub(crate) fn ordered_trie_root<I: IntoIterator<Item = Vec<u8>>>(items: I) -> B256 {
    let mut trie = Trie::new(MemoryNodeStore::new());
    for (index, value) in items.into_iter().enumerate() {
        let key = alloy_rlp::encode(index as u64);
        trie.insert(&key, value).expect("scratch trie over a fresh MemoryNodeStore cannot fail");
    }
    trie.root_hash()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_the_canonical_empty_root() {
        let root = ordered_trie_root(Vec::<Vec<u8>>::new());
        assert_eq!(root, *evmcore_primitives::EMPTY_ROOT_HASH);
    }

    #[test]
    fn single_item_root_matches_direct_trie_insert() {
        let mut trie = Trie::new(MemoryNodeStore::new());
        trie.insert(&alloy_rlp::encode(0u64), b"hello".to_vec()).unwrap();
        let expected = trie.root_hash();
        assert_eq!(ordered_trie_root(vec![b"hello".to_vec()]), expected);
    }
}
