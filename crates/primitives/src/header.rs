use crate::Word;
use alloy_primitives::{Address, Bloom, Bytes, B256, B64};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// A block header, as RLP-encoded in the fixed 15-field order fixed by
/// consensus: `parent_hash, uncles_hash, author, state_root,
/// transactions_root, receipts_root, logs_bloom, difficulty, number,
/// gas_limit, gas_used, timestamp, extra_data, mix_hash, nonce`.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct BlockHeader {
    pub parent_hash: B256,
    pub uncles_hash: B256,
    pub author: Address,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub difficulty: Word,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    /// At most 32 bytes (spec §6); the trie/RLP layer does not itself
    /// enforce the bound — callers validating a header at the chain
    /// boundary must check `extra_data.len() <= 32`.
    pub extra_data: Bytes,
    pub mix_hash: B256,
    /// The 8-byte PoW nonce (unrelated to an account's transaction nonce).
    pub nonce: B64,
}

impl BlockHeader {
    /// The Keccak-256 hash of this header's canonical RLP encoding — the
    /// value referenced as `parent_hash` by a child header.
    pub fn hash(&self) -> B256 {
        crate::keccak256(alloy_rlp::encode(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Decodable;

    #[test]
    fn rlp_round_trips() {
        let header = BlockHeader {
            parent_hash: B256::repeat_byte(1),
            uncles_hash: *crate::EMPTY_ROOT_HASH,
            author: Address::repeat_byte(2),
            state_root: B256::repeat_byte(3),
            transactions_root: *crate::EMPTY_ROOT_HASH,
            receipts_root: *crate::EMPTY_ROOT_HASH,
            logs_bloom: Bloom::default(),
            difficulty: Word::from(131072u64),
            number: 1,
            gas_limit: 5000,
            gas_used: 0,
            timestamp: 1438269988,
            extra_data: Bytes::new(),
            mix_hash: B256::ZERO,
            nonce: B64::ZERO,
        };
        let encoded = alloy_rlp::encode(&header);
        let decoded = BlockHeader::decode(&mut &encoded[..]).unwrap();
        assert_eq!(header, decoded);
    }
}
