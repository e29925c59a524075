use crate::keccak256;
use alloy_primitives::{Address, Bloom, Bytes, B256};
use alloy_rlp::RlpEncodable;

/// One entry of a transaction receipt's log list.
///
/// Up to four 256-bit indexed topics plus an opaque data payload.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable)]
pub struct LogEntry {
    /// The address whose code emitted this log (`LOG0..LOG4`'s `this_address`).
    pub address: Address,
    /// Up to four indexed topics, in emission order.
    pub topics: Vec<B256>,
    /// The opaque log payload.
    pub data: Bytes,
}

/// Folds `keccak256(item)` into a receipt/block logs-bloom filter.
///
/// Each item contributes three 11-bit indices, taken from the low 11 bits
/// of each of the first three 16-bit big-endian words of its Keccak-256
/// digest. This bit-layout is fixed by consensus and must be reproduced
/// byte-for-byte.
pub fn bloom_insert_bytes(bloom: &mut Bloom, item: &[u8]) {
    let hash = keccak256(item);
    for i in [0usize, 2, 4] {
        let v = (u16::from(hash[i]) << 8 | u16::from(hash[i + 1])) & 0x07ff;
        let byte_index = 255 - (v as usize / 8);
        let bit_index = v % 8;
        bloom.0[byte_index] |= 1 << bit_index;
    }
}

/// Folds one log entry's address and topics into a bloom filter.
///
/// A log with `address` and `n` topics contributes `1 + n` insertions
/// (each a set of 3 bit positions) — six for a log with its maximum of
/// four topics plus its address.
pub fn bloom_insert_log(bloom: &mut Bloom, log: &LogEntry) {
    bloom_insert_bytes(bloom, log.address.as_slice());
    for topic in &log.topics {
        bloom_insert_bytes(bloom, topic.as_slice());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_insert_is_deterministic_and_idempotent() {
        let log = LogEntry {
            address: Address::repeat_byte(0x11),
            topics: vec![B256::repeat_byte(0x22), B256::repeat_byte(0x33)],
            data: Bytes::new(),
        };
        let mut b1 = Bloom::default();
        bloom_insert_log(&mut b1, &log);
        let mut b2 = Bloom::default();
        bloom_insert_log(&mut b2, &log);
        bloom_insert_log(&mut b2, &log);
        assert_eq!(b1, b2, "inserting the same log twice must not change the bloom");
        assert_ne!(b1, Bloom::default());
    }
}
