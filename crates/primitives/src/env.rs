use crate::Word;
use alloy_primitives::{Address, B256};

/// The externally-supplied block environment threaded into every VM frame:
/// `number, timestamp, difficulty, gas_limit, author`, the chain id (for
/// `CHAINID`), and the last 256 block hashes (for `BLOCKHASH`).
///
/// This is deliberately a plain value, not a process-wide static or a
/// handle into a live chain — the VM and Executive never reach outside it
/// for block-scoped data.
#[derive(Debug, Clone)]
pub struct BlockEnv {
    pub number: u64,
    pub timestamp: u64,
    pub difficulty: Word,
    pub gas_limit: u64,
    pub author: Address,
    pub chain_id: u64,
    /// `base_fee_per_gas`, forward-compatibility placeholder for a
    /// post-London fee market; `None` on chains where it is not active.
    pub base_fee: Option<Word>,
    /// The hashes of the last up-to-256 ancestor blocks, most recent last
    /// (`recent_block_hashes[recent_block_hashes.len() - 1]` is the
    /// immediate parent). `BLOCKHASH` of any block outside this window, or
    /// at or after the current block, returns zero.
    pub recent_block_hashes: Vec<B256>,
}

impl BlockEnv {
    /// Resolves `BLOCKHASH(target)` for this environment: zero unless
    /// `target` names one of the last 256 blocks strictly before the
    /// current one.
    pub fn block_hash(&self, target: u64) -> B256 {
        if target >= self.number {
            return B256::ZERO;
        }
        let distance = self.number - target;
        if distance == 0 || distance > 256 || distance as usize > self.recent_block_hashes.len() {
            return B256::ZERO;
        }
        self.recent_block_hashes[self.recent_block_hashes.len() - distance as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_hashes(number: u64, n: usize) -> BlockEnv {
        BlockEnv {
            number,
            timestamp: 0,
            difficulty: Word::ZERO,
            gas_limit: 30_000_000,
            author: Address::ZERO,
            chain_id: 1,
            base_fee: None,
            recent_block_hashes: (0..n as u64)
                .map(|i| B256::left_padding_from(&i.to_be_bytes()))
                .collect(),
        }
    }

    #[test]
    fn block_hash_outside_window_is_zero() {
        let env = env_with_hashes(300, 256);
        assert_eq!(env.block_hash(300), B256::ZERO, "current block is not its own hash");
        assert_eq!(env.block_hash(301), B256::ZERO, "future block is zero");
        assert_eq!(env.block_hash(43), B256::ZERO, "more than 256 blocks back is zero");
    }

    #[test]
    fn block_hash_in_window_resolves() {
        let env = env_with_hashes(300, 256);
        assert_eq!(
            env.block_hash(299),
            B256::left_padding_from(&255u64.to_be_bytes())
        );
    }
}
