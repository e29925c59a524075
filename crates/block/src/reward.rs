use alloy_primitives::Address;
use evmcore_primitives::{BlockHeader, Word};
use evmcore_state::{StateError, WorldState};
use evmcore_trie::NodeStore;

/// Credits the fixed block reward (§6's `params.blockReward`) to `author`,
/// plus the nephew/uncle rewards for any included uncle headers.
///
/// This is the historic Ethash-era formula -- a nephew gets `reward / 32`
/// per uncle it includes, and each uncle's own miner gets `reward *
/// (8 - (block_number - uncle_number)) / 8` -- carried as a fixed
/// arithmetic rule rather than a pluggable seal-engine strategy, since §1
/// scopes GPU mining and consensus-rule innovation out but the reward
/// bookkeeping itself is an ordinary state mutation the Block Assembler
/// must perform to produce the correct post-state root. A `NoProof`-sealed
/// chain spec simply passes an empty `uncles` list and the formula
/// degenerates to a flat credit.
pub(crate) fn apply_block_reward<S: NodeStore + Clone>(
    state: &mut WorldState<S>,
    author: Address,
    block_number: u64,
    block_reward: Word,
    uncles: &[BlockHeader],
) -> Result<(), StateError> {
    if block_reward.is_zero() {
        return Ok(());
    }

    let nephew_reward = (block_reward / Word::from(32u64)) * Word::from(uncles.len() as u64);
    state.add_balance(author, block_reward.saturating_add(nephew_reward))?;

    for uncle in uncles {
        let distance = block_number.saturating_sub(uncle.number);
        if distance == 0 || distance > 8 {
            continue;
        }
        let uncle_reward = (block_reward * Word::from(8 - distance)) / Word::from(8u64);
        state.add_balance(uncle.author, uncle_reward)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use evmcore_state::MemoryNodeStore;

    fn uncle(number: u64, author: Address) -> BlockHeader {
        BlockHeader {
            parent_hash: B256::ZERO,
            uncles_hash: *evmcore_primitives::EMPTY_ROOT_HASH,
            author,
            state_root: B256::ZERO,
            transactions_root: *evmcore_primitives::EMPTY_ROOT_HASH,
            receipts_root: *evmcore_primitives::EMPTY_ROOT_HASH,
            logs_bloom: Default::default(),
            difficulty: Word::ZERO,
            number,
            gas_limit: 5000,
            gas_used: 0,
            timestamp: 0,
            extra_data: Default::default(),
            mix_hash: B256::ZERO,
            nonce: Default::default(),
        }
    }

    #[test]
    fn flat_reward_with_no_uncles() {
        let mut state = WorldState::new(MemoryNodeStore::new());
        let author = Address::repeat_byte(0xaa);
        apply_block_reward(&mut state, author, 10, Word::from(5u64), &[]).unwrap();
        assert_eq!(state.get_balance(author).unwrap(), Word::from(5u64));
    }

    #[test]
    fn uncle_and_nephew_rewards_are_credited() {
        let mut state = WorldState::new(MemoryNodeStore::new());
        let author = Address::repeat_byte(0xaa);
        let uncle_author = Address::repeat_byte(0xbb);
        apply_block_reward(
            &mut state,
            author,
            10,
            Word::from(32u64),
            &[uncle(9, uncle_author)],
        )
        .unwrap();
        assert_eq!(state.get_balance(author).unwrap(), Word::from(33u64));
        assert_eq!(state.get_balance(uncle_author).unwrap(), Word::from(28u64));
    }

    #[test]
    fn zero_block_reward_is_a_no_op() {
        let mut state = WorldState::new(MemoryNodeStore::new());
        let author = Address::repeat_byte(0xaa);
        apply_block_reward(&mut state, author, 10, Word::ZERO, &[]).unwrap();
        assert!(!state.exists(author).unwrap());
    }
}
