//! The Block Assembler (§2): applies an ordered transaction list to a
//! parent state under one [`evmcore_chainspec::ChainSpec`], producing the
//! post-state root, the transactions/receipts tries, the block-level logs
//! bloom, and total gas used -- the `assemble_block` programmatic boundary
//! of §6.
//!
//! Everything below the single [`assemble_block`] entry point is `pub(crate)`
//! scratch machinery (the ordered tries, the reward rule); callers only ever
//! see the header/receipts pair it returns plus whatever `WorldState` they
//! handed in, now mutated and committed.

mod error;
mod ordered_trie;
mod reward;

pub use error::BlockError;

use alloy_primitives::{Address, Bloom, Bytes, B256, B64};
use evmcore_chainspec::ChainSpec;
use evmcore_executive::run_transaction;
use evmcore_primitives::{bloom_insert_log, BlockEnv, BlockHeader, Receipt, Transaction, Word};
use evmcore_state::WorldState;
use evmcore_trie::NodeStore;
use evmcore_vm::JumpDestCache;
use ordered_trie::ordered_trie_root;
use reward::apply_block_reward;

/// The header fields a block proposer supplies that cannot be derived from
/// the parent header or the transaction list alone -- timestamp, gas
/// limit, difficulty, and sealing metadata are all external inputs in this
/// core (§1: mining/sealing is an external collaborator), taken straight
/// from a fixture's `env` rather than computed.
#[derive(Debug, Clone)]
pub struct BlockEnvInputs {
    pub number: u64,
    pub timestamp: u64,
    pub difficulty: Word,
    pub gas_limit: u64,
    pub author: Address,
    pub extra_data: Bytes,
    pub mix_hash: B256,
    pub nonce: B64,
    /// The last up-to-256 ancestor hashes, most recent (immediate parent)
    /// last -- threaded into every transaction's [`BlockEnv`] for
    /// `BLOCKHASH`.
    pub recent_block_hashes: Vec<B256>,
}

/// Applies `transactions` in order to `state` (already positioned at
/// `parent_header`'s committed root) under `chain_spec`, crediting
/// `env.author` the block reward and any uncle/nephew share for `uncles`,
/// and returns the assembled header plus one receipt per transaction.
///
/// `state` is mutated and left committed; the caller owns persisting it
/// further (e.g. writing the node store to disk) -- this function only
/// produces the in-memory result and the header that commits it.
pub fn assemble_block<S: NodeStore + Clone>(
    parent_header: &BlockHeader,
    state: &mut WorldState<S>,
    chain_spec: &ChainSpec,
    env: &BlockEnvInputs,
    transactions: &[Transaction],
    uncles: &[BlockHeader],
) -> Result<(BlockHeader, Vec<Receipt>), BlockError> {
    if env.number != parent_header.number + 1 {
        return Err(BlockError::NonSequentialNumber {
            parent: parent_header.number,
            got: env.number,
        });
    }
    if env.extra_data.len() as u64 > chain_spec.params.maximum_extra_data_size {
        return Err(BlockError::ExtraDataTooLarge {
            got: env.extra_data.len(),
            max: chain_spec.params.maximum_extra_data_size,
        });
    }
    let bound = parent_header.gas_limit / chain_spec.params.gas_limit_bound_divisor;
    let (low, high) = (
        parent_header.gas_limit.saturating_sub(bound),
        parent_header.gas_limit.saturating_add(bound),
    );
    if env.gas_limit < low || env.gas_limit > high || env.gas_limit < chain_spec.params.min_gas_limit {
        return Err(BlockError::GasLimitOutOfBounds {
            proposed: env.gas_limit,
            parent: parent_header.gas_limit,
        });
    }

    let block_env = BlockEnv {
        number: env.number,
        timestamp: env.timestamp,
        difficulty: env.difficulty,
        gas_limit: env.gas_limit,
        author: env.author,
        chain_id: chain_spec.params.chain_id,
        base_fee: None,
        recent_block_hashes: env.recent_block_hashes.clone(),
    };

    let jumpdest_cache = JumpDestCache::new();
    let mut receipts = Vec::with_capacity(transactions.len());
    let mut cumulative_gas_used = 0u64;
    let mut logs_bloom = Bloom::default();

    for (index, tx) in transactions.iter().enumerate() {
        let outcome = run_transaction(
            state,
            chain_spec,
            &block_env,
            tx,
            cumulative_gas_used,
            &jumpdest_cache,
        )
        .map_err(|source| BlockError::Transaction { index, source })?;

        cumulative_gas_used = outcome.receipt.cumulative_gas_used;
        for log in &outcome.receipt.logs {
            bloom_insert_log(&mut logs_bloom, log);
        }
        receipts.push(outcome.receipt);

        // EIP-158's empty-account sweep touches the sender and (for a
        // value-bearing call) the recipient every transaction, regardless
        // of whether the fork is active -- `sweep_if_empty` is itself a
        // no-op on an account that still holds balance/nonce/code, and a
        // pre-EIP-158 chain never produces a touched-empty account in the
        // first place because `add_balance`'s zero-value branch is the
        // only path that can create one without also being the point
        // EIP-161 itself introduced.
        if chain_spec.eip158_active(env.number) {
            let sender = tx
                .sender(None)
                .map_err(|source| BlockError::Transaction { index, source: source.into() })?;
            state.sweep_if_empty(sender)?;
            if let Some(to) = tx.to.to() {
                state.sweep_if_empty(to)?;
            }
        }
    }

    apply_block_reward(
        state,
        env.author,
        env.number,
        chain_spec.params.block_reward,
        uncles,
    )?;

    let state_root = state.commit()?;
    evmcore_helpers::dev_info!(
        number = env.number,
        transactions = transactions.len(),
        gas_used = cumulative_gas_used,
        "block assembled"
    );
    let transactions_root = ordered_trie_root(transactions.iter().map(alloy_rlp::encode));
    let receipts_root = ordered_trie_root(receipts.iter().map(alloy_rlp::encode));
    let uncles_hash = evmcore_primitives::keccak256(alloy_rlp::encode_list(uncles));

    let header = BlockHeader {
        parent_hash: parent_header.hash(),
        uncles_hash,
        author: env.author,
        state_root,
        transactions_root,
        receipts_root,
        logs_bloom,
        difficulty: env.difficulty,
        number: env.number,
        gas_limit: env.gas_limit,
        gas_used: cumulative_gas_used,
        timestamp: env.timestamp,
        extra_data: env.extra_data.clone(),
        mix_hash: env.mix_hash,
        nonce: env.nonce,
    };

    Ok((header, receipts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address as Addr, Bytes as AlloyBytes};
    use evmcore_chainspec::ChainSpec;
    use evmcore_primitives::{TxKind, Word};
    use evmcore_state::WorldState;
    use k256::ecdsa::{RecoveryId, SigningKey};

    fn signed_tx(nonce: u64, to: TxKind, value: Word, gas_limit: u64) -> (Transaction, Addr) {
        use evmcore_primitives::keccak256;

        let key_bytes = [0x22u8; 32];
        let signing_key = SigningKey::from_slice(&key_bytes).unwrap();
        let verifying = signing_key.verifying_key();
        let encoded = verifying.to_encoded_point(false);
        let sender_hash = keccak256(&encoded.as_bytes()[1..]);
        let sender = Addr::from_slice(&sender_hash[12..]);

        let mut tx = Transaction {
            nonce,
            gas_price: Word::from(1u64),
            gas_limit,
            to,
            value,
            data: AlloyBytes::new(),
            v: 27,
            r: Word::from(1u64),
            s: Word::from(1u64),
        };
        let hash = tx.signing_hash(None);
        let (mut sig, mut recid) = signing_key.sign_prehash_recoverable(hash.as_slice()).unwrap();
        if let Some(normalized) = sig.normalize_s() {
            sig = normalized;
            recid = RecoveryId::from_byte(recid.to_byte() ^ 1).unwrap();
        }
        let bytes = sig.to_bytes();
        tx.r = Word::from_be_slice(&bytes[..32]);
        tx.s = Word::from_be_slice(&bytes[32..]);
        tx.v = 27 + recid.to_byte() as u64;
        (tx, sender)
    }

    fn genesis_header() -> BlockHeader {
        BlockHeader {
            parent_hash: B256::ZERO,
            uncles_hash: *evmcore_primitives::EMPTY_ROOT_HASH,
            author: Addr::ZERO,
            state_root: *evmcore_primitives::EMPTY_ROOT_HASH,
            transactions_root: *evmcore_primitives::EMPTY_ROOT_HASH,
            receipts_root: *evmcore_primitives::EMPTY_ROOT_HASH,
            logs_bloom: Default::default(),
            difficulty: Word::from(131072u64),
            number: 0,
            gas_limit: 5_000_000,
            gas_used: 0,
            timestamp: 0,
            extra_data: Default::default(),
            mix_hash: B256::ZERO,
            nonce: Default::default(),
        }
    }

    #[test]
    fn assembling_an_empty_block_leaves_state_root_unchanged_but_for_the_reward() {
        let spec = ChainSpec::test_all_forks_active();
        let mut state = WorldState::new_in_memory();
        let parent = genesis_header();
        let env = BlockEnvInputs {
            number: 1,
            timestamp: 100,
            difficulty: Word::from(131072u64),
            gas_limit: 5_000_000,
            author: Addr::repeat_byte(0xaa),
            extra_data: AlloyBytes::new(),
            mix_hash: B256::ZERO,
            nonce: Default::default(),
            recent_block_hashes: vec![],
        };

        let (header, receipts) = assemble_block(&parent, &mut state, &spec, &env, &[], &[]).unwrap();

        assert!(receipts.is_empty());
        assert_eq!(header.number, 1);
        assert_eq!(header.transactions_root, *evmcore_primitives::EMPTY_ROOT_HASH);
        assert_eq!(header.receipts_root, *evmcore_primitives::EMPTY_ROOT_HASH);
        assert_eq!(header.gas_used, 0);
        assert_eq!(
            state.get_balance(env.author).unwrap(),
            spec.params.block_reward
        );
    }

    #[test]
    fn one_value_transfer_sets_roots_and_gas_used() {
        let spec = ChainSpec::test_all_forks_active();
        let mut state = WorldState::new_in_memory();
        let (tx, sender) = signed_tx(0, TxKind::Call(Addr::repeat_byte(0x19)), Word::from(1000u64), 21000);
        state.set_balance(sender, Word::from(1_000_000_000_000_000_000u64)).unwrap();
        let parent = genesis_header();
        let env = BlockEnvInputs {
            number: 1,
            timestamp: 100,
            difficulty: Word::from(131072u64),
            gas_limit: 5_000_000,
            author: Addr::repeat_byte(0xaa),
            extra_data: AlloyBytes::new(),
            mix_hash: B256::ZERO,
            nonce: Default::default(),
            recent_block_hashes: vec![],
        };

        let (header, receipts) = assemble_block(&parent, &mut state, &spec, &env, &[tx], &[]).unwrap();

        assert_eq!(receipts.len(), 1);
        assert_eq!(header.gas_used, 21000);
        assert!(receipts[0].success());
        assert_ne!(header.transactions_root, *evmcore_primitives::EMPTY_ROOT_HASH);
        assert_ne!(header.receipts_root, *evmcore_primitives::EMPTY_ROOT_HASH);
    }

    #[test]
    fn wrong_block_number_is_rejected() {
        let spec = ChainSpec::test_all_forks_active();
        let mut state = WorldState::new_in_memory();
        let parent = genesis_header();
        let env = BlockEnvInputs {
            number: 5,
            timestamp: 100,
            difficulty: Word::from(131072u64),
            gas_limit: 5_000_000,
            author: Addr::ZERO,
            extra_data: AlloyBytes::new(),
            mix_hash: B256::ZERO,
            nonce: Default::default(),
            recent_block_hashes: vec![],
        };
        let err = assemble_block(&parent, &mut state, &spec, &env, &[], &[]).unwrap_err();
        assert!(matches!(err, BlockError::NonSequentialNumber { parent: 0, got: 5 }));
    }

    #[test]
    fn gas_limit_outside_bound_divisor_is_rejected() {
        let spec = ChainSpec::test_all_forks_active();
        let mut state = WorldState::new_in_memory();
        let parent = genesis_header();
        let env = BlockEnvInputs {
            number: 1,
            timestamp: 100,
            difficulty: Word::from(131072u64),
            gas_limit: 50_000_000,
            author: Addr::ZERO,
            extra_data: AlloyBytes::new(),
            mix_hash: B256::ZERO,
            nonce: Default::default(),
            recent_block_hashes: vec![],
        };
        let err = assemble_block(&parent, &mut state, &spec, &env, &[], &[]).unwrap_err();
        assert!(matches!(err, BlockError::GasLimitOutOfBounds { .. }));
    }
}
