//! The outer transaction envelope (§4.2): `initialize`/`execute`/`finalize`
//! assembled into the two programmatic boundaries §6 names --
//! [`run_transaction`] (mutating, the one `evmcore-block` drives) and
//! [`call_view`] (read-only, used by the CLI's `eth_call`-shaped fixture
//! command).

use crate::context::ExecutionContext;
use crate::error::TxError;
use crate::intrinsic::intrinsic_gas;
use alloy_primitives::{Address, Bytes};
use evmcore_chainspec::{ChainSpec, Hardfork};
use evmcore_primitives::{
    bloom_insert_log, BlockEnv, Receipt, ReceiptOutcome, Transaction, TxKind, Word,
};
use evmcore_state::WorldState;
use evmcore_trie::NodeStore;
use evmcore_vm::JumpDestCache;

/// The result of applying one transaction: the assembled receipt, the gas
/// it consumed (for the caller's cumulative-gas-used bookkeeping), and --
/// purely for tooling, never part of the consensus-encoded receipt -- the
/// address of a contract it created, if any.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub receipt: Receipt,
    pub gas_used: u64,
    pub created_address: Option<Address>,
}

/// Applies `tx` to `state` under `block_env`/`chain_spec` (§4.2).
///
/// `cumulative_gas_used` is the gas already spent by every transaction
/// applied earlier in this block; it folds into the returned receipt's
/// `cumulative_gas_used` and bounds the block-gas-limit precondition.
/// `state` is mutated in place -- the caller (`evmcore-block`, or the CLI's
/// fixture runner for a single-transaction fixture) owns committing it.
///
/// On a transaction-level rejection (§7), `state` is left exactly as it was
/// handed in: sender nonce and balance untouched, no partial application.
pub fn run_transaction<S: NodeStore + Clone>(
    state: &mut WorldState<S>,
    chain_spec: &ChainSpec,
    block_env: &BlockEnv,
    tx: &Transaction,
    cumulative_gas_used: u64,
    jumpdest_cache: &JumpDestCache,
) -> Result<ExecutionOutcome, TxError> {
    let fork = chain_spec.hardfork_at(block_env.number);
    let schedule = chain_spec.schedule_at(block_env.number);

    // --- initialize ---

    if let Some(tx_chain_id) = tx.chain_id() {
        if tx_chain_id != block_env.chain_id {
            return Err(TxError::InvalidChainId {
                tx: tx_chain_id,
                expected: block_env.chain_id,
            });
        }
    }
    let sender = tx.sender(None)?;

    let sender_nonce = state.get_nonce(sender)?;
    if tx.nonce != sender_nonce {
        return Err(TxError::InvalidNonce {
            sender,
            expected: sender_nonce,
            got: tx.nonce,
        });
    }

    let intrinsic = intrinsic_gas(tx, fork);
    if tx.gas_limit < intrinsic {
        return Err(TxError::IntrinsicGasTooLow {
            intrinsic,
            limit: tx.gas_limit,
        });
    }

    if cumulative_gas_used + tx.gas_limit > block_env.gas_limit {
        return Err(TxError::BlockGasLimitReached {
            used: cumulative_gas_used,
            tx_limit: tx.gas_limit,
            block_limit: block_env.gas_limit,
        });
    }

    let gas_cost = tx.gas_price.saturating_mul(Word::from(tx.gas_limit));
    let upfront_cost = gas_cost.saturating_add(tx.value);
    let sender_balance = state.get_balance(sender)?;
    if sender_balance < upfront_cost {
        return Err(TxError::InsufficientBalance {
            sender,
            needed: upfront_cost,
            have: sender_balance,
        });
    }

    state.sub_balance(sender, gas_cost)?;
    state.increment_nonce(sender)?;

    // --- execute ---

    let sub_budget = tx.gas_limit - intrinsic;
    let mut ctx = ExecutionContext::new(
        &mut *state,
        chain_spec,
        schedule,
        block_env,
        jumpdest_cache,
        sender,
        tx.gas_price,
    );

    let (success, gas_remaining, created_address) = match tx.to {
        TxKind::Call(to) => {
            let outcome = ctx.top_level_call(to, sender, tx.value, tx.data.clone(), sub_budget)?;
            (outcome.success, outcome.gas_remaining, None)
        }
        TxKind::Create => {
            let outcome = ctx.top_level_create(sender, tx.value, tx.data.clone(), sub_budget)?;
            let addr = if outcome.success { Some(outcome.address) } else { None };
            (outcome.success, outcome.gas_remaining, addr)
        }
    };

    // --- finalize ---

    let gas_used = tx.gas_limit - gas_remaining;
    let refund = if success {
        let raw_refund = ctx.refund.max(0) as u64;
        raw_refund.min(schedule.max_refund(gas_used))
    } else {
        0
    };
    let logs = std::mem::take(&mut ctx.logs);
    drop(ctx);

    let gas_used_final = gas_used - refund;
    let sender_credit = Word::from(gas_remaining + refund).saturating_mul(tx.gas_price);
    let author_credit = Word::from(gas_used_final).saturating_mul(tx.gas_price);
    state.add_balance(sender, sender_credit)?;
    state.add_balance(block_env.author, author_credit)?;
    state.apply_pending_selfdestructs()?;

    let mut logs_bloom = alloy_primitives::Bloom::default();
    if success {
        for log in &logs {
            bloom_insert_log(&mut logs_bloom, log);
        }
    }
    let logs = if success { logs } else { Vec::new() };

    let outcome = if fork >= Hardfork::Byzantium {
        ReceiptOutcome::Status(success)
    } else {
        ReceiptOutcome::StateRoot(state.commit()?)
    };

    let receipt = Receipt {
        outcome,
        cumulative_gas_used: cumulative_gas_used + gas_used_final,
        logs_bloom,
        logs,
    };

    evmcore_helpers::dev_trace!(nonce = tx.nonce, gas_used = gas_used_final, success, "transaction applied");

    Ok(ExecutionOutcome {
        receipt,
        gas_used: gas_used_final,
        created_address: if success { created_address } else { None },
    })
}

/// Read-only execution (§6's third programmatic boundary): runs `data`
/// against `to` (or, with `to: None`, as a throwaway contract creation) and
/// reports `(output, gas_used, success)` without leaving any trace in
/// `state` -- every mutation is journaled and unconditionally rolled back
/// before returning, win or lose.
#[allow(clippy::too_many_arguments)]
pub fn call_view<S: NodeStore + Clone>(
    state: &mut WorldState<S>,
    chain_spec: &ChainSpec,
    block_env: &BlockEnv,
    from: Address,
    to: Option<Address>,
    data: Bytes,
    gas: u64,
    jumpdest_cache: &JumpDestCache,
) -> (Bytes, u64, bool) {
    let schedule = chain_spec.schedule_at(block_env.number);
    let mark = state.snapshot();

    let result = {
        let mut ctx = ExecutionContext::new(
            &mut *state,
            chain_spec,
            schedule,
            block_env,
            jumpdest_cache,
            from,
            Word::ZERO,
        );
        match to {
            Some(addr) => ctx.top_level_call(addr, from, Word::ZERO, data, gas),
            None => ctx
                .top_level_create(from, Word::ZERO, data, gas)
                .map(|o| evmcore_vm::CallOutcome {
                    success: o.success,
                    gas_remaining: o.gas_remaining,
                    return_data: o.return_data,
                }),
        }
    };

    state.revert(mark);

    match result {
        Ok(outcome) => {
            let gas_used = gas - outcome.gas_remaining;
            (outcome.return_data, gas_used, outcome.success)
        }
        Err(_) => (Bytes::new(), gas, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes as AlloyBytes;
    use evmcore_chainspec::ChainSpec;
    use evmcore_primitives::Word;
    use evmcore_state::WorldState;
    use evmcore_vm::JumpDestCache;

    fn frontier_env() -> BlockEnv {
        BlockEnv {
            number: 0,
            timestamp: 0,
            difficulty: Word::from(131072u64),
            gas_limit: 30_000_000,
            author: Address::repeat_byte(0xaa),
            chain_id: 1,
            base_fee: None,
            recent_block_hashes: Vec::new(),
        }
    }

    fn signed_tx(
        nonce: u64,
        to: TxKind,
        value: Word,
        gas_limit: u64,
        data: Vec<u8>,
    ) -> (Transaction, Address) {
        // Signs with a fixed test keypair so the test exercises the real
        // `sender()` recovery path `run_transaction` uses, rather than
        // bypassing it.
        use evmcore_primitives::keccak256;
        use k256::ecdsa::{RecoveryId, SigningKey};

        let key_bytes = [0x11u8; 32];
        let signing_key = SigningKey::from_slice(&key_bytes).unwrap();
        let verifying = signing_key.verifying_key();
        let encoded = verifying.to_encoded_point(false);
        let sender_hash = keccak256(&encoded.as_bytes()[1..]);
        let sender = Address::from_slice(&sender_hash[12..]);

        let mut tx = Transaction {
            nonce,
            gas_price: Word::from(1u64),
            gas_limit,
            to,
            value,
            data: AlloyBytes::from(data),
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

    #[test]
    fn pure_value_transfer_matches_scenario_one() {
        let spec = ChainSpec::test_frontier_only();
        let mut state = WorldState::new_in_memory();
        let (tx, sender) = signed_tx(
            0,
            TxKind::Call(Address::repeat_byte(0x19)),
            Word::from(1000u64),
            21000,
            vec![],
        );
        state.set_balance(sender, Word::from(1_000_000_000_000_000_000u64)).unwrap();
        let env = frontier_env();
        let cache = JumpDestCache::new();

        let outcome = run_transaction(&mut state, &spec, &env, &tx, 0, &cache).unwrap();

        assert_eq!(outcome.gas_used, 21000);
        assert!(outcome.receipt.cumulative_gas_used == 21000);
        assert_eq!(
            state.get_balance(sender).unwrap(),
            Word::from(1_000_000_000_000_000_000u64) - Word::from(1000u64) - Word::from(21000u64)
        );
        assert_eq!(
            state.get_balance(Address::repeat_byte(0x19)).unwrap(),
            Word::from(1000u64)
        );
    }

    #[test]
    fn contract_creation_matches_scenario_two() {
        let spec = ChainSpec::test_frontier_only();
        let mut state = WorldState::new_in_memory();
        // PUSH1 5, PUSH1 0, SSTORE
        let (tx, sender) = signed_tx(
            0,
            TxKind::Create,
            Word::ZERO,
            100_000,
            vec![0x60, 0x05, 0x60, 0x00, 0x55],
        );
        state.set_balance(sender, Word::from(1_000_000_000_000_000_000u64)).unwrap();
        let env = frontier_env();
        let cache = JumpDestCache::new();

        let outcome = run_transaction(&mut state, &spec, &env, &tx, 0, &cache).unwrap();

        let new_addr = outcome.created_address.expect("creation must succeed");
        assert_eq!(
            state.get_storage(new_addr, alloy_primitives::B256::ZERO).unwrap(),
            Word::from(5u64)
        );
        assert_eq!(state.get_code(new_addr).unwrap(), AlloyBytes::new());
    }

    #[test]
    fn out_of_gas_during_sstore_consumes_all_gas_and_reverts_storage() {
        let spec = ChainSpec::test_frontier_only();
        let mut state = WorldState::new_in_memory();
        let gas_limit = 21000 + 20000 - 1;
        let (tx, sender) = signed_tx(
            0,
            TxKind::Call(Address::repeat_byte(0x20)),
            Word::ZERO,
            gas_limit,
            vec![0x60, 0x05, 0x60, 0x00, 0x55],
        );
        state.set_balance(sender, Word::from(1_000_000_000_000_000_000u64)).unwrap();
        state.set_code(Address::repeat_byte(0x20), AlloyBytes::from(vec![0x60, 0x05, 0x60, 0x00, 0x55])).unwrap();
        let env = frontier_env();
        let cache = JumpDestCache::new();

        let outcome = run_transaction(&mut state, &spec, &env, &tx, 0, &cache).unwrap();

        assert_eq!(outcome.gas_used, gas_limit);
        assert!(!outcome.receipt.success() || matches!(outcome.receipt.outcome, ReceiptOutcome::StateRoot(_)));
        assert_eq!(state.get_nonce(sender).unwrap(), 1);
        assert_eq!(
            state.get_storage(Address::repeat_byte(0x20), alloy_primitives::B256::ZERO).unwrap(),
            Word::ZERO
        );
    }

    #[test]
    fn byzantium_sets_status_byte() {
        let spec = ChainSpec::test_all_forks_active();
        let mut state = WorldState::new_in_memory();
        let (tx, sender) = signed_tx(
            0,
            TxKind::Call(Address::repeat_byte(0x21)),
            Word::from(1u64),
            21000,
            vec![],
        );
        state.set_balance(sender, Word::from(1_000_000_000_000_000_000u64)).unwrap();
        let env = frontier_env();
        let cache = JumpDestCache::new();

        let outcome = run_transaction(&mut state, &spec, &env, &tx, 0, &cache).unwrap();
        assert!(outcome.receipt.success());
    }

    #[test]
    fn wrong_nonce_is_rejected_without_mutating_state() {
        let spec = ChainSpec::test_all_forks_active();
        let mut state = WorldState::new_in_memory();
        let (tx, sender) = signed_tx(
            5,
            TxKind::Call(Address::repeat_byte(0x22)),
            Word::ZERO,
            21000,
            vec![],
        );
        state.set_balance(sender, Word::from(1_000_000_000_000_000_000u64)).unwrap();
        let env = frontier_env();
        let cache = JumpDestCache::new();

        let balance_before = state.get_balance(sender).unwrap();
        let err = run_transaction(&mut state, &spec, &env, &tx, 0, &cache).unwrap_err();
        assert!(matches!(err, TxError::InvalidNonce { expected: 0, got: 5, .. }));
        assert_eq!(state.get_balance(sender).unwrap(), balance_before);
        assert_eq!(state.get_nonce(sender).unwrap(), 0);
    }

    #[test]
    fn call_view_never_mutates_state() {
        let spec = ChainSpec::test_all_forks_active();
        let mut state = WorldState::new_in_memory();
        let target = Address::repeat_byte(0x30);
        state.set_code(target, AlloyBytes::from(vec![0x60, 0x05, 0x60, 0x00, 0x55, 0x00])).unwrap();
        let root_before = {
            state.commit().unwrap()
        };
        let env = frontier_env();
        let cache = JumpDestCache::new();

        let (_, _, success) =
            call_view(&mut state, &spec, &env, Address::ZERO, Some(target), AlloyBytes::new(), 100_000, &cache);
        assert!(success);
        assert_eq!(
            state.get_storage(target, alloy_primitives::B256::ZERO).unwrap(),
            Word::ZERO,
            "call_view must not leave a visible storage write"
        );
        assert_eq!(state.commit().unwrap(), root_before);
    }
}
