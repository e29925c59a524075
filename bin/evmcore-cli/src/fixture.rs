//! JSON fixture shapes for the CLI's subcommands -- the standard
//! execution-spec-tests "transition tool" input/output format (alloc/env/tx
//! input, a flattened receipt/roots result output), built over this core's
//! own [`evmcore_primitives::Transaction`]/[`evmcore_chainspec::ChainSpec`]
//! rather than `reth`'s equivalents.

use alloy_primitives::{Address, Bytes, B256};
use evmcore_chainspec::{ChainParams, ChainSpec, Genesis, GenesisAlloc, Hardfork, SealEngine};
use evmcore_primitives::{Transaction, TxKind, Word};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of `--input.txs`: an already-signed transaction in its wire
/// shape, with `to: null` standing in for a contract-creation marker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxFixture {
    pub nonce: u64,
    pub gas_price: Word,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: Word,
    #[serde(default)]
    pub data: Bytes,
    pub v: u64,
    pub r: Word,
    pub s: Word,
}

impl From<&TxFixture> for Transaction {
    fn from(t: &TxFixture) -> Self {
        Transaction {
            nonce: t.nonce,
            gas_price: t.gas_price,
            gas_limit: t.gas_limit,
            to: match t.to {
                Some(addr) => TxKind::Call(addr),
                None => TxKind::Create,
            },
            value: t.value,
            data: t.data.clone(),
            v: t.v,
            r: t.r,
            s: t.s,
        }
    }
}

/// `--input.env`: the block environment a fixture names a fork under,
/// mirroring `ethereum/execution-spec-tests`' `env.json` shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFixture {
    pub current_coinbase: Address,
    pub current_difficulty: Word,
    pub current_gas_limit: u64,
    pub current_number: u64,
    pub current_timestamp: u64,
    #[serde(default)]
    pub previous_hash: B256,
    #[serde(default)]
    pub block_hashes: BTreeMap<u64, B256>,
    pub chain_id: u64,
    /// The named fork this fixture should run under, activated from
    /// genesis (§6's `params`' fork-activation block numbers, all pinned
    /// to zero).
    pub fork: Hardfork,
}

/// Builds a single-block [`ChainSpec`] with every fork up to and including
/// `fork` active from genesis, and `alloc` as its genesis allocation.
pub fn build_chain_spec(chain_id: u64, fork: Hardfork, alloc: GenesisAlloc) -> ChainSpec {
    let mut params = ChainParams {
        account_start_nonce: 0,
        maximum_extra_data_size: 32,
        min_gas_limit: 5000,
        max_gas_limit: u64::MAX,
        gas_limit_bound_divisor: 1024,
        minimum_difficulty: Word::from(131072u64),
        difficulty_bound_divisor: Word::from(2048u64),
        duration_limit: 13,
        block_reward: Word::ZERO,
        homestead_fork_block: None,
        eip150_fork_block: None,
        eip158_fork_block: None,
        byzantium_fork_block: None,
        constantinople_fork_block: None,
        constantinople_fix_fork_block: None,
        istanbul_fork_block: None,
        london_fork_block: None,
        dao_hardfork_block: None,
        network_id: chain_id,
        chain_id,
    };
    for f in Hardfork::ALL {
        if f > fork {
            break;
        }
        match f {
            Hardfork::Frontier => {}
            Hardfork::Homestead => params.homestead_fork_block = Some(0),
            Hardfork::Eip150 => params.eip150_fork_block = Some(0),
            Hardfork::Eip158 => params.eip158_fork_block = Some(0),
            Hardfork::Byzantium => params.byzantium_fork_block = Some(0),
            Hardfork::Constantinople => params.constantinople_fork_block = Some(0),
            Hardfork::ConstantinopleFix => params.constantinople_fix_fork_block = Some(0),
            Hardfork::Istanbul => params.istanbul_fork_block = Some(0),
            Hardfork::London => params.london_fork_block = Some(0),
        }
    }
    ChainSpec {
        seal_engine: SealEngine::NoProof,
        params,
        genesis: Genesis {
            nonce: Default::default(),
            difficulty: Word::from(131072u64),
            mix_hash: B256::ZERO,
            author: Address::ZERO,
            timestamp: 0,
            parent_hash: B256::ZERO,
            extra_data: Default::default(),
            gas_limit: 5_000_000,
        },
        accounts: alloc,
    }
}

/// A single receipt, reported back in the shape a fixture test compares
/// against -- `evmcore_primitives::Receipt` itself is the RLP wire type,
/// not the JSON-friendly one, so the CLI flattens it into this instead.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptOutput {
    pub status: Option<bool>,
    pub state_root: Option<B256>,
    pub cumulative_gas_used: u64,
    pub logs_bloom: alloy_primitives::Bloom,
    pub log_count: usize,
}

/// `--output.result`: the roots and gas accounting a transition-tool
/// invocation must report, per §6's `assemble_block` boundary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
    pub state_root: B256,
    pub tx_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: alloy_primitives::Bloom,
    pub gas_used: u64,
    pub receipts: Vec<ReceiptOutput>,
}
