use crate::fixture::{build_chain_spec, EnvFixture, ReceiptOutput, TransitionResult, TxFixture};
use alloy_primitives::Bloom;
use anyhow::Context;
use clap::Args;
use evmcore_block::{assemble_block, BlockEnvInputs};
use evmcore_chainspec::GenesisAlloc;
use evmcore_primitives::{BlockHeader, ReceiptOutcome};
use std::path::PathBuf;

/// Runs one block's worth of transactions against a genesis allocation and
/// prints the resulting roots/receipts -- the standard `t8n`
/// ("transition") shape `ethereum/execution-spec-tests` fixtures expect.
#[derive(Args, Debug)]
pub struct TransitionCmd {
    #[arg(long = "input.alloc")]
    input_alloc: PathBuf,
    #[arg(long = "input.txs")]
    input_txs: PathBuf,
    #[arg(long = "input.env")]
    input_env: PathBuf,
}

impl TransitionCmd {
    pub fn run(self) -> anyhow::Result<()> {
        let alloc: GenesisAlloc = read_json(&self.input_alloc)?;
        let txs: Vec<TxFixture> = read_json(&self.input_txs)?;
        let env: EnvFixture = read_json(&self.input_env)?;

        let chain_spec = build_chain_spec(env.chain_id, env.fork, alloc);
        let (mut state, parent_header) = chain_spec
            .build_genesis_state()
            .context("seeding genesis state from --input.alloc")?;

        let block_env = BlockEnvInputs {
            number: env.current_number,
            timestamp: env.current_timestamp,
            difficulty: env.current_difficulty,
            gas_limit: env.current_gas_limit,
            author: env.current_coinbase,
            extra_data: Default::default(),
            mix_hash: alloy_primitives::B256::ZERO,
            nonce: Default::default(),
            recent_block_hashes: resolve_block_hashes(&env, &parent_header),
        };
        let transactions: Vec<_> = txs.iter().map(evmcore_primitives::Transaction::from).collect();

        let (header, receipts) =
            assemble_block(&parent_header, &mut state, &chain_spec, &block_env, &transactions, &[])
                .context("assembling block from fixture input")?;

        let mut logs_bloom = Bloom::default();
        let receipt_outputs = receipts
            .iter()
            .map(|r| {
                for log in &r.logs {
                    evmcore_primitives::bloom_insert_log(&mut logs_bloom, log);
                }
                let (status, state_root) = match r.outcome {
                    ReceiptOutcome::Status(s) => (Some(s), None),
                    ReceiptOutcome::StateRoot(root) => (None, Some(root)),
                };
                ReceiptOutput {
                    status,
                    state_root,
                    cumulative_gas_used: r.cumulative_gas_used,
                    logs_bloom: r.logs_bloom,
                    log_count: r.logs.len(),
                }
            })
            .collect();

        let result = TransitionResult {
            state_root: header.state_root,
            tx_root: header.transactions_root,
            receipts_root: header.receipts_root,
            logs_bloom: header.logs_bloom,
            gas_used: header.gas_used,
            receipts: receipt_outputs,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}

/// Threads `env.block_hashes` into the contiguous `BLOCKHASH` window the
/// VM expects (most recent last), falling back to `previous_hash` for the
/// immediate parent when the fixture gives only that one entry.
fn resolve_block_hashes(env: &EnvFixture, parent_header: &BlockHeader) -> Vec<alloy_primitives::B256> {
    if env.block_hashes.is_empty() {
        return vec![parent_header.hash()];
    }
    let mut hashes: Vec<_> = env.block_hashes.iter().collect();
    hashes.sort_by_key(|(number, _)| **number);
    hashes.into_iter().map(|(_, hash)| *hash).collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> anyhow::Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {} as JSON", path.display()))
}
