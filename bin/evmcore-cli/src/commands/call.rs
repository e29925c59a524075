use crate::fixture::{build_chain_spec, EnvFixture};
use alloy_primitives::{Address, Bytes};
use anyhow::Context;
use clap::Args;
use evmcore_chainspec::GenesisAlloc;
use evmcore_executive::call_view;
use evmcore_primitives::BlockEnv;
use evmcore_vm::JumpDestCache;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Read-only execution (§6's `call_view` boundary): runs `data` against
/// `to` (or as a throwaway creation with `to` omitted) without mutating
/// any persisted state, the `eth_call`-shaped entry point this binary
/// exists to give a runnable surface to.
#[derive(Args, Debug)]
pub struct CallCmd {
    #[arg(long = "input.alloc")]
    input_alloc: PathBuf,
    #[arg(long = "input.env")]
    input_env: PathBuf,
    #[arg(long = "input.call")]
    input_call: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallFixture {
    from: Address,
    to: Option<Address>,
    #[serde(default)]
    data: Bytes,
    gas: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallResult {
    output: Bytes,
    gas_used: u64,
    success: bool,
}

impl CallCmd {
    pub fn run(self) -> anyhow::Result<()> {
        let alloc: GenesisAlloc = read_json(&self.input_alloc)?;
        let env: EnvFixture = read_json(&self.input_env)?;
        let call: CallFixture = read_json(&self.input_call)?;

        let chain_spec = build_chain_spec(env.chain_id, env.fork, alloc);
        let (mut state, parent_header) = chain_spec
            .build_genesis_state()
            .context("seeding genesis state from --input.alloc")?;

        let block_env = BlockEnv {
            number: env.current_number,
            timestamp: env.current_timestamp,
            difficulty: env.current_difficulty,
            gas_limit: env.current_gas_limit,
            author: env.current_coinbase,
            chain_id: env.chain_id,
            base_fee: None,
            recent_block_hashes: vec![parent_header.hash()],
        };
        let jumpdest_cache = JumpDestCache::new();

        let (output, gas_used, success) = call_view(
            &mut state,
            &chain_spec,
            &block_env,
            call.from,
            call.to,
            call.data,
            call.gas,
            &jumpdest_cache,
        );

        let result = CallResult { output, gas_used, success };
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> anyhow::Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {} as JSON", path.display()))
}
