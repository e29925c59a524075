//! The chain specification: fork-activation rules, the per-fork gas
//! schedule, genesis allocation, and the parameters of §6, all loaded from
//! one JSON document and threaded explicitly into the Executive, VM and
//! Block Assembler — never a process-wide static (§9).

mod hardfork;
pub use hardfork::Hardfork;

mod schedule;
pub use schedule::{Schedule, SstoreOutcome};

mod params;
pub use params::ChainParams;

mod genesis;
pub use genesis::{Genesis, GenesisAlloc};

mod precompile;
pub use precompile::{precompile_at, PrecompileKind};

use alloy_primitives::B256;
use evmcore_primitives::BlockHeader;
use evmcore_state::{MemoryNodeStore, StateError, WorldState};

/// The consensus engine a network seals blocks with. Out of scope per §1
/// (no mining/sealing logic lives in this core) — carried only so a chain
/// spec round-trips and callers can branch on it at the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SealEngine {
    Ethash,
    NoProof,
    #[serde(other)]
    Authority,
}

/// The full chain specification document of §6: seal engine, consensus
/// parameters, genesis header fields, and the genesis allocation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSpec {
    pub seal_engine: SealEngine,
    pub params: ChainParams,
    pub genesis: Genesis,
    pub accounts: GenesisAlloc,
}

impl ChainSpec {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn hardfork_at(&self, block_number: u64) -> Hardfork {
        self.params.hardfork_at(block_number)
    }

    pub fn schedule_at(&self, block_number: u64) -> Schedule {
        Schedule::for_fork(self.hardfork_at(block_number))
    }

    /// Whether EIP-158's empty-account sweep is active at `block_number`.
    pub fn eip158_active(&self, block_number: u64) -> bool {
        self.hardfork_at(block_number) >= Hardfork::Eip158
    }

    pub fn precompile_at(&self, address: alloy_primitives::Address, block_number: u64) -> Option<PrecompileKind> {
        precompile_at(address, self.hardfork_at(block_number))
    }

    /// Seeds a fresh in-memory [`WorldState`] from `self.accounts`, commits
    /// it, and returns it alongside the genesis header (state root filled
    /// in). This is the boundary contract of "a `precompiled` entry assigns
    /// a named built-in" (§6): precompile addresses need no special
    /// treatment here since they carry no state of their own beyond
    /// whatever balance/code a test genesis chooses to assign them.
    pub fn build_genesis_state(&self) -> Result<(WorldState<MemoryNodeStore>, BlockHeader), StateError> {
        let mut state = WorldState::new_in_memory();
        for (addr, alloc) in &self.accounts {
            if alloc.nonce != 0 {
                state.set_nonce(*addr, alloc.nonce)?;
            }
            if !alloc.balance.is_zero() {
                state.set_balance(*addr, alloc.balance)?;
            }
            if !alloc.code.is_empty() {
                state.set_code(*addr, alloc.code.clone())?;
            }
            for (key, value) in &alloc.storage {
                let word = evmcore_primitives::Word::from_be_slice(value.as_slice());
                state.set_storage(*addr, *key, word)?;
            }
        }
        let root = state.commit()?;
        evmcore_helpers::dev_info!(accounts = self.accounts.len(), "genesis state seeded");
        Ok((state, self.genesis.to_header(root)))
    }

    /// A minimal all-forks-from-genesis spec convenient for tests: every
    /// fork activates at block 0, chain id 1, no genesis allocation.
    pub fn test_all_forks_active() -> Self {
        ChainSpec {
            seal_engine: SealEngine::NoProof,
            params: ChainParams {
                account_start_nonce: 0,
                maximum_extra_data_size: 32,
                min_gas_limit: 5000,
                max_gas_limit: u64::MAX,
                gas_limit_bound_divisor: 1024,
                minimum_difficulty: evmcore_primitives::Word::from(131072u64),
                difficulty_bound_divisor: evmcore_primitives::Word::from(2048u64),
                duration_limit: 13,
                block_reward: evmcore_primitives::Word::from(5_000_000_000_000_000_000u64),
                homestead_fork_block: Some(0),
                eip150_fork_block: Some(0),
                eip158_fork_block: Some(0),
                byzantium_fork_block: Some(0),
                constantinople_fork_block: Some(0),
                constantinople_fix_fork_block: Some(0),
                istanbul_fork_block: Some(0),
                london_fork_block: Some(0),
                dao_hardfork_block: None,
                network_id: 1,
                chain_id: 1,
            },
            genesis: Genesis {
                nonce: Default::default(),
                difficulty: evmcore_primitives::Word::from(131072u64),
                mix_hash: B256::ZERO,
                author: Default::default(),
                timestamp: 0,
                parent_hash: B256::ZERO,
                extra_data: Default::default(),
                gas_limit: 30_000_000,
            },
            accounts: Default::default(),
        }
    }

    /// Same as [`Self::test_all_forks_active`] but pinned to Frontier rules
    /// (no fork active), for tests exercising pre-EIP-150/158 behaviour.
    pub fn test_frontier_only() -> Self {
        let mut spec = Self::test_all_forks_active();
        spec.params.homestead_fork_block = None;
        spec.params.eip150_fork_block = None;
        spec.params.eip158_fork_block = None;
        spec.params.byzantium_fork_block = None;
        spec.params.constantinople_fork_block = None;
        spec.params.constantinople_fix_fork_block = None;
        spec.params.istanbul_fork_block = None;
        spec.params.london_fork_block = None;
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use evmcore_primitives::{GenesisAccount, Word};

    #[test]
    fn genesis_allocation_commits_into_state_root() {
        let mut spec = ChainSpec::test_all_forks_active();
        spec.accounts.insert(
            Address::repeat_byte(1),
            GenesisAccount {
                balance: Word::from(1_000_000u64),
                nonce: 0,
                code: Default::default(),
                storage: Default::default(),
            },
        );
        let (mut state, header) = spec.build_genesis_state().unwrap();
        assert_eq!(header.number, 0);
        assert_eq!(state.get_balance(Address::repeat_byte(1)).unwrap(), Word::from(1_000_000u64));
        assert_eq!(header.state_root, state.state_root());
    }

    #[test]
    fn json_round_trips() {
        let spec = ChainSpec::test_all_forks_active();
        let json = serde_json::to_string(&spec).unwrap();
        let back = ChainSpec::from_json(&json).unwrap();
        assert_eq!(back.params.chain_id, spec.params.chain_id);
    }
}
