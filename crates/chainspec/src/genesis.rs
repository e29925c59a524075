use alloy_primitives::{Address, Bytes, B256, B64};
use evmcore_primitives::{BlockHeader, GenesisAccount, Word, EMPTY_ROOT_HASH};
use std::collections::BTreeMap;

/// The `genesis` object of a chain specification (§6): the header fields of
/// block zero, before any transaction has run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    #[serde(default)]
    pub nonce: B64,
    pub difficulty: Word,
    #[serde(default)]
    pub mix_hash: B256,
    pub author: Address,
    pub timestamp: u64,
    #[serde(default)]
    pub parent_hash: B256,
    #[serde(default)]
    pub extra_data: Bytes,
    pub gas_limit: u64,
}

impl Genesis {
    /// Builds the genesis header given the already-committed genesis state
    /// root (computed by seeding a fresh [`evmcore_state::WorldState`] with
    /// `accounts` and calling `commit`); transaction/receipt roots are the
    /// empty-trie root since block zero has no transactions.
    pub fn to_header(&self, state_root: B256) -> BlockHeader {
        BlockHeader {
            parent_hash: self.parent_hash,
            uncles_hash: *EMPTY_ROOT_HASH,
            author: self.author,
            state_root,
            transactions_root: *EMPTY_ROOT_HASH,
            receipts_root: *EMPTY_ROOT_HASH,
            logs_bloom: Default::default(),
            difficulty: self.difficulty,
            number: 0,
            gas_limit: self.gas_limit,
            gas_used: 0,
            timestamp: self.timestamp,
            extra_data: self.extra_data.clone(),
            mix_hash: self.mix_hash,
            nonce: self.nonce,
        }
    }
}

/// The `accounts` object of a chain specification (§6): the genesis
/// allocation, keyed by address. Precompile activation is a property of
/// [`crate::ChainParams`]/the active [`crate::Hardfork`], not of any one
/// entry here (a `precompiled` tag in the source format is informational
/// only — see [`crate::precompile::active_precompiles`]).
pub type GenesisAlloc = BTreeMap<Address, GenesisAccount>;
