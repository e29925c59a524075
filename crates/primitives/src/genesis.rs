use crate::{Account, Word, EMPTY_CODE_HASH, EMPTY_ROOT_HASH};
use alloy_primitives::{Bytes, B256};
use std::collections::BTreeMap;

/// One entry of a chain specification's `accounts` map: the pre-funded or
/// pre-deployed state of an address at genesis.
///
/// A `precompiled` name is not modeled here — precompile activation is a
/// property of the chain specification's parameters, not of any one
/// genesis account (`evmcore_chainspec::ChainSpec::is_precompile`).
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
pub struct GenesisAccount {
    #[serde(default)]
    pub balance: Word,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub code: Bytes,
    #[serde(default)]
    pub storage: BTreeMap<B256, B256>,
}

impl GenesisAccount {
    /// Folds this allocation entry down to the trie-committed [`Account`]
    /// shape; the caller is responsible for writing `code` into the code
    /// store under `code_hash` and the `storage` entries into this
    /// account's storage trie.
    pub fn to_account(&self, storage_root: B256) -> Account {
        let code_hash = if self.code.is_empty() {
            *EMPTY_CODE_HASH
        } else {
            crate::keccak256(&self.code)
        };
        Account {
            nonce: self.nonce,
            balance: self.balance,
            storage_root: if self.storage.is_empty() {
                *EMPTY_ROOT_HASH
            } else {
                storage_root
            },
            code_hash,
        }
    }
}
