use crate::{Hash256, Word, EMPTY_CODE_HASH, EMPTY_ROOT_HASH};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// The trie-committed representation of one account.
///
/// `value = RLP([nonce, balance, storage_root, code_hash])`, keyed in the
/// state trie by `keccak256(address)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Account {
    /// Incremented on outgoing transaction or contract creation by this account.
    pub nonce: u64,
    /// Native-currency balance.
    pub balance: Word,
    /// Root of this account's storage trie.
    pub storage_root: Hash256,
    /// `keccak256` of this account's code.
    pub code_hash: Hash256,
}

impl Account {
    /// An account with zero nonce, zero balance, empty storage and empty
    /// code — indistinguishable from a non-existent account post-EIP-158.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == *EMPTY_CODE_HASH
    }

    /// A freshly created account with no balance, code or storage.
    pub fn new_empty() -> Self {
        Self {
            nonce: 0,
            balance: Word::ZERO,
            storage_root: *EMPTY_ROOT_HASH,
            code_hash: *EMPTY_CODE_HASH,
        }
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::new_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Decodable;

    #[test]
    fn rlp_round_trips() {
        let acc = Account {
            nonce: 7,
            balance: Word::from(1_000_000u64),
            storage_root: *EMPTY_ROOT_HASH,
            code_hash: *EMPTY_CODE_HASH,
        };
        let encoded = alloy_rlp::encode(&acc);
        let decoded = Account::decode(&mut &encoded[..]).unwrap();
        assert_eq!(acc, decoded);
    }

    #[test]
    fn empty_account_detection() {
        assert!(Account::new_empty().is_empty());
        let mut acc = Account::new_empty();
        acc.nonce = 1;
        assert!(!acc.is_empty());
    }
}
