//! Core value types shared by every other `evmcore` crate: the 256-bit
//! [`Word`], 160-bit [`Address`], [`Hash256`], accounts, transactions, block
//! headers, receipts and their canonical RLP encodings.
//!
//! Nothing in this crate touches a trie, a VM frame or a chain
//! specification — it is the bottom of the dependency graph.

mod word;
pub use word::Word;

mod address;
pub use address::{contract_address, create2_address};

mod hash;
pub use hash::{keccak256, Hash256, EMPTY_CODE_HASH, EMPTY_ROOT_HASH};

mod account;
pub use account::Account;

mod log;
pub use log::{bloom_insert_bytes, bloom_insert_log, LogEntry};

mod signature;
pub use signature::{Signature, SignatureError};

mod transaction;
pub use transaction::{Transaction, TxKind};

mod header;
pub use header::BlockHeader;

mod receipt;
pub use receipt::Receipt;

mod genesis;
pub use genesis::GenesisAccount;

mod env;
pub use env::BlockEnv;

pub use alloy_primitives::{Address, Bloom, Bytes, B256, U256};

/// The canonical recursive-length-prefix codec, re-exported so downstream
/// crates derive `RlpEncodable`/`RlpDecodable` without a direct
/// `alloy-rlp` dependency.
pub use alloy_rlp as rlp;
