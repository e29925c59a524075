use alloy_primitives::B256;
use std::sync::LazyLock;

/// A 256-bit Keccak-256 digest.
pub type Hash256 = B256;

/// Computes the Keccak-256 digest of a byte string.
pub use alloy_primitives::keccak256;

/// `keccak256("")`, the code hash of an account with no code.
pub static EMPTY_CODE_HASH: LazyLock<B256> = LazyLock::new(|| keccak256([]));

/// `keccak256(rlp(""))`, the root hash of an empty Merkle-Patricia trie.
pub static EMPTY_ROOT_HASH: LazyLock<B256> = LazyLock::new(|| keccak256([0x80u8]));
