use alloy_primitives::Address;
use evmcore_primitives::{SignatureError, Word};

/// Transaction-level rejection reasons (§7): the whole transaction is
/// rejected and the sender's nonce/balance are left untouched. Distinct
/// from [`evmcore_vm::VmError`], which reverts only the current frame.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("invalid nonce for {sender}: expected {expected}, got {got}")]
    InvalidNonce {
        sender: Address,
        expected: u64,
        got: u64,
    },
    #[error("insufficient balance for {sender}: needed {needed}, have {have}")]
    InsufficientBalance {
        sender: Address,
        needed: Word,
        have: Word,
    },
    #[error("intrinsic gas {intrinsic} exceeds gas limit {limit}")]
    IntrinsicGasTooLow { intrinsic: u64, limit: u64 },
    #[error("block gas limit reached: {used} used + {tx_limit} requested > {block_limit}")]
    BlockGasLimitReached {
        used: u64,
        tx_limit: u64,
        block_limit: u64,
    },
    #[error("invalid chain id: tx carries {tx}, chain expects {expected}")]
    InvalidChainId { tx: u64, expected: u64 },
    #[error("malformed rlp: {0}")]
    MalformedRlp(#[from] alloy_rlp::Error),
    #[error(transparent)]
    State(#[from] evmcore_state::StateError),
    /// A frame-running failure that reached the Executive's boundary
    /// without being folded into a failed [`evmcore_vm::CallOutcome`] /
    /// [`evmcore_vm::CreateOutcome`] first -- in practice only a world-state
    /// read/write error, which is always a transaction-level abort (§7:
    /// there is no partial application of a transaction that cannot even
    /// read its own sender's account).
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// The error type threaded through [`evmcore_vm::Host`]'s associated
/// `Error`. Every fallible world-state operation a frame performs bottoms
/// out here; precompile failures and VM-level exceptions never reach this
/// type — they are folded into a failed [`evmcore_vm::CallOutcome`] /
/// [`evmcore_vm::CreateOutcome`] instead; see §7's propagation policy.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error(transparent)]
    State(#[from] evmcore_state::StateError),
}
