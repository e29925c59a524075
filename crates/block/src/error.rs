use evmcore_executive::TxError;
use evmcore_state::StateError;

/// Failure modes of applying an ordered transaction list to a parent state
/// (§2's "Block Assembler"). Unlike [`TxError`], which rejects one
/// transaction, every variant here aborts the whole block — there is no
/// partial block in this core (a real chain client would simply not
/// propose/accept it).
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// `tx_list[index]` failed §4.2's `initialize`/`execute`/`finalize`
    /// pipeline; the wrapped [`TxError`] names the specific reason.
    #[error("transaction {index} rejected: {source}")]
    Transaction {
        index: usize,
        #[source]
        source: TxError,
    },
    /// `env.gas_limit` fell outside `parent.gas_limit +/- parent.gas_limit /
    /// gas_limit_bound_divisor` (§6's "difficulty/limit rules").
    #[error("gas limit {proposed} outside the bound divisor window around parent limit {parent}")]
    GasLimitOutOfBounds { proposed: u64, parent: u64 },
    /// `env.number` did not equal `parent_header.number + 1`.
    #[error("block number {got} does not follow parent {parent}")]
    NonSequentialNumber { parent: u64, got: u64 },
    /// `env.extra_data` exceeded `maximum_extra_data_size`.
    #[error("extra data length {got} exceeds the maximum of {max}")]
    ExtraDataTooLarge { got: usize, max: u64 },
    #[error(transparent)]
    State(#[from] StateError),
}
