use alloy_primitives::{Address, B256};
use evmcore_primitives::{Account, Word};

/// One reversible world-state mutation.
///
/// Every write method on [`crate::WorldState`] appends exactly one entry
/// before applying its effect, so `revert` can walk the journal backwards
/// and undo it. This is the "append-only log of state mutations used to
/// roll back failed frames" of spec §4.3.
#[derive(Debug, Clone)]
pub enum JournalEntry {
    /// The account named did not exist before this operation created it as
    /// a side effect of its first write.
    Created { addr: Address },
    Balance { addr: Address, old: Word },
    Nonce { addr: Address, old: u64 },
    Code { addr: Address, old_code_hash: B256 },
    Storage { addr: Address, key: B256, old: Word },
    /// The account was destroyed (`SELFDESTRUCT` or the EIP-158 empty
    /// sweep); `account` and `storage_root` are its state immediately
    /// before destruction, enough to fully restore it on revert.
    Destroyed {
        addr: Address,
        account: Account,
        storage_root: B256,
    },
    /// `addr` was newly added to the pending self-destruct set by this
    /// `SELFDESTRUCT`. A frame that reverts must un-register it — the
    /// balance credit and deletion only happen once, at `finalize`.
    SelfDestructRegistered { addr: Address },
}

/// An opaque marker returned by [`crate::WorldState::snapshot`], identifying
/// a point in the journal to [`crate::WorldState::revert`] back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalMark(pub(crate) usize);
