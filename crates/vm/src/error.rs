use alloy_primitives::Bytes;

/// The two VM-level exception strata of §7.
///
/// Every variant except [`VmError::Revert`] consumes the whole of the
/// current frame's remaining gas; `Revert` alone preserves both residual
/// gas and `return_data`. None of these ever crosses the Executive boundary
/// as a host-level panic or `Result::Err` bubbling out of a nested call —
/// a child frame's failure is caught by its caller and turned into a `0`
/// pushed on the parent's stack (§7 propagation policy); this type exists
/// so that catch point has something concrete to match on.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VmError {
    #[error("out of gas")]
    OutOfGas,
    #[error("invalid instruction 0x{0:02x}")]
    InvalidInstruction(u8),
    #[error("jump destination {0} is not a JUMPDEST")]
    BadJumpDestination(u64),
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("state-mutating opcode in a static call context")]
    StaticModeViolation,
    #[error("call depth exceeded 1024")]
    CallDepthExceeded,
    #[error("contract creation collided with an existing non-empty account")]
    CreateCollision,
    #[error("deployed code size exceeds the EIP-170 limit")]
    CodeSizeExceedsLimit,
    /// `RETURNDATACOPY` referencing bytes past the end of `return_data`
    /// (EIP-211): an exceptional halt distinct from a memory-expansion
    /// gas failure, since the out-of-range read is detected before any
    /// gas is charged for it.
    #[error("returndatacopy out of bounds")]
    ReturnDataOutOfBounds,
    /// The explicit `REVERT` opcode. Carries the revert reason/return data
    /// and is the only variant under which a frame's remaining gas and
    /// `return_data` survive intact.
    #[error("reverted")]
    Revert(Bytes),
}

impl VmError {
    /// Whether this exception keeps the frame's residual gas (only an
    /// explicit `REVERT`) or burns it all (every other VM-level failure).
    pub fn preserves_gas(&self) -> bool {
        matches!(self, VmError::Revert(_))
    }
}
