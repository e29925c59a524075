//! The per-transaction state-transition driver (§4.2): wraps a
//! [`evmcore_vm`] frame with signature recovery, nonce/balance
//! preconditions, intrinsic-gas accounting, creation/call dispatch, refund
//! computation, and self-destruct finalisation.
//!
//! This crate is the `Host` implementation the VM crate describes but
//! cannot itself depend on — see [`context::ExecutionContext`] — plus the
//! outer transaction envelope ([`run_transaction`]) and the read-only
//! entry point ([`call_view`]) that `evmcore-block` and the CLI build on.

mod context;
mod error;
mod executive;
mod intrinsic;

pub use context::ExecutionContext;
pub use error::{ExecError, TxError};
pub use executive::{call_view, run_transaction, ExecutionOutcome};
pub use intrinsic::intrinsic_gas;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
