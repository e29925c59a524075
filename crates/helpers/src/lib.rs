//! Shared macros for the rest of the workspace.
//!
//! Library crates depend on this instead of `tracing-subscriber` directly, so
//! logging stays cheap to pull in without forcing a subscriber on downstream
//! consumers that only want the core engine.

#[cfg(any(feature = "dev", test))]
pub use tracing;

#[macro_use]
mod macros;
