/// Failure modes of running a precompile.
///
/// A precompile never panics on malformed input. ECRECOVER and the word-cost
/// built-ins treat a too-short input as implicitly zero-padded and a bad
/// signature as "recovery failed" rather than an error, so they can only run
/// out of gas. The `alt_bn128` family additionally rejects points that are
/// not on the curve or a pairing input whose length isn't a multiple of the
/// element size — EIP-196/EIP-197 both specify this as a hard failure that
/// burns the call's remaining gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PrecompileError {
    #[error("out of gas running precompile (needed {needed}, had {had})")]
    OutOfGas { needed: u64, had: u64 },
    #[error("invalid alt_bn128 curve point or field element")]
    InvalidPoint,
    #[error("alt_bn128 pairing input length is not a multiple of 192 bytes")]
    InvalidPairingInputLength,
}
