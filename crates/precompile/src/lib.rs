//! The built-in contracts at reserved low addresses (§6.1): ecrecover,
//! sha256, ripemd160, identity, modexp, and the `alt_bn128` family. Address
//! resolution and fork gating live in `evmcore-chainspec::precompile`; this
//! crate only carries the gas formulas and the computation itself.

mod bn128;
mod ecrecover;
mod error;
mod hash;
mod modexp;

pub use error::PrecompileError;

use evmcore_chainspec::{Hardfork, PrecompileKind};

/// Runs the precompile named by `kind` against `input`, charging against
/// `gas_limit`. Returns the gas actually spent and the output bytes.
pub fn run(
    kind: PrecompileKind,
    input: &[u8],
    gas_limit: u64,
    fork: Hardfork,
) -> Result<(u64, Vec<u8>), PrecompileError> {
    match kind {
        PrecompileKind::EcRecover => ecrecover::run(input, gas_limit),
        PrecompileKind::Sha256 => hash::sha256(input, gas_limit),
        PrecompileKind::Ripemd160 => hash::ripemd160(input, gas_limit),
        PrecompileKind::Identity => hash::identity(input, gas_limit),
        PrecompileKind::ModExp => modexp::run(input, gas_limit),
        PrecompileKind::Bn128Add => bn128::add(input, gas_limit, fork),
        PrecompileKind::Bn128Mul => bn128::mul(input, gas_limit, fork),
        PrecompileKind::Bn128Pairing => bn128::pairing(input, gas_limit, fork),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_identity_by_kind() {
        let (gas, out) = run(PrecompileKind::Identity, b"abc", 100, Hardfork::London).unwrap();
        assert_eq!(gas, 18);
        assert_eq!(out, b"abc");
    }

    #[test]
    fn dispatches_bn128_add_with_fork_gated_cost() {
        let input = [0u8; 128];
        let (gas, _) = run(PrecompileKind::Bn128Add, &input, 500, Hardfork::Frontier).unwrap();
        assert_eq!(gas, 500);
        let (gas, _) = run(PrecompileKind::Bn128Add, &input, 150, Hardfork::Istanbul).unwrap();
        assert_eq!(gas, 150);
    }
}
