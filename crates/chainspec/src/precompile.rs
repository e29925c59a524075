use crate::Hardfork;
use alloy_primitives::Address;

/// The named built-in contracts of §6, at their consensus-fixed low
/// addresses. Gas formulas live with their implementation in
/// `evmcore-precompile`; this enum is only the fork-gated address -> kind
/// mapping, since activation is a chain-spec concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrecompileKind {
    EcRecover,
    Sha256,
    Ripemd160,
    Identity,
    ModExp,
    Bn128Add,
    Bn128Mul,
    Bn128Pairing,
}

/// Returns the precompile at `address` if active at `fork`, or `None` if
/// the address names no precompile (or names one not yet activated).
///
/// Addresses 1-4 are active from Frontier; 5-8 (`ModExp` and the
/// `alt_bn128` family) activate at Byzantium per EIP-198/EIP-196/EIP-197.
pub fn precompile_at(address: Address, fork: Hardfork) -> Option<PrecompileKind> {
    let bytes = address.as_slice();
    if bytes[..19].iter().any(|&b| b != 0) {
        return None;
    }
    let low = bytes[19];
    match low {
        1 => Some(PrecompileKind::EcRecover),
        2 => Some(PrecompileKind::Sha256),
        3 => Some(PrecompileKind::Ripemd160),
        4 => Some(PrecompileKind::Identity),
        5 if fork >= Hardfork::Byzantium => Some(PrecompileKind::ModExp),
        6 if fork >= Hardfork::Byzantium => Some(PrecompileKind::Bn128Add),
        7 if fork >= Hardfork::Byzantium => Some(PrecompileKind::Bn128Mul),
        8 if fork >= Hardfork::Byzantium => Some(PrecompileKind::Bn128Pairing),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bn128_inactive_before_byzantium() {
        let addr = Address::left_padding_from(&[6]);
        assert_eq!(precompile_at(addr, Hardfork::Homestead), None);
        assert_eq!(
            precompile_at(addr, Hardfork::Byzantium),
            Some(PrecompileKind::Bn128Add)
        );
    }

    #[test]
    fn ecrecover_active_from_frontier() {
        let addr = Address::left_padding_from(&[1]);
        assert_eq!(
            precompile_at(addr, Hardfork::Frontier),
            Some(PrecompileKind::EcRecover)
        );
    }

    #[test]
    fn non_precompile_address_is_none() {
        assert_eq!(precompile_at(Address::left_padding_from(&[10]), Hardfork::London), None);
    }
}
