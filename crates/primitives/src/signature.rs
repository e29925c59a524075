use crate::{keccak256, Hash256, Word};
use alloy_primitives::Address;
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};

/// The order of the secp256k1 base point, as a [`Word`].
///
/// Valid `s` values for a transaction signature must lie in the lower
/// half of this range (`s <= N/2`) since EIP-2; malleable signatures with
/// `s > N/2` are rejected.
const SECP256K1N_HALF: Word = Word::from_limbs([
    0xdfe92f46681b20a0,
    0x5d576e7357a4501d,
    0xffffffffffffffff,
    0x7fffffffffffffff,
]);

/// An ECDSA signature over secp256k1, in the `(r, s, v)` shape used by
/// Ethereum transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    r: Word,
    s: Word,
    /// `true` selects the odd-Y recovery candidate.
    y_parity: bool,
}

/// Failure modes of signature parsing and public-key recovery.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    /// `s` is zero, or `r` is zero, or `s` exceeds `secp256k1n/2`.
    #[error("signature has invalid r/s range")]
    InvalidRange,
    /// The recovery id does not correspond to a legacy `v` or EIP-155 `v`.
    #[error("invalid recovery id derived from v={0}")]
    InvalidRecoveryId(u64),
    /// `k256` could not recover a public key from this (sig, msg) pair.
    #[error("public key recovery failed")]
    RecoveryFailed,
}

impl Signature {
    /// Builds a signature from its raw components without range-checking.
    pub fn new(r: Word, s: Word, y_parity: bool) -> Self {
        Self { r, s, y_parity }
    }

    pub fn r(&self) -> Word {
        self.r
    }

    pub fn s(&self) -> Word {
        self.s
    }

    pub fn v(&self) -> bool {
        self.y_parity
    }

    /// Checks the `0 < r`, `0 < s <= secp256k1n/2` malleability guard.
    pub fn is_in_valid_range(&self) -> bool {
        !self.r.is_zero() && !self.s.is_zero() && self.s <= SECP256K1N_HALF
    }

    /// Recovers the signing address from a 32-byte message hash.
    ///
    /// `msg_hash` is the Keccak-256 of the transaction's signing-RLP
    /// (the 6-field pre-EIP-155 encoding or the 9-field EIP-155 one with
    /// `r = s = 0` and `v = chain_id`).
    pub fn recover_address(&self, msg_hash: Hash256) -> Result<Address, SignatureError> {
        if !self.is_in_valid_range() {
            return Err(SignatureError::InvalidRange);
        }
        let recovery_id = RecoveryId::from_byte(self.y_parity as u8)
            .ok_or(SignatureError::InvalidRecoveryId(self.y_parity as u64))?;
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        bytes[32..].copy_from_slice(&self.s.to_be_bytes::<32>());
        let sig =
            K256Signature::from_slice(&bytes).map_err(|_| SignatureError::RecoveryFailed)?;
        let verifying_key =
            VerifyingKey::recover_from_prehash(msg_hash.as_slice(), &sig, recovery_id)
                .map_err(|_| SignatureError::RecoveryFailed)?;
        let encoded = verifying_key.to_encoded_point(false);
        let hash = keccak256(&encoded.as_bytes()[1..]);
        Ok(Address::from_slice(&hash[12..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_high_s() {
        let sig = Signature::new(Word::from(1u64), SECP256K1N_HALF + Word::from(1u64), false);
        assert!(!sig.is_in_valid_range());
    }

    #[test]
    fn rejects_zero_r_or_s() {
        assert!(!Signature::new(Word::ZERO, Word::from(1u64), false).is_in_valid_range());
        assert!(!Signature::new(Word::from(1u64), Word::ZERO, false).is_in_valid_range());
    }
}
