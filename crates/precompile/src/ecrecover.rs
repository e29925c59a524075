use crate::PrecompileError;
use evmcore_primitives::{keccak256, Word};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

pub const GAS_COST: u64 = 3000;

/// `ECRECOVER` (address 0x01): recovers the signing address from
/// `[hash(32), v(32), r(32), s(32)]`, zero-padded, returning it
/// left-padded to 32 bytes, or an all-zero 32 bytes if recovery fails for
/// any reason (a malformed signature is not a precompile error — it is a
/// successful precompile call that returns nothing useful).
pub fn run(input: &[u8], gas_limit: u64) -> Result<(u64, Vec<u8>), PrecompileError> {
    if gas_limit < GAS_COST {
        return Err(PrecompileError::OutOfGas { needed: GAS_COST, had: gas_limit });
    }
    let mut buf = [0u8; 128];
    let n = input.len().min(128);
    buf[..n].copy_from_slice(&input[..n]);

    let hash = &buf[0..32];
    let v = Word::from_be_slice(&buf[32..64]);
    let r = &buf[64..96];
    let s = &buf[96..128];

    let output = recover(hash, v, r, s).unwrap_or_else(|| vec![0u8; 32]);
    Ok((GAS_COST, output))
}

fn recover(hash: &[u8], v: Word, r: &[u8], s: &[u8]) -> Option<Vec<u8>> {
    if v != Word::from(27u64) && v != Word::from(28u64) {
        return None;
    }
    let recovery_id = RecoveryId::from_byte((v.to::<u64>() - 27) as u8)?;
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(r);
    sig_bytes[32..].copy_from_slice(s);
    let sig = Signature::from_slice(&sig_bytes).ok()?;
    let verifying_key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id).ok()?;
    let encoded = verifying_key.to_encoded_point(false);
    let digest = keccak256(&encoded.as_bytes()[1..]);
    let mut out = vec![0u8; 32];
    out[12..].copy_from_slice(&digest[12..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_signature_returns_zero_not_an_error() {
        let input = [0u8; 128];
        let (gas, out) = run(&input, GAS_COST).unwrap();
        assert_eq!(gas, GAS_COST);
        assert_eq!(out, vec![0u8; 32]);
    }

    #[test]
    fn insufficient_gas_is_an_error() {
        assert!(run(&[0u8; 128], GAS_COST - 1).is_err());
    }
}
