use crate::PrecompileError;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

fn word_cost(len: usize, base: u64, per_word: u64) -> u64 {
    base + per_word * len.div_ceil(32) as u64
}

/// `SHA256` (address 0x02): `60 + 12` gas per (rounded-up) 32-byte word.
pub fn sha256(input: &[u8], gas_limit: u64) -> Result<(u64, Vec<u8>), PrecompileError> {
    let cost = word_cost(input.len(), 60, 12);
    if gas_limit < cost {
        return Err(PrecompileError::OutOfGas { needed: cost, had: gas_limit });
    }
    let digest = Sha256::digest(input);
    Ok((cost, digest.to_vec()))
}

/// `RIPEMD160` (address 0x03): `600 + 120` gas per word, output left-padded
/// to 32 bytes (the digest itself is 20 bytes).
pub fn ripemd160(input: &[u8], gas_limit: u64) -> Result<(u64, Vec<u8>), PrecompileError> {
    let cost = word_cost(input.len(), 600, 120);
    if gas_limit < cost {
        return Err(PrecompileError::OutOfGas { needed: cost, had: gas_limit });
    }
    let digest = Ripemd160::digest(input);
    let mut out = vec![0u8; 32];
    out[12..].copy_from_slice(&digest);
    Ok((cost, out))
}

/// `IDENTITY` (address 0x04): `15 + 3` gas per word, echoes its input back.
pub fn identity(input: &[u8], gas_limit: u64) -> Result<(u64, Vec<u8>), PrecompileError> {
    let cost = word_cost(input.len(), 15, 3);
    if gas_limit < cost {
        return Err(PrecompileError::OutOfGas { needed: cost, had: gas_limit });
    }
    Ok((cost, input.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_echoes_input() {
        let (gas, out) = identity(b"hello world", 100).unwrap();
        assert_eq!(out, b"hello world");
        assert_eq!(gas, 15 + 3);
    }

    #[test]
    fn sha256_gas_cost_and_output_length() {
        let (gas, out) = sha256(b"", 1_000).unwrap();
        assert_eq!(gas, 60);
        assert_eq!(out.len(), 32);
        let (gas33, _) = sha256(&[0u8; 33], 1_000).unwrap();
        assert_eq!(gas33, 60 + 12 * 2, "33 bytes rounds up to 2 words");
    }

    #[test]
    fn ripemd160_output_is_left_padded_to_32_bytes() {
        let (gas, out) = ripemd160(b"", 1_000).unwrap();
        assert_eq!(gas, 600);
        assert_eq!(out.len(), 32);
        assert!(out[..12].iter().all(|&b| b == 0));
    }

    #[rstest::rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(32, 1)]
    #[case(33, 2)]
    #[case(64, 2)]
    #[case(65, 3)]
    fn word_cost_rounds_up_to_whole_words(#[case] len: usize, #[case] words: u64) {
        assert_eq!(word_cost(len, 0, 1), words);
    }
}
