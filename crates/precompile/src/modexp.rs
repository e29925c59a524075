use crate::PrecompileError;
use num_bigint::BigUint;

/// `MODEXP` (address 0x05, EIP-198): `base^exp % modulus` over
/// arbitrary-length big integers.
///
/// Input layout: `base_len(32) || exp_len(32) || mod_len(32) || base ||
/// exp || modulus`, each of the three variable-length fields padded with
/// zero bytes if the input runs short. Gas is EIP-198's original (Byzantium)
/// formula: `floor(max(mod_len, base_len)^2 * adjusted_exp_len / 20)`,
/// floored at 0 but never below... the historical minimum of this spec's
/// forks (pre-Berlin) has no floor, matching aleth's implementation.
pub fn run(input: &[u8], gas_limit: u64) -> Result<(u64, Vec<u8>), PrecompileError> {
    let base_len = read_len(input, 0);
    let exp_len = read_len(input, 32);
    let mod_len = read_len(input, 64);

    let cost = gas_cost(input, base_len, exp_len, mod_len);
    if gas_limit < cost {
        return Err(PrecompileError::OutOfGas { needed: cost, had: gas_limit });
    }

    if mod_len == 0 {
        return Ok((cost, Vec::new()));
    }

    let mut offset = 96usize;
    let base = read_biguint(input, offset, base_len);
    offset += base_len;
    let exp = read_biguint(input, offset, exp_len);
    offset += exp_len;
    let modulus = read_biguint(input, offset, mod_len);

    let result = if modulus == BigUint::from(0u8) {
        BigUint::from(0u8)
    } else if exp == BigUint::from(0u8) {
        BigUint::from(1u8) % &modulus
    } else {
        base.modpow(&exp, &modulus)
    };

    let mut out = result.to_bytes_be();
    if out.len() < mod_len {
        let mut padded = vec![0u8; mod_len - out.len()];
        padded.extend_from_slice(&out);
        out = padded;
    } else if out.len() > mod_len {
        out = out[out.len() - mod_len..].to_vec();
    }
    Ok((cost, out))
}

fn read_len(input: &[u8], offset: usize) -> usize {
    let mut word = [0u8; 32];
    let available = input.len().saturating_sub(offset).min(32);
    if available > 0 {
        word[32 - available..].copy_from_slice(&input[offset..offset + available]);
    }
    // lengths beyond usize range are not representable inputs in practice;
    // saturate rather than overflow.
    let value = u128::from_be_bytes(word[16..].try_into().expect("16 bytes"));
    value.min(usize::MAX as u128) as usize
}

fn read_biguint(input: &[u8], offset: usize, len: usize) -> BigUint {
    let mut bytes = vec![0u8; len];
    if offset < input.len() {
        let available = (input.len() - offset).min(len);
        bytes[..available].copy_from_slice(&input[offset..offset + available]);
    }
    BigUint::from_bytes_be(&bytes)
}

fn adjusted_exp_len(input: &[u8], base_len: usize, exp_len: usize) -> u64 {
    let exp_start = 96 + base_len;
    let head_len = exp_len.min(32);
    let mut head = vec![0u8; head_len];
    if exp_start < input.len() && head_len > 0 {
        let available = (input.len() - exp_start).min(head_len);
        head[..available].copy_from_slice(&input[exp_start..exp_start + available]);
    }
    let leading_zero_bits = {
        let mut bits = 0u32;
        for &b in &head {
            if b == 0 {
                bits += 8;
            } else {
                bits += b.leading_zeros();
                break;
            }
        }
        bits
    };
    let bit_len = (head_len as u32 * 8).saturating_sub(leading_zero_bits);
    if exp_len <= 32 {
        bit_len.saturating_sub(1) as u64
    } else {
        (8 * (exp_len as u64 - 32)) + bit_len.saturating_sub(1) as u64
    }
}

fn gas_cost(input: &[u8], base_len: usize, exp_len: usize, mod_len: usize) -> u64 {
    fn complexity(x: u64) -> u64 {
        if x <= 64 {
            x * x
        } else if x <= 1024 {
            x * x / 4 + 96 * x - 3072
        } else {
            x * x / 16 + 480 * x - 199680
        }
    }
    let max_len = base_len.max(mod_len) as u64;
    let adjusted = adjusted_exp_len(input, base_len, exp_len).max(1);
    (complexity(max_len) * adjusted / 20).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(base: &[u8], exp: &[u8], modulus: &[u8]) -> Vec<u8> {
        fn write_len(buf: &mut Vec<u8>, len: usize) {
            let mut word = [0u8; 32];
            word[24..].copy_from_slice(&(len as u64).to_be_bytes());
            buf.extend_from_slice(&word);
        }
        let mut out = Vec::new();
        write_len(&mut out, base.len());
        write_len(&mut out, exp.len());
        write_len(&mut out, modulus.len());
        out.extend_from_slice(base);
        out.extend_from_slice(exp);
        out.extend_from_slice(modulus);
        out
    }

    #[test]
    fn modexp_small_values() {
        // 3^2 mod 5 = 4
        let input = encode(&[3], &[2], &[5]);
        let (_, out) = run(&input, 1_000_000).unwrap();
        assert_eq!(out, vec![4]);
    }

    #[test]
    fn modexp_zero_exponent_is_one_mod_m() {
        let input = encode(&[7], &[], &[5]);
        let (_, out) = run(&input, 1_000_000).unwrap();
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn modexp_zero_modulus_is_zero() {
        let input = encode(&[7], &[2], &[]);
        let (_, out) = run(&input, 1_000_000).unwrap();
        assert_eq!(out, Vec::<u8>::new());
    }
}
