use crate::PrecompileError;
use bn::{AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2};
use evmcore_chainspec::Hardfork;

const ADD_INPUT_LEN: usize = 128;
const MUL_INPUT_LEN: usize = 96;
const PAIR_ELEMENT_LEN: usize = 192;

/// `alt_bn128` point addition (address 0x06, EIP-196). 500 gas before
/// Istanbul, 150 after (EIP-1108).
pub fn add(input: &[u8], gas_limit: u64, fork: Hardfork) -> Result<(u64, Vec<u8>), PrecompileError> {
    let cost = if fork >= Hardfork::Istanbul { 150 } else { 500 };
    if gas_limit < cost {
        return Err(PrecompileError::OutOfGas { needed: cost, had: gas_limit });
    }
    let buf = pad(input, ADD_INPUT_LEN);
    let p1 = read_g1(&buf, 0)?;
    let p2 = read_g1(&buf, 64)?;
    Ok((cost, encode_g1(p1 + p2)))
}

/// `alt_bn128` scalar multiplication (address 0x07, EIP-196). 40000 gas
/// before Istanbul, 6000 after.
pub fn mul(input: &[u8], gas_limit: u64, fork: Hardfork) -> Result<(u64, Vec<u8>), PrecompileError> {
    let cost = if fork >= Hardfork::Istanbul { 6_000 } else { 40_000 };
    if gas_limit < cost {
        return Err(PrecompileError::OutOfGas { needed: cost, had: gas_limit });
    }
    let buf = pad(input, MUL_INPUT_LEN);
    let p = read_g1(&buf, 0)?;
    let fr = Fr::from_slice(&buf[64..96]).map_err(|_| PrecompileError::InvalidPoint)?;
    Ok((cost, encode_g1(p * fr)))
}

/// `alt_bn128` pairing check (address 0x08, EIP-197). Base cost plus a
/// per-pair cost, both cut at Istanbul (EIP-1108): 100000+80000k before,
/// 45000+34000k after, where `k` is the number of pairing elements.
pub fn pairing(input: &[u8], gas_limit: u64, fork: Hardfork) -> Result<(u64, Vec<u8>), PrecompileError> {
    if input.len() % PAIR_ELEMENT_LEN != 0 {
        return Err(PrecompileError::InvalidPairingInputLength);
    }
    let (base, per_point) = if fork >= Hardfork::Istanbul { (45_000, 34_000) } else { (100_000, 80_000) };
    let k = (input.len() / PAIR_ELEMENT_LEN) as u64;
    let cost = base + per_point * k;
    if gas_limit < cost {
        return Err(PrecompileError::OutOfGas { needed: cost, had: gas_limit });
    }

    let mut pairs = Vec::with_capacity(k as usize);
    for i in 0..k as usize {
        let start = i * PAIR_ELEMENT_LEN;
        let g1 = read_g1(input, start)?;
        let g2 = read_g2(input, start + 64)?;
        pairs.push((g1, g2));
    }
    let success = bn::pairing_batch(&pairs) == Gt::one();
    let mut out = vec![0u8; 32];
    if success {
        out[31] = 1;
    }
    Ok((cost, out))
}

fn pad(input: &[u8], len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    let n = input.len().min(len);
    buf[..n].copy_from_slice(&input[..n]);
    buf
}

fn read_fq(input: &[u8], offset: usize) -> Result<Fq, PrecompileError> {
    Fq::from_slice(&input[offset..offset + 32]).map_err(|_| PrecompileError::InvalidPoint)
}

fn read_g1(input: &[u8], offset: usize) -> Result<G1, PrecompileError> {
    let x = read_fq(input, offset)?;
    let y = read_fq(input, offset + 32)?;
    if x == Fq::zero() && y == Fq::zero() {
        Ok(G1::zero())
    } else {
        AffineG1::new(x, y).map(Into::into).map_err(|_| PrecompileError::InvalidPoint)
    }
}

/// G2 points are encoded as four field elements `(x.c1, x.c0, y.c1, y.c0)`
/// per EIP-197: the imaginary component of each coordinate precedes the
/// real one in the byte stream.
fn read_g2(input: &[u8], offset: usize) -> Result<G2, PrecompileError> {
    let x_im = read_fq(input, offset)?;
    let x_re = read_fq(input, offset + 32)?;
    let y_im = read_fq(input, offset + 64)?;
    let y_re = read_fq(input, offset + 96)?;
    let x = Fq2::new(x_re, x_im);
    let y = Fq2::new(y_re, y_im);
    if x == Fq2::zero() && y == Fq2::zero() {
        Ok(G2::zero())
    } else {
        AffineG2::new(x, y).map(Into::into).map_err(|_| PrecompileError::InvalidPoint)
    }
}

fn encode_g1(point: G1) -> Vec<u8> {
    let mut out = vec![0u8; 64];
    if let Some(affine) = AffineG1::from_jacobian(point) {
        let mut x_buf = [0u8; 32];
        let mut y_buf = [0u8; 32];
        if affine.x().to_big_endian(&mut x_buf).is_ok() && affine.y().to_big_endian(&mut y_buf).is_ok() {
            out[..32].copy_from_slice(&x_buf);
            out[32..].copy_from_slice(&y_buf);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(n: u8) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[31] = n;
        w
    }

    #[test]
    fn add_identity_is_identity() {
        // (0,0) + (0,0) = (0,0), the point at infinity in this encoding.
        let input = [0u8; ADD_INPUT_LEN];
        let (gas, out) = add(&input, 500, Hardfork::Byzantium).unwrap();
        assert_eq!(gas, 500);
        assert_eq!(out, vec![0u8; 64]);
    }

    #[test]
    fn add_gas_cost_is_fork_gated() {
        let input = [0u8; ADD_INPUT_LEN];
        let (byzantium_gas, _) = add(&input, 500, Hardfork::Byzantium).unwrap();
        let (istanbul_gas, _) = add(&input, 150, Hardfork::Istanbul).unwrap();
        assert_eq!(byzantium_gas, 500);
        assert_eq!(istanbul_gas, 150);
    }

    #[test]
    fn mul_identity_by_zero_is_identity() {
        let mut input = [0u8; MUL_INPUT_LEN];
        input[64..96].copy_from_slice(&word(0));
        let (gas, out) = mul(&input, 40_000, Hardfork::Byzantium).unwrap();
        assert_eq!(gas, 40_000);
        assert_eq!(out, vec![0u8; 64]);
    }

    #[test]
    fn pairing_rejects_misaligned_input() {
        let input = vec![0u8; PAIR_ELEMENT_LEN - 1];
        assert!(matches!(
            pairing(&input, 1_000_000, Hardfork::Istanbul),
            Err(PrecompileError::InvalidPairingInputLength)
        ));
    }

    #[test]
    fn pairing_empty_input_is_vacuously_true() {
        let (gas, out) = pairing(&[], 1_000_000, Hardfork::Istanbul).unwrap();
        assert_eq!(gas, 45_000);
        assert_eq!(out[31], 1);
        assert!(out[..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn pairing_gas_cost_is_fork_gated() {
        let input = vec![0u8; PAIR_ELEMENT_LEN];
        let (byzantium_gas, _) = pairing(&input, 1_000_000, Hardfork::Byzantium).unwrap();
        let (istanbul_gas, _) = pairing(&input, 1_000_000, Hardfork::Istanbul).unwrap();
        assert_eq!(byzantium_gas, 100_000 + 80_000);
        assert_eq!(istanbul_gas, 45_000 + 34_000);
    }
}
