//! Wider-than-256-bit intermediates for `ADDMOD`/`MULMOD` (§4.1: "modular
//! with wider intermediate"), implemented as plain limb arithmetic rather
//! than pulling in a big-integer crate (§9: "use a fixed 256-bit type, not
//! a big-integer library").

use evmcore_primitives::Word;

fn ge(value: &[u64], modulus: &[u64; 4]) -> bool {
    for i in (0..value.len()).rev() {
        let m = if i < 4 { modulus[i] } else { 0 };
        match value[i].cmp(&m) {
            std::cmp::Ordering::Greater => return true,
            std::cmp::Ordering::Less => return false,
            std::cmp::Ordering::Equal => {}
        }
    }
    true
}

fn sub_in_place(value: &mut [u64], modulus: &[u64; 4]) {
    let mut borrow = false;
    for i in 0..value.len() {
        let m = if i < 4 { modulus[i] } else { 0 };
        let (diff, b1) = value[i].overflowing_sub(m);
        let (diff, b2) = diff.overflowing_sub(borrow as u64);
        value[i] = diff;
        borrow = b1 || b2;
    }
}

/// Binary long division of a little-endian limb array `value` by a
/// 256-bit `modulus`, returning the remainder as a [`Word`]. `value` may
/// be wider than 256 bits (up to 512, for `MULMOD`'s product).
fn mod_wide(value: &[u64], modulus: Word) -> Word {
    if modulus.is_zero() {
        return Word::ZERO;
    }
    let modulus_limbs: [u64; 4] = *modulus.as_limbs();
    let total_bits = value.len() * 64;
    let mut remainder = vec![0u64; value.len()];
    for bit in (0..total_bits).rev() {
        let mut carry = 0u64;
        for limb in remainder.iter_mut() {
            let new_carry = *limb >> 63;
            *limb = (*limb << 1) | carry;
            carry = new_carry;
        }
        let word_idx = bit / 64;
        let bit_idx = bit % 64;
        let value_bit = (value[word_idx] >> bit_idx) & 1;
        remainder[0] |= value_bit;
        if ge(&remainder, &modulus_limbs) {
            sub_in_place(&mut remainder, &modulus_limbs);
        }
    }
    Word::from_limbs([remainder[0], remainder[1], remainder[2], remainder[3]])
}

/// `(a + b) mod n`; `n == 0` yields `0` per §4.1's `MOD`/`ADDMOD` rule.
pub fn addmod(a: Word, b: Word, n: Word) -> Word {
    if n.is_zero() {
        return Word::ZERO;
    }
    let a_limbs: [u64; 4] = *a.as_limbs();
    let b_limbs: [u64; 4] = *b.as_limbs();
    let mut wide = [0u64; 5];
    let mut carry = 0u128;
    for i in 0..4 {
        let sum = a_limbs[i] as u128 + b_limbs[i] as u128 + carry;
        wide[i] = sum as u64;
        carry = sum >> 64;
    }
    wide[4] = carry as u64;
    mod_wide(&wide, n)
}

/// `(a * b) mod n`, the full 512-bit product reduced against `n`.
pub fn mulmod(a: Word, b: Word, n: Word) -> Word {
    if n.is_zero() {
        return Word::ZERO;
    }
    let a_limbs: [u64; 4] = *a.as_limbs();
    let b_limbs: [u64; 4] = *b.as_limbs();
    let mut wide = [0u64; 8];
    for (i, &ai) in a_limbs.iter().enumerate() {
        let mut carry = 0u128;
        for (j, &bj) in b_limbs.iter().enumerate() {
            let idx = i + j;
            let product = ai as u128 * bj as u128 + wide[idx] as u128 + carry;
            wide[idx] = product as u64;
            carry = product >> 64;
        }
        let mut idx = i + 4;
        while carry > 0 {
            let sum = wide[idx] as u128 + carry;
            wide[idx] = sum as u64;
            carry = sum >> 64;
            idx += 1;
        }
    }
    mod_wide(&wide, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addmod_wraps_past_256_bits() {
        // MAX + MAX mod 7, checked against modular addition on operands
        // already reduced below n (which fits in ordinary u256 overflow
        // semantics since each term stays under n).
        let n = Word::from(7u64);
        let a_mod = Word::MAX % n;
        let (sum, overflow) = a_mod.overflowing_add(a_mod);
        let expected = if overflow || sum >= n { sum.wrapping_sub(n) } else { sum };
        assert_eq!(addmod(Word::MAX, Word::MAX, n), expected);
    }

    #[test]
    fn addmod_matches_reference_on_small_values() {
        let a = Word::from(123456789u64);
        let b = Word::from(987654321u64);
        let n = Word::from(1000u64);
        assert_eq!(addmod(a, b, n), (a + b) % n);
    }

    #[test]
    fn mulmod_matches_reference_on_small_values() {
        let a = Word::from(123456789u64);
        let b = Word::from(987654321u64);
        let n = Word::from(1000u64);
        assert_eq!(mulmod(a, b, n), (a * b) % n);
    }

    #[test]
    fn mulmod_handles_a_product_that_overflows_256_bits() {
        let n = Word::from(97u64);
        let result = mulmod(Word::MAX, Word::MAX, n);
        assert!(result < n);
    }

    #[test]
    fn modulus_of_zero_is_zero() {
        assert_eq!(addmod(Word::from(5u64), Word::from(5u64), Word::ZERO), Word::ZERO);
        assert_eq!(mulmod(Word::from(5u64), Word::from(5u64), Word::ZERO), Word::ZERO);
    }
}
