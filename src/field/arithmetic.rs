//! 256-bit limb arithmetic
//!
//! Schoolbook multiplication into 512 bits and word-by-word Montgomery
//! reduction. Inputs to `montgomery_mul` may be coarse (< 2p); since
//! 4p < 2^256 the reduced product stays below 2p and a single conditional
//! subtraction lands it in [0, p).

use super::params::FieldConstants;

#[inline(always)]
pub(crate) fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = a as u128 + b as u128 + carry as u128;
    (t as u64, (t >> 64) as u64)
}

#[inline(always)]
pub(crate) fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let t = (a as u128).wrapping_sub(b as u128 + borrow as u128);
    (t as u64, (t >> 127) as u64)
}

/// a + b·c + carry
#[inline(always)]
pub(crate) fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let t = a as u128 + (b as u128) * (c as u128) + carry as u128;
    (t as u64, (t >> 64) as u64)
}

pub(crate) fn add_limbs(a: &[u64; 4], b: &[u64; 4]) -> ([u64; 4], u64) {
    let mut out = [0u64; 4];
    let mut carry = 0;
    for i in 0..4 {
        (out[i], carry) = adc(a[i], b[i], carry);
    }
    (out, carry)
}

pub(crate) fn sub_limbs(a: &[u64; 4], b: &[u64; 4]) -> ([u64; 4], u64) {
    let mut out = [0u64; 4];
    let mut borrow = 0;
    for i in 0..4 {
        (out[i], borrow) = sbb(a[i], b[i], borrow);
    }
    (out, borrow)
}

/// a >= b as 256-bit integers
#[inline]
pub(crate) fn geq(a: &[u64; 4], b: &[u64; 4]) -> bool {
    for i in (0..4).rev() {
        if a[i] != b[i] {
            return a[i] > b[i];
        }
    }
    true
}

/// Subtract `modulus` once if `a >= modulus`.
#[inline]
pub(crate) fn conditional_subtract(a: [u64; 4], modulus: &[u64; 4]) -> [u64; 4] {
    if geq(&a, modulus) {
        sub_limbs(&a, modulus).0
    } else {
        a
    }
}

/// Full 512-bit product.
pub(crate) fn mul_wide(a: &[u64; 4], b: &[u64; 4]) -> [u64; 8] {
    let mut t = [0u64; 8];
    for i in 0..4 {
        let mut carry = 0;
        for j in 0..4 {
            (t[i + j], carry) = mac(t[i + j], a[i], b[j], carry);
        }
        t[i + 4] = carry;
    }
    t
}

/// Montgomery reduction: t · 2^{-256} mod p, output below 2p for t < p·2^256.
pub(crate) fn montgomery_reduce(mut t: [u64; 8], modulus: &[u64; 4], r_inv: u64) -> [u64; 4] {
    for i in 0..4 {
        let m = t[i].wrapping_mul(r_inv);
        let mut carry = 0;
        for j in 0..4 {
            (t[i + j], carry) = mac(t[i + j], m, modulus[j], carry);
        }
        let mut k = i + 4;
        while carry != 0 && k < 8 {
            (t[k], carry) = adc(t[k], 0, carry);
            k += 1;
        }
    }
    [t[4], t[5], t[6], t[7]]
}

/// Montgomery product in [0, p).
#[inline]
pub(crate) fn montgomery_mul(a: &[u64; 4], b: &[u64; 4], c: &FieldConstants) -> [u64; 4] {
    let reduced = montgomery_reduce(mul_wide(a, b), &c.modulus, c.r_inv);
    conditional_subtract(reduced, &c.modulus)
}

/// Upper 256 bits of a 512-bit value.
#[inline]
pub(crate) fn high_half(t: &[u64; 8]) -> [u64; 4] {
    [t[4], t[5], t[6], t[7]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_and_borrow() {
        let max = [u64::MAX; 4];
        let (sum, carry) = add_limbs(&max, &[1, 0, 0, 0]);
        assert_eq!(sum, [0; 4]);
        assert_eq!(carry, 1);

        let (diff, borrow) = sub_limbs(&[0; 4], &[1, 0, 0, 0]);
        assert_eq!(diff, max);
        assert_eq!(borrow, 1);
    }

    #[test]
    fn test_mul_wide_square_of_max_limb() {
        let t = mul_wide(&[u64::MAX, 0, 0, 0], &[u64::MAX, 0, 0, 0]);
        // (2^64 - 1)^2 = 2^128 - 2^65 + 1
        assert_eq!(t[0], 1);
        assert_eq!(t[1], u64::MAX - 1);
        assert!(t[2..].iter().all(|&x| x == 0));
    }

    #[test]
    fn test_geq() {
        assert!(geq(&[0, 0, 0, 1], &[u64::MAX, u64::MAX, u64::MAX, 0]));
        assert!(geq(&[5, 0, 0, 0], &[5, 0, 0, 0]));
        assert!(!geq(&[4, 0, 0, 0], &[5, 0, 0, 0]));
    }
}
