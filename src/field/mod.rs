//! BN254 Prime Field Arithmetic
//!
//! `FieldElement<P>` is a 256-bit integer held as four 64-bit limbs in
//! Montgomery form. The representation contract:
//! - `*` returns a value in [0, p)
//! - `+` and `-` return "coarse" values in [0, 2p)
//! - equality, hashing, serialization and `to_canonical` reduce first
//!
//! `Fr` is the BN254 scalar field (circuit values, polynomial coefficients);
//! `Fq` is the base field (curve coordinates, used by the GLV endomorphism).

pub mod arithmetic;
pub mod endomorphism;
pub mod params;
pub mod roots;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{Product, Sum};
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use arithmetic::{add_limbs, conditional_subtract, geq, montgomery_mul, montgomery_reduce, sub_limbs};
pub use params::{Bn254FqParams, Bn254FrParams, FieldConstants, FieldParams, NUM_COSET_GENERATORS};

/// BN254 scalar field.
pub type Fr = FieldElement<Bn254FrParams>;

/// BN254 base field.
pub type Fq = FieldElement<Bn254FqParams>;

/// An element of the prime field described by `P`, in Montgomery form.
pub struct FieldElement<P: FieldParams> {
    limbs: [u64; 4],
    _params: PhantomData<P>,
}

impl<P: FieldParams> FieldElement<P> {
    #[inline]
    pub(crate) const fn from_montgomery_limbs(limbs: [u64; 4]) -> Self {
        Self {
            limbs,
            _params: PhantomData,
        }
    }

    /// Raw Montgomery limbs (possibly coarse).
    pub fn montgomery_limbs(&self) -> [u64; 4] {
        self.limbs
    }

    pub fn zero() -> Self {
        Self::from_montgomery_limbs([0; 4])
    }

    pub fn one() -> Self {
        Self::from_montgomery_limbs(P::constants().r)
    }

    pub fn from_u64(val: u64) -> Self {
        Self::from_canonical_reduced([val, 0, 0, 0])
    }

    pub fn from_u128(val: u128) -> Self {
        Self::from_canonical_reduced([val as u64, (val >> 64) as u64, 0, 0])
    }

    /// Enter Montgomery form from a plain integer; `None` if `limbs >= p`.
    pub fn from_canonical(limbs: [u64; 4]) -> Option<Self> {
        let c = P::constants();
        if geq(&limbs, &c.modulus) {
            return None;
        }
        Some(Self::from_montgomery_limbs(montgomery_mul(&limbs, &c.r_squared, c)))
    }

    /// Enter Montgomery form from any 256-bit integer, reducing mod p.
    pub fn from_canonical_reduced(limbs: [u64; 4]) -> Self {
        let c = P::constants();
        let mut value = limbs;
        while geq(&value, &c.modulus) {
            value = sub_limbs(&value, &c.modulus).0;
        }
        Self::from_montgomery_limbs(montgomery_mul(&value, &c.r_squared, c))
    }

    /// Plain integer value in [0, p), little-endian limbs.
    pub fn to_canonical(&self) -> [u64; 4] {
        let c = P::constants();
        let mut t = [0u64; 8];
        t[..4].copy_from_slice(&self.limbs);
        conditional_subtract(montgomery_reduce(t, &c.modulus, c.r_inv), &c.modulus)
    }

    pub(crate) fn from_biguint(value: &BigUint) -> Self {
        let p = params::biguint_from_limbs(&P::MODULUS);
        Self::from_canonical_reduced(params::limbs_from_biguint(&(value % p)))
    }

    pub(crate) fn to_biguint(&self) -> BigUint {
        params::biguint_from_limbs(&self.to_canonical())
    }

    /// Bring a coarse value into [0, p).
    #[inline]
    pub fn reduce_once(&self) -> Self {
        Self::from_montgomery_limbs(conditional_subtract(self.limbs, &P::constants().modulus))
    }

    pub fn is_zero(&self) -> bool {
        self.reduce_once().limbs == [0; 4]
    }

    pub fn is_one(&self) -> bool {
        self.reduce_once().limbs == P::constants().r
    }

    pub fn square(&self) -> Self {
        *self * *self
    }

    pub fn double(&self) -> Self {
        *self + *self
    }

    /// x^exp using square-and-multiply
    pub fn pow(&self, exp: u64) -> Self {
        self.pow_limbs(&[exp, 0, 0, 0])
    }

    /// x^exp for a 256-bit exponent
    pub fn pow_limbs(&self, exp: &[u64; 4]) -> Self {
        let mut result = Self::one();
        let mut started = false;
        for i in (0..4).rev() {
            for bit in (0..64).rev() {
                if started {
                    result = result.square();
                }
                if (exp[i] >> bit) & 1 == 1 {
                    result = result * *self;
                    started = true;
                }
            }
        }
        result
    }

    /// Multiplicative inverse via Fermat, x^(p−2).
    ///
    /// Zero maps to zero; use [`Self::inverse`] where that matters.
    pub fn invert(&self) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        self.pow_limbs(&P::constants().modulus_minus_two)
    }

    /// Checked inverse, `None` for zero.
    pub fn inverse(&self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(self.invert())
        }
    }

    /// Invert every non-zero element in place with one field inversion.
    ///
    /// Zero entries are skipped and stay zero.
    pub fn batch_invert(elements: &mut [Self]) {
        let mut prefix = Vec::with_capacity(elements.len());
        let mut acc = Self::one();
        for x in elements.iter() {
            prefix.push(acc);
            if !x.is_zero() {
                acc = acc * *x;
            }
        }

        let mut inv = acc.invert();
        for (x, before) in elements.iter_mut().zip(prefix).rev() {
            if x.is_zero() {
                continue;
            }
            let x_inv = inv * before;
            inv = inv * *x;
            *x = x_inv;
        }
    }

    /// Uniformly random element by rejection sampling.
    pub fn random<R: rand::Rng>(rng: &mut R) -> Self {
        let modulus = P::constants().modulus;
        let top_bits = 64 - modulus[3].leading_zeros();
        let mask = if top_bits == 64 { u64::MAX } else { (1u64 << top_bits) - 1 };
        loop {
            let mut limbs = [rng.gen::<u64>(), rng.gen::<u64>(), rng.gen::<u64>(), rng.gen::<u64>()];
            limbs[3] &= mask;
            if let Some(x) = Self::from_canonical(limbs) {
                return x;
            }
        }
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// 32 bytes: four big-endian limbs, most significant limb first.
    pub fn to_bytes_be(&self) -> [u8; 32] {
        let limbs = self.to_canonical();
        let mut bytes = [0u8; 32];
        for (i, limb) in limbs.iter().rev().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_be_bytes());
        }
        bytes
    }

    /// Inverse of [`Self::to_bytes_be`]; `None` for values >= p.
    pub fn from_bytes_be(bytes: &[u8; 32]) -> Option<Self> {
        let mut limbs = [0u64; 4];
        for (i, chunk) in bytes.chunks_exact(8).enumerate() {
            let mut limb = [0u8; 8];
            limb.copy_from_slice(chunk);
            limbs[3 - i] = u64::from_be_bytes(limb);
        }
        Self::from_canonical(limbs)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes_be()))
    }

    pub fn to_short_hex(&self) -> String {
        let full = self.to_hex();
        if full.len() > 18 {
            format!("{}...{}", &full[..10], &full[full.len() - 8..])
        } else {
            full
        }
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Self::from_bytes_be(&arr)
    }

    /// The value as a u64 if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        let limbs = self.to_canonical();
        if limbs[1..].iter().all(|&l| l == 0) {
            Some(limbs[0])
        } else {
            None
        }
    }

    /// Bit `index` of the canonical integer value.
    pub fn get_bit(&self, index: usize) -> bool {
        if index >= 256 {
            return false;
        }
        (self.to_canonical()[index / 64] >> (index % 64)) & 1 == 1
    }
}

// ============================================================================
// Std traits
// ============================================================================

impl<P: FieldParams> Clone for FieldElement<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: FieldParams> Copy for FieldElement<P> {}

impl<P: FieldParams> PartialEq for FieldElement<P> {
    fn eq(&self, other: &Self) -> bool {
        self.reduce_once().limbs == other.reduce_once().limbs
    }
}

impl<P: FieldParams> Eq for FieldElement<P> {}

impl<P: FieldParams> Hash for FieldElement<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reduce_once().limbs.hash(state);
    }
}

impl<P: FieldParams> Default for FieldElement<P> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<P: FieldParams> fmt::Debug for FieldElement<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", P::NAME, self.to_hex())
    }
}

impl<P: FieldParams> fmt::Display for FieldElement<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl<P: FieldParams> Add for FieldElement<P> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let c = P::constants();
        let (sum, _) = add_limbs(&self.limbs, &rhs.limbs);
        Self::from_montgomery_limbs(conditional_subtract(sum, &c.twice_modulus))
    }
}

impl<P: FieldParams> Sub for FieldElement<P> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let c = P::constants();
        let (diff, borrow) = sub_limbs(&self.limbs, &rhs.limbs);
        if borrow != 0 {
            Self::from_montgomery_limbs(add_limbs(&diff, &c.twice_modulus).0)
        } else {
            Self::from_montgomery_limbs(diff)
        }
    }
}

impl<P: FieldParams> Mul for FieldElement<P> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::from_montgomery_limbs(montgomery_mul(&self.limbs, &rhs.limbs, P::constants()))
    }
}

/// Division by zero yields zero.
impl<P: FieldParams> Div for FieldElement<P> {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        self * rhs.invert()
    }
}

impl<P: FieldParams> Neg for FieldElement<P> {
    type Output = Self;
    fn neg(self) -> Self {
        let reduced = self.reduce_once();
        if reduced.limbs == [0; 4] {
            return reduced;
        }
        Self::from_montgomery_limbs(sub_limbs(&P::constants().modulus, &reduced.limbs).0)
    }
}

impl<P: FieldParams> AddAssign for FieldElement<P> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<P: FieldParams> SubAssign for FieldElement<P> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<P: FieldParams> MulAssign for FieldElement<P> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<P: FieldParams> Sum for FieldElement<P> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

impl<P: FieldParams> Product for FieldElement<P> {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::one(), |acc, x| acc * x)
    }
}

impl<P: FieldParams> From<u64> for FieldElement<P> {
    fn from(val: u64) -> Self {
        Self::from_u64(val)
    }
}

impl<P: FieldParams> From<u128> for FieldElement<P> {
    fn from(val: u128) -> Self {
        Self::from_u128(val)
    }
}

impl<P: FieldParams> From<i64> for FieldElement<P> {
    fn from(val: i64) -> Self {
        if val >= 0 {
            Self::from_u64(val as u64)
        } else {
            -Self::from_u64(val.unsigned_abs())
        }
    }
}

impl<P: FieldParams> From<bool> for FieldElement<P> {
    fn from(val: bool) -> Self {
        if val {
            Self::one()
        } else {
            Self::zero()
        }
    }
}

// Serde: JSON objects with full and abbreviated hex
impl<P: FieldParams> Serialize for FieldElement<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct FieldJson {
            full: String,
            short: String,
        }

        FieldJson {
            full: self.to_hex(),
            short: self.to_short_hex(),
        }
        .serialize(serializer)
    }
}

impl<'de, P: FieldParams> Deserialize<'de> for FieldElement<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct FieldJson {
            full: String,
        }

        let json = FieldJson::deserialize(deserializer)?;
        Self::from_hex(&json.full).ok_or_else(|| serde::de::Error::custom("invalid field element hex"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{BigInteger, PrimeField};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_basic_arithmetic() {
        let a = Fr::from_u64(5);
        let b = Fr::from_u64(3);

        assert_eq!(a + b, Fr::from_u64(8));
        assert_eq!(a - b, Fr::from_u64(2));
        assert_eq!(b - a, -Fr::from_u64(2));
        assert_eq!(a * b, Fr::from_u64(15));
        assert_eq!(Fr::from_u64(15) / b, a);
    }

    #[test]
    fn test_matches_arkworks_multiplication() {
        let mut rng = ChaCha20Rng::seed_from_u64(12345);
        for _ in 0..20 {
            let a = Fr::random(&mut rng);
            let b = Fr::random(&mut rng);
            let ark_a = ark_bn254::Fr::from_be_bytes_mod_order(&a.to_bytes_be());
            let ark_b = ark_bn254::Fr::from_be_bytes_mod_order(&b.to_bytes_be());
            let expected = (ark_a * ark_b).into_bigint().to_bytes_be();
            assert_eq!((a * b).to_bytes_be().to_vec(), expected);
        }
    }

    #[test]
    fn test_add_output_is_coarse_but_equal() {
        let minus_one = -Fr::one();
        let sum = minus_one + minus_one;
        // 2p - 2 reduces to p - 2
        assert_eq!(sum, -Fr::from_u64(2));
        assert_eq!(sum.reduce_once().montgomery_limbs(), (-Fr::from_u64(2)).montgomery_limbs());
    }

    #[test]
    fn test_inverse() {
        let a = Fr::from_u64(5);
        let a_inv = a.inverse().unwrap();
        assert_eq!(a * a_inv, Fr::one());
        assert_eq!(Fr::zero().invert(), Fr::zero());
        assert!(Fr::zero().inverse().is_none());
    }

    #[test]
    fn test_batch_invert_skips_zero() {
        let mut values = vec![Fr::from_u64(2), Fr::zero(), Fr::from_u64(7)];
        Fr::batch_invert(&mut values);
        assert_eq!(values[0], Fr::from_u64(2).invert());
        assert!(values[1].is_zero());
        assert_eq!(values[2], Fr::from_u64(7).invert());
    }

    #[test]
    fn test_bytes_are_big_endian_canonical() {
        let bytes = Fr::from_u64(0x0102).to_bytes_be();
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert!(bytes[..30].iter().all(|&b| b == 0));

        let modulus_bytes = {
            let mut out = [0u8; 32];
            for (i, limb) in Bn254FrParams::MODULUS.iter().rev().enumerate() {
                out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_be_bytes());
            }
            out
        };
        assert!(Fr::from_bytes_be(&modulus_bytes).is_none());
    }

    #[test]
    fn test_hex_roundtrip() {
        let a = Fr::from_u64(12345678901234567890);
        let b = Fr::from_hex(&a.to_hex()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_json_shape() {
        let a = Fr::from_u64(42);
        let json = serde_json::to_value(a).unwrap();
        assert!(json.get("full").is_some());
        assert!(json.get("short").is_some());
        let back: Fr = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }
}
