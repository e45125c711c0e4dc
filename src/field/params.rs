//! Field parameter sets
//!
//! A parameter set names a prime modulus and a few generators. Everything
//! else the arithmetic needs (Montgomery constants, exponents for inversion
//! and square roots, the two-adic decomposition of p − 1) is derived once
//! from the modulus and cached in a process-wide `OnceLock`.

use num_bigint::BigUint;
use std::sync::OnceLock;

use super::endomorphism::EndomorphismBasis;
use super::FieldElement;

/// Number of coset generators computed per field.
///
/// Indices 0..6 separate the wire columns, index 6 is the tag column and
/// index 7 the public-input column of the permutation argument.
pub const NUM_COSET_GENERATORS: usize = 8;

/// A prime field description.
pub trait FieldParams: 'static + Sized + Send + Sync {
    /// Short display name ("Fr", "Fq")
    const NAME: &'static str;

    /// Modulus as little-endian 64-bit limbs
    const MODULUS: [u64; 4];

    /// Generator of the full multiplicative group
    const MULTIPLICATIVE_GENERATOR: u64;

    /// A primitive cube root of unity, in decimal
    const CUBE_ROOT_OF_UNITY: &'static str;

    /// Derived integer constants
    fn constants() -> &'static FieldConstants;

    /// Derived field-element tables
    fn cache() -> &'static FieldCache<Self>;
}

// ============================================================================
// Derived constants
// ============================================================================

/// Integer constants derived from the modulus.
#[derive(Clone, Debug)]
pub struct FieldConstants {
    pub modulus: [u64; 4],
    pub twice_modulus: [u64; 4],
    /// R = 2^256 mod p, the Montgomery form of one
    pub r: [u64; 4],
    /// R^2 mod p, used to enter Montgomery form
    pub r_squared: [u64; 4],
    /// −p^{-1} mod 2^64
    pub r_inv: u64,
    pub modulus_minus_two: [u64; 4],
    /// (p − 1) / 2, the Euler criterion exponent
    pub legendre_exponent: [u64; 4],
    /// s such that p − 1 = 2^s · Q with Q odd
    pub two_adicity: u32,
    /// Q
    pub trace: [u64; 4],
    /// (Q + 1) / 2
    pub trace_plus_one_div_two: [u64; 4],
    /// (p + 1) / 4 when p ≡ 3 mod 4
    pub sqrt_exponent: Option<[u64; 4]>,
}

impl FieldConstants {
    pub fn derive(modulus: [u64; 4]) -> Self {
        let p = biguint_from_limbs(&modulus);
        let one = BigUint::from(1u64);
        let r = (&one << 256usize) % &p;
        let r_squared = (&r * &r) % &p;
        let p_minus_one = &p - &one;
        let two_adicity = p_minus_one.trailing_zeros().unwrap_or(0) as u32;
        let trace = &p_minus_one >> two_adicity as usize;
        let sqrt_exponent = if modulus[0] & 3 == 3 {
            Some(limbs_from_biguint(&((&p + &one) >> 2usize)))
        } else {
            None
        };

        Self {
            modulus,
            twice_modulus: limbs_from_biguint(&(&p << 1usize)),
            r: limbs_from_biguint(&r),
            r_squared: limbs_from_biguint(&r_squared),
            r_inv: montgomery_inv64(modulus[0]),
            modulus_minus_two: limbs_from_biguint(&(&p - BigUint::from(2u64))),
            legendre_exponent: limbs_from_biguint(&(&p_minus_one >> 1usize)),
            two_adicity,
            trace_plus_one_div_two: limbs_from_biguint(&((&trace + &one) >> 1usize)),
            trace: limbs_from_biguint(&trace),
            sqrt_exponent,
        }
    }
}

/// Lazily computed field-element tables.
pub struct FieldCache<P: FieldParams> {
    pub(crate) root_of_unity: OnceLock<FieldElement<P>>,
    pub(crate) coset_generators: OnceLock<[FieldElement<P>; NUM_COSET_GENERATORS]>,
    pub(crate) cube_root: OnceLock<FieldElement<P>>,
    pub(crate) endomorphism: OnceLock<EndomorphismBasis<P>>,
}

impl<P: FieldParams> FieldCache<P> {
    pub const fn new() -> Self {
        Self {
            root_of_unity: OnceLock::new(),
            coset_generators: OnceLock::new(),
            cube_root: OnceLock::new(),
            endomorphism: OnceLock::new(),
        }
    }
}

// ============================================================================
// BN254
// ============================================================================

/// Scalar field of BN254 (the circuit field).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bn254FrParams;

impl FieldParams for Bn254FrParams {
    const NAME: &'static str = "Fr";
    const MODULUS: [u64; 4] = [
        0x43e1f593f0000001,
        0x2833e84879b97091,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ];
    const MULTIPLICATIVE_GENERATOR: u64 = 5;
    const CUBE_ROOT_OF_UNITY: &'static str =
        "4407920970296243842393367215006156084916469457145843978461";

    fn constants() -> &'static FieldConstants {
        static CONSTANTS: OnceLock<FieldConstants> = OnceLock::new();
        CONSTANTS.get_or_init(|| FieldConstants::derive(Self::MODULUS))
    }

    fn cache() -> &'static FieldCache<Self> {
        static CACHE: FieldCache<Bn254FrParams> = FieldCache::new();
        &CACHE
    }
}

/// Base field of BN254 (curve coordinates).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bn254FqParams;

impl FieldParams for Bn254FqParams {
    const NAME: &'static str = "Fq";
    const MODULUS: [u64; 4] = [
        0x3c208c16d87cfd47,
        0x97816a916871ca8d,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ];
    const MULTIPLICATIVE_GENERATOR: u64 = 3;
    const CUBE_ROOT_OF_UNITY: &'static str =
        "2203960485148121921418603742825762020974279258880205651966";

    fn constants() -> &'static FieldConstants {
        static CONSTANTS: OnceLock<FieldConstants> = OnceLock::new();
        CONSTANTS.get_or_init(|| FieldConstants::derive(Self::MODULUS))
    }

    fn cache() -> &'static FieldCache<Self> {
        static CACHE: FieldCache<Bn254FqParams> = FieldCache::new();
        &CACHE
    }
}

// ============================================================================
// Limb conversions
// ============================================================================

pub(crate) fn biguint_from_limbs(limbs: &[u64; 4]) -> BigUint {
    let mut bytes = [0u8; 32];
    for (i, limb) in limbs.iter().enumerate() {
        bytes[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_le_bytes());
    }
    BigUint::from_bytes_le(&bytes)
}

/// Low 256 bits of `value` as limbs.
pub(crate) fn limbs_from_biguint(value: &BigUint) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (i, digit) in value.iter_u64_digits().take(4).enumerate() {
        limbs[i] = digit;
    }
    limbs
}

/// −p0^{-1} mod 2^64 by Newton iteration.
fn montgomery_inv64(p0: u64) -> u64 {
    let mut inv = 1u64;
    for _ in 0..6 {
        inv = inv.wrapping_mul(2u64.wrapping_sub(p0.wrapping_mul(inv)));
    }
    inv.wrapping_neg()
}
