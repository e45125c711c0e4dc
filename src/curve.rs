//! BN254 groups used by the commitment scheme
//!
//! Thin wrappers over arkworks points. Scalars are this crate's Montgomery
//! `Fr` and cross into arkworks as canonical limbs (MSM) or big-endian
//! bytes. G1 carries a GLV multiplication built on the field's
//! endomorphism split; G2 only needs enough to hold [1]₂ and [τ]₂.

use ark_bn254::{
    Bn254, Fq as ArkFq, Fr as ArkFr, G1Affine as ArkG1Affine, G1Projective as ArkG1Projective,
    G2Affine as ArkG2Affine, G2Projective as ArkG2Projective,
};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, Group, VariableBaseMSM};
use ark_ff::{BigInt, One, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::Zero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Add, Mul, Sub};
use std::sync::OnceLock;

use crate::field::{Fq, Fr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G1Affine(pub ArkG1Affine);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G1Projective(pub ArkG1Projective);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G2Affine(pub ArkG2Affine);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G2Projective(pub ArkG2Projective);

fn to_ark_fr(x: &Fr) -> ArkFr {
    ArkFr::from_be_bytes_mod_order(&x.to_bytes_be())
}

fn to_ark_fq(x: &Fq) -> ArkFq {
    ArkFq::from_be_bytes_mod_order(&x.to_bytes_be())
}

fn compressed_bytes<T: CanonicalSerialize>(point: &T) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(point.compressed_size());
    // writing into a Vec never fails
    let _ = point.serialize_compressed(&mut bytes);
    bytes
}

fn compressed_hex<T: CanonicalSerialize>(point: &T) -> String {
    format!("0x{}", hex::encode(compressed_bytes(point)))
}

fn from_compressed_hex<T: CanonicalDeserialize>(s: &str) -> Result<T, String> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|e| format!("invalid hex: {e}"))?;
    T::deserialize_compressed(bytes.as_slice()).map_err(|e| format!("invalid point: {e}"))
}

impl G1Affine {
    pub fn generator() -> Self {
        G1Affine(ArkG1Affine::generator())
    }

    /// The point at infinity
    pub fn identity() -> Self {
        G1Affine(ArkG1Affine::identity())
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_projective(&self) -> G1Projective {
        G1Projective(self.0.into())
    }

    /// 32 bytes; fed to transcripts and ceremony digests.
    pub fn to_compressed_bytes(&self) -> Vec<u8> {
        compressed_bytes(&self.0)
    }

    pub fn to_hex(&self) -> String {
        compressed_hex(&self.0)
    }

    pub fn neg(&self) -> Self {
        G1Affine(-self.0)
    }

    /// Scalar multiplication through the GLV endomorphism.
    ///
    /// k·P = k1·P − k2·φ(P) with φ(x, y) = (β·x, y) = λ·P, evaluated as a
    /// joint 128-bit double-and-add over both half scalars.
    pub fn mul_glv(&self, scalar: &Fr) -> G1Projective {
        if self.is_identity() {
            return G1Projective::identity();
        }
        let (k1, k2) = scalar.split_into_endomorphism_scalars();
        let (Some((k1_negative, k1_abs)), Some((k2_negative, k2_abs))) =
            (k1.to_signed_u128(), k2.to_signed_u128())
        else {
            return self.to_projective().scalar_mul(scalar);
        };

        let p = if k1_negative { -self.0 } else { self.0 };
        let phi = ArkG1Affine::new_unchecked(self.0.x * endomorphism_beta(), self.0.y);
        let q = if k2_negative { phi } else { -phi };
        let p_plus_q: ArkG1Projective = p + q;

        let mut acc = ArkG1Projective::zero();
        for bit in (0..128).rev() {
            acc.double_in_place();
            match ((k1_abs >> bit) & 1 == 1, (k2_abs >> bit) & 1 == 1) {
                (true, true) => acc += p_plus_q,
                (true, false) => acc += p,
                (false, true) => acc += q,
                (false, false) => {}
            }
        }
        G1Projective(acc)
    }
}

/// β in Fq matching λ in Fr, i.e. (β·x, y) = λ·(x, y).
fn endomorphism_beta() -> ArkFq {
    static BETA: OnceLock<ArkFq> = OnceLock::new();
    *BETA.get_or_init(|| {
        let beta = to_ark_fq(&Fq::cube_root_of_unity());
        let g = ArkG1Affine::generator();
        let expected = (g * to_ark_fr(&Fr::cube_root_of_unity())).into_affine();
        // the other primitive cube root pairs with λ²
        if ArkG1Affine::new_unchecked(g.x * beta, g.y) == expected {
            beta
        } else {
            beta * beta
        }
    })
}

impl Default for G1Affine {
    fn default() -> Self {
        G1Affine::identity()
    }
}

impl G1Projective {
    pub fn generator() -> Self {
        G1Projective(ArkG1Projective::generator())
    }

    pub fn identity() -> Self {
        G1Projective(ArkG1Projective::zero())
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_affine(&self) -> G1Affine {
        G1Affine(self.0.into_affine())
    }

    pub fn scalar_mul(&self, scalar: &Fr) -> Self {
        G1Projective(self.0 * to_ark_fr(scalar))
    }

    /// Σ scalars[i]·points[i]
    pub fn msm(points: &[G1Affine], scalars: &[Fr]) -> Self {
        let ark_points: Vec<_> = points.iter().map(|p| p.0).collect();
        let ark_scalars: Vec<_> = scalars.iter().map(|s| BigInt::new(s.to_canonical())).collect();
        G1Projective(ArkG1Projective::msm_bigint(&ark_points, &ark_scalars))
    }
}

impl Add for G1Projective {
    type Output = G1Projective;
    fn add(self, rhs: G1Projective) -> G1Projective {
        G1Projective(self.0 + rhs.0)
    }
}

impl Sub for G1Projective {
    type Output = G1Projective;
    fn sub(self, rhs: G1Projective) -> G1Projective {
        G1Projective(self.0 - rhs.0)
    }
}

impl Mul<Fr> for G1Projective {
    type Output = G1Projective;
    fn mul(self, rhs: Fr) -> G1Projective {
        self.scalar_mul(&rhs)
    }
}

impl From<G1Affine> for G1Projective {
    fn from(p: G1Affine) -> Self {
        p.to_projective()
    }
}

impl From<G1Projective> for G1Affine {
    fn from(p: G1Projective) -> Self {
        p.to_affine()
    }
}

impl G2Affine {
    pub fn generator() -> Self {
        G2Affine(ArkG2Affine::generator())
    }

    pub fn to_projective(&self) -> G2Projective {
        G2Projective(self.0.into())
    }

    pub fn to_compressed_bytes(&self) -> Vec<u8> {
        compressed_bytes(&self.0)
    }
}

impl G2Projective {
    pub fn to_affine(&self) -> G2Affine {
        G2Affine(self.0.into_affine())
    }

    pub fn scalar_mul(&self, scalar: &Fr) -> Self {
        G2Projective(self.0 * to_ark_fr(scalar))
    }
}

impl Add for G2Projective {
    type Output = G2Projective;
    fn add(self, rhs: G2Projective) -> G2Projective {
        G2Projective(self.0 + rhs.0)
    }
}

/// e(P1, Q1) = e(P2, Q2), checked as e(P1, Q1) · e(−P2, Q2) = 1 with a
/// single final exponentiation.
pub fn pairing_check(p1: &G1Affine, q1: &G2Affine, p2: &G1Affine, q2: &G2Affine) -> bool {
    let product = Bn254::multi_pairing([p1.0, p2.neg().0], [q1.0, q2.0]);
    product.0.is_one()
}

impl Serialize for G1Affine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for G1Affine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        from_compressed_hex(&s).map(G1Affine).map_err(serde::de::Error::custom)
    }
}

impl Serialize for G2Affine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&compressed_hex(&self.0))
    }
}

impl<'de> Deserialize<'de> for G2Affine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        from_compressed_hex(&s).map(G2Affine).map_err(serde::de::Error::custom)
    }
}
