//! GLV scalar decomposition
//!
//! For a cube root of unity λ mod r, every scalar k splits as
//! k = k1 − k2·λ with |k1|, |k2| < 2^128. The short lattice basis
//! {(a1, b1), (a2, b2)} of {(x, y) : x ≡ y·λ} is found once with the
//! extended Euclidean algorithm on (r, λ). At runtime the rounding
//! coefficients are approximated as (k · g_i) >> 256, where
//! g_i = ⌊2^256 · |b_j| / |det|⌋, so no long division is needed.

use num_bigint::{BigInt, Sign};

use super::arithmetic::{high_half, mul_wide};
use super::params::{biguint_from_limbs, limbs_from_biguint, FieldParams};
use super::FieldElement;

/// Precomputed lattice basis and rounding constants.
pub(crate) struct EndomorphismBasis<P: FieldParams> {
    a1: FieldElement<P>,
    b1: FieldElement<P>,
    a2: FieldElement<P>,
    b2: FieldElement<P>,
    g1: [u64; 4],
    g1_negative: bool,
    g2: [u64; 4],
    g2_negative: bool,
}

impl<P: FieldParams> EndomorphismBasis<P> {
    fn derive() -> Self {
        let modulus = BigInt::from(biguint_from_limbs(&P::MODULUS));
        let lambda = BigInt::from(FieldElement::<P>::cube_root_of_unity().to_biguint());

        // r_i ≡ t_i · λ (mod n) along the remainder sequence
        let mut r = vec![modulus.clone(), lambda];
        let mut t = vec![BigInt::from(0), BigInt::from(1)];
        while r[r.len() - 1].sign() != Sign::NoSign {
            let i = r.len() - 1;
            let q = &r[i - 1] / &r[i];
            let next_r = &r[i - 1] - &q * &r[i];
            let next_t = &t[i - 1] - &q * &t[i];
            r.push(next_r);
            t.push(next_t);
        }

        // l: last index with r_l >= sqrt(n)
        let l = r
            .iter()
            .rposition(|ri| ri * ri >= modulus)
            .unwrap_or(0);

        let (a1, b1) = (r[l + 1].clone(), t[l + 1].clone());
        let first = (r[l].clone(), t[l].clone());
        let (a2, b2) = match r.get(l + 2) {
            Some(r2) if r2.sign() != Sign::NoSign => {
                let second = (r2.clone(), t[l + 2].clone());
                let norm = |v: &(BigInt, BigInt)| &v.0 * &v.0 + &v.1 * &v.1;
                if norm(&second) < norm(&first) {
                    second
                } else {
                    first
                }
            }
            _ => first,
        };

        let det = &a1 * &b2 - &a2 * &b1;
        let shift = BigInt::from(1) << 256usize;
        let rounding = |numerator: &BigInt| -> [u64; 4] {
            let g = (&shift * BigInt::from(numerator.magnitude().clone())) / BigInt::from(det.magnitude().clone());
            limbs_from_biguint(g.magnitude())
        };

        // c1 ≈ k·b2/det, c2 ≈ −k·b1/det
        let g1_negative = (b2.sign() == Sign::Minus) != (det.sign() == Sign::Minus);
        let g2_negative = (b1.sign() == Sign::Minus) == (det.sign() == Sign::Minus);

        Self {
            a1: signed_to_field(&a1),
            b1: signed_to_field(&b1),
            a2: signed_to_field(&a2),
            b2: signed_to_field(&b2),
            g1: rounding(&b2),
            g1_negative,
            g2: rounding(&b1),
            g2_negative,
        }
    }
}

fn signed_to_field<P: FieldParams>(value: &BigInt) -> FieldElement<P> {
    let magnitude = FieldElement::<P>::from_biguint(value.magnitude());
    if value.sign() == Sign::Minus {
        -magnitude
    } else {
        magnitude
    }
}

impl<P: FieldParams> FieldElement<P> {
    /// Split k into (k1, k2) with k = k1 − k2·λ and both halves below 2^128
    /// in absolute value.
    ///
    /// The halves are returned as field elements; use
    /// [`Self::to_signed_u128`] to read them as signed 128-bit integers.
    pub fn split_into_endomorphism_scalars(&self) -> (Self, Self) {
        let basis = P::cache().endomorphism.get_or_init(EndomorphismBasis::derive);
        let k = self.to_canonical();

        let round = |g: &[u64; 4], negative: bool| {
            let c = Self::from_canonical_reduced(high_half(&mul_wide(&k, g)));
            if negative {
                -c
            } else {
                c
            }
        };
        let c1 = round(&basis.g1, basis.g1_negative);
        let c2 = round(&basis.g2, basis.g2_negative);

        // (k1, k2) = (k, 0) − c1·(a1, b1) − c2·(a2, b2)
        let k1 = *self - c1 * basis.a1 - c2 * basis.a2;
        let k2 = -(c1 * basis.b1 + c2 * basis.b2);
        (k1.reduce_once(), k2.reduce_once())
    }

    /// Read a small element as (negative, |value|) when |value| < 2^128.
    pub fn to_signed_u128(&self) -> Option<(bool, u128)> {
        let fits = |limbs: [u64; 4]| {
            if limbs[2] == 0 && limbs[3] == 0 {
                Some(limbs[0] as u128 | (limbs[1] as u128) << 64)
            } else {
                None
            }
        };
        if let Some(value) = fits(self.to_canonical()) {
            return Some((false, value));
        }
        fits((-*self).to_canonical()).map(|value| (true, value))
    }
}

#[cfg(test)]
mod tests {
    use crate::field::Fr;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_split_recombines() {
        let lambda = Fr::cube_root_of_unity();
        let mut rng = ChaCha20Rng::seed_from_u64(12345);
        for _ in 0..50 {
            let k = Fr::random(&mut rng);
            let (k1, k2) = k.split_into_endomorphism_scalars();
            assert_eq!(k1 - k2 * lambda, k);
            assert!(k1.to_signed_u128().is_some());
            assert!(k2.to_signed_u128().is_some());
        }
    }

    #[test]
    fn test_split_edge_scalars() {
        let lambda = Fr::cube_root_of_unity();
        for k in [Fr::zero(), Fr::one(), -Fr::one(), lambda, -lambda] {
            let (k1, k2) = k.split_into_endomorphism_scalars();
            assert_eq!(k1 - k2 * lambda, k);
            assert!(k1.to_signed_u128().is_some());
            assert!(k2.to_signed_u128().is_some());
        }
    }

    #[test]
    fn test_signed_view() {
        assert_eq!(Fr::from_u64(9).to_signed_u128(), Some((false, 9)));
        assert_eq!((-Fr::from_u64(9)).to_signed_u128(), Some((true, 9)));
        assert!(Fr::from_u64(3).pow(200).to_signed_u128().is_none());
    }
}
