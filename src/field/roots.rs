//! Roots of unity, square roots and coset generators

use num_bigint::BigUint;

use super::params::{FieldParams, NUM_COSET_GENERATORS};
use super::FieldElement;

impl<P: FieldParams> FieldElement<P> {
    /// Generator of the full multiplicative group.
    pub fn multiplicative_generator() -> Self {
        Self::from_u64(P::MULTIPLICATIVE_GENERATOR)
    }

    /// Primitive 2^s-th root of unity, g^Q.
    fn two_adic_root_of_unity() -> Self {
        *P::cache().root_of_unity.get_or_init(|| {
            Self::multiplicative_generator().pow_limbs(&P::constants().trace)
        })
    }

    /// Primitive n-th root of unity for a power-of-two `n`.
    ///
    /// Returns `None` if `n` is not a power of two or exceeds 2^s.
    pub fn get_root_of_unity(n: usize) -> Option<Self> {
        if !n.is_power_of_two() {
            return None;
        }
        let log_n = n.trailing_zeros();
        let s = P::constants().two_adicity;
        if log_n > s {
            return None;
        }
        let mut root = Self::two_adic_root_of_unity();
        for _ in log_n..s {
            root = root.square();
        }
        Some(root)
    }

    /// Euler criterion: true for zero and quadratic residues.
    pub fn is_square(&self) -> bool {
        if self.is_zero() {
            return true;
        }
        self.pow_limbs(&P::constants().legendre_exponent).is_one()
    }

    /// Square root as a (found, root) pair; non-residues give `(false, 0)`.
    pub fn sqrt(&self) -> (bool, Self) {
        if self.is_zero() {
            return (true, Self::zero());
        }
        if !self.is_square() {
            return (false, Self::zero());
        }

        let c = P::constants();
        if let Some(exponent) = c.sqrt_exponent {
            let root = self.pow_limbs(&exponent);
            return if root.square() == *self {
                (true, root)
            } else {
                (false, Self::zero())
            };
        }

        // Tonelli-Shanks
        let mut m = c.two_adicity;
        let mut z = Self::two_adic_root_of_unity();
        let mut t = self.pow_limbs(&c.trace);
        let mut root = self.pow_limbs(&c.trace_plus_one_div_two);

        while !t.is_one() {
            let mut i = 0;
            let mut t_pow = t;
            while !t_pow.is_one() {
                t_pow = t_pow.square();
                i += 1;
            }
            if i >= m {
                return (false, Self::zero());
            }
            let mut b = z;
            for _ in 0..(m - i - 1) {
                b = b.square();
            }
            m = i;
            z = b.square();
            t = t * z;
            root = root * b;
        }
        (true, root)
    }

    /// Coset generators k_0, k_1, ... with k_i / k_j outside the 2^s subgroup.
    ///
    /// Candidates are scanned upwards from the multiplicative generator.
    pub fn coset_generators() -> &'static [Self; NUM_COSET_GENERATORS] {
        P::cache().coset_generators.get_or_init(compute_coset_generators::<P>)
    }

    pub fn coset_generator(index: usize) -> Self {
        Self::coset_generators()[index]
    }

    /// Coset used for tag entries of the generalized permutation.
    pub fn tag_coset_generator() -> Self {
        Self::coset_generator(NUM_COSET_GENERATORS - 2)
    }

    /// Coset used for public-input entries of the permutation.
    pub fn external_coset_generator() -> Self {
        Self::coset_generator(NUM_COSET_GENERATORS - 1)
    }

    /// Primitive cube root of unity (λ for Fr, β for Fq).
    pub fn cube_root_of_unity() -> Self {
        *P::cache().cube_root.get_or_init(|| {
            BigUint::parse_bytes(P::CUBE_ROOT_OF_UNITY.as_bytes(), 10)
                .map(|value| Self::from_biguint(&value))
                .unwrap_or_else(Self::zero)
        })
    }

    /// Lagrange basis polynomial L_i at x over the size-n subgroup generated by ω:
    /// L_i(x) = ω^i · (x^n − 1) / (n · (x − ω^i))
    pub fn lagrange_basis_eval(i: usize, x: &Self, omega: &Self, n: usize) -> Self {
        let omega_i = omega.pow(i as u64);
        let denom = Self::from_u64(n as u64) * (*x - omega_i);
        if denom.is_zero() {
            return Self::one();
        }
        let z_h_x = x.pow(n as u64) - Self::one();
        omega_i * z_h_x * denom.invert()
    }
}

fn compute_coset_generators<P: FieldParams>() -> [FieldElement<P>; NUM_COSET_GENERATORS] {
    let subgroup_order = 1u64 << P::constants().two_adicity;
    let one = FieldElement::<P>::one();
    let mut result = [FieldElement::<P>::zero(); NUM_COSET_GENERATORS];
    result[0] = FieldElement::<P>::multiplicative_generator();
    let mut count = 1;
    let mut candidate = result[0] + one;

    while count < NUM_COSET_GENERATORS {
        let in_subgroup = |x: FieldElement<P>| x.pow(subgroup_order).is_one();
        let candidate_inverse = candidate.invert();
        let valid = !in_subgroup(candidate)
            && result[..count]
                .iter()
                .all(|g| !in_subgroup(*g * candidate_inverse));
        if valid {
            result[count] = candidate;
            count += 1;
        }
        candidate += one;
    }
    result
}

#[cfg(test)]
mod tests {
    use crate::field::{Fq, Fr};

    #[test]
    fn test_root_of_unity() {
        let n = 16usize;
        let omega = Fr::get_root_of_unity(n).unwrap();

        // ω^n = 1
        assert_eq!(omega.pow(n as u64), Fr::one());

        // ω^(n/2) ≠ 1
        assert_ne!(omega.pow(n as u64 / 2), Fr::one());

        assert!(Fr::get_root_of_unity(1 << 29).is_none());
        assert!(Fr::get_root_of_unity(12).is_none());
    }

    #[test]
    fn test_sqrt_tonelli_shanks() {
        for v in [4u64, 9, 10, 12345, 1 << 40] {
            let a = Fr::from_u64(v);
            let (found, root) = a.sqrt();
            if found {
                assert_eq!(root.square(), a);
            } else {
                assert!(!a.is_square());
            }
        }
        let (found, root) = Fr::from_u64(49).sqrt();
        assert!(found);
        assert!(root == Fr::from_u64(7) || root == -Fr::from_u64(7));
    }

    #[test]
    fn test_sqrt_non_residue() {
        // The multiplicative generator is never a square
        let (found, root) = Fr::multiplicative_generator().sqrt();
        assert!(!found);
        assert!(root.is_zero());

        let (found, root) = Fq::multiplicative_generator().sqrt();
        assert!(!found);
        assert!(root.is_zero());
    }

    #[test]
    fn test_sqrt_three_mod_four_field() {
        let a = Fq::from_u64(1234567).square();
        let (found, root) = a.sqrt();
        assert!(found);
        assert_eq!(root.square(), a);
    }

    #[test]
    fn test_coset_generators_distinct_cosets() {
        let gens = Fr::coset_generators();
        assert_eq!(gens[0], Fr::from_u64(5));
        let order = 1u64 << 28;
        for (i, a) in gens.iter().enumerate() {
            assert!(!a.pow(order).is_one());
            for b in gens.iter().skip(i + 1) {
                assert!(!(*a / *b).pow(order).is_one());
            }
        }
    }

    #[test]
    fn test_cube_roots() {
        let lambda = Fr::cube_root_of_unity();
        assert!(!lambda.is_one());
        assert!(lambda.pow(3).is_one());

        let beta = Fq::cube_root_of_unity();
        assert!(!beta.is_one());
        assert!(beta.pow(3).is_one());
    }

    #[test]
    fn test_lagrange_basis_eval() {
        let n = 8;
        let omega = Fr::get_root_of_unity(n).unwrap();
        for i in 0..n {
            for j in 0..n {
                let x = omega.pow(j as u64);
                let expected = if i == j { Fr::one() } else { Fr::zero() };
                assert_eq!(Fr::lagrange_basis_eval(i, &x, &omega, n), expected);
            }
        }

        // Sum of all basis polynomials is 1 everywhere
        let x = Fr::from_u64(77);
        let total: Fr = (0..n).map(|i| Fr::lagrange_basis_eval(i, &x, &omega, n)).sum();
        assert_eq!(total, Fr::one());
    }
}
