//! Dense univariate polynomials over Fr
//!
//! Coefficients are stored lowest degree first: f(X) = Σ coeffs[i] · X^i.
//! Trailing zeros are stripped by `from_coeffs`, so the zero polynomial has
//! no coefficients at all.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::fft::Domain;
use crate::field::Fr;

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Polynomial {
    pub coeffs: Vec<Fr>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Polynomial { coeffs: Vec::new() }
    }

    pub fn constant(c: Fr) -> Self {
        Self::from_coeffs(vec![c])
    }

    /// X^n
    pub fn x_pow(n: usize) -> Self {
        let mut coeffs = vec![Fr::zero(); n + 1];
        coeffs[n] = Fr::one();
        Polynomial { coeffs }
    }

    pub fn from_coeffs(coeffs: Vec<Fr>) -> Self {
        let mut poly = Polynomial { coeffs };
        poly.normalize();
        poly
    }

    /// Interpolate evaluations over `domain`.
    pub fn from_evaluations(evals: &[Fr], domain: &Domain) -> Self {
        Self::from_coeffs(domain.ifft(evals))
    }

    /// Degree, or -1 for the zero polynomial.
    pub fn degree(&self) -> isize {
        self.coeffs
            .iter()
            .rposition(|c| !c.is_zero())
            .map_or(-1, |d| d as isize)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| c.is_zero())
    }

    fn normalize(&mut self) {
        let len = (self.degree() + 1) as usize;
        self.coeffs.truncate(len);
    }

    /// Horner evaluation.
    pub fn evaluate(&self, x: &Fr) -> Fr {
        evaluate_coeffs(&self.coeffs, x)
    }

    /// Add b · X^shift · (X^n − 1); the result agrees with `self` on H.
    pub fn add_blinding(&mut self, blinding: Fr, shift: usize, n: usize) {
        if self.coeffs.len() < shift + n + 1 {
            self.coeffs.resize(shift + n + 1, Fr::zero());
        }
        self.coeffs[shift] -= blinding;
        self.coeffs[shift + n] += blinding;
    }

    /// Schoolbook product, only used on small inputs.
    pub fn mul_poly(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }
        let mut result = vec![Fr::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                result[i + j] += *a * *b;
            }
        }
        Polynomial::from_coeffs(result)
    }

    /// Quotient of synthetic division by (X − a); the remainder f(a) is dropped.
    pub fn div_by_linear(&self, a: &Fr) -> Polynomial {
        if self.coeffs.len() < 2 {
            return Polynomial::zero();
        }
        let n = self.coeffs.len();
        let mut quotient = vec![Fr::zero(); n - 1];
        let mut carry = Fr::zero();
        for i in (0..n - 1).rev() {
            quotient[i] = self.coeffs[i + 1] + carry;
            carry = quotient[i] * *a;
        }
        Polynomial::from_coeffs(quotient)
    }

    /// (f(X) − f(a)) / (X − a), the KZG witness polynomial.
    pub fn opening_quotient(&self, a: &Fr) -> Polynomial {
        let mut shifted = self.clone();
        if let Some(c0) = shifted.coeffs.first_mut() {
            *c0 -= self.evaluate(a);
        }
        shifted.div_by_linear(a)
    }

    pub fn scale(&self, scalar: &Fr) -> Polynomial {
        Polynomial::from_coeffs(self.coeffs.iter().map(|c| *c * *scalar).collect())
    }

    /// self += scalar · other
    pub fn add_scaled(&mut self, other: &Polynomial, scalar: &Fr) {
        if self.coeffs.len() < other.coeffs.len() {
            self.coeffs.resize(other.coeffs.len(), Fr::zero());
        }
        for (c, o) in self.coeffs.iter_mut().zip(&other.coeffs) {
            *c += *o * *scalar;
        }
        self.normalize();
    }

    pub fn coeff(&self, i: usize) -> Fr {
        self.coeffs.get(i).copied().unwrap_or_else(Fr::zero)
    }

    /// Z_H(X) = X^n − 1
    pub fn vanishing(n: usize) -> Self {
        let mut coeffs = vec![Fr::zero(); n + 1];
        coeffs[0] = -Fr::one();
        coeffs[n] = Fr::one();
        Polynomial { coeffs }
    }

    /// L_i(X) over `domain`
    pub fn lagrange_basis(i: usize, domain: &Domain) -> Self {
        let mut evals = vec![Fr::zero(); domain.n];
        evals[i % domain.n] = Fr::one();
        Self::from_evaluations(&evals, domain)
    }

    /// f(X) ↦ f(ω·X)
    pub fn shift(&self, omega: Fr) -> Self {
        let mut omega_power = Fr::one();
        let coeffs = self
            .coeffs
            .iter()
            .map(|c| {
                let out = *c * omega_power;
                omega_power *= omega;
                out
            })
            .collect();
        Polynomial { coeffs }
    }

    /// Evaluations on the coset k·H of `domain`.
    pub fn evaluate_coset(&self, domain: &Domain, k: Fr) -> Vec<Fr> {
        domain.coset_fft(&self.coeffs, k)
    }
}

/// Horner evaluation of a raw coefficient slice.
pub fn evaluate_coeffs(coeffs: &[Fr], x: &Fr) -> Fr {
    coeffs.iter().rev().fold(Fr::zero(), |acc, c| acc * *x + *c)
}

fn zip_longest(a: &[Fr], b: &[Fr], op: impl Fn(Fr, Fr) -> Fr) -> Polynomial {
    let len = a.len().max(b.len());
    let at = |v: &[Fr], i: usize| v.get(i).copied().unwrap_or_else(Fr::zero);
    Polynomial::from_coeffs((0..len).map(|i| op(at(a, i), at(b, i))).collect())
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        zip_longest(&self.coeffs, &rhs.coeffs, |x, y| x + y)
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        zip_longest(&self.coeffs, &rhs.coeffs, |x, y| x - y)
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Polynomial) -> Polynomial {
        &self + &rhs
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial {
        &self - &rhs
    }
}

impl Mul<Fr> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Fr) -> Polynomial {
        self.scale(&rhs)
    }
}

impl Mul<Fr> for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Fr) -> Polynomial {
        self.scale(&rhs)
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        Polynomial {
            coeffs: self.coeffs.into_iter().map(|c| -c).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(values: &[u64]) -> Polynomial {
        Polynomial::from_coeffs(values.iter().map(|v| Fr::from_u64(*v)).collect())
    }

    #[test]
    fn test_evaluate() {
        // f(X) = 1 + 2X + 3X^2, f(2) = 17
        let f = poly(&[1, 2, 3]);
        assert_eq!(f.evaluate(&Fr::from_u64(2)), Fr::from_u64(17));
        assert_eq!(Polynomial::zero().evaluate(&Fr::from_u64(2)), Fr::zero());
    }

    #[test]
    fn test_from_coeffs_strips_trailing_zeros() {
        let f = poly(&[4, 0, 0]);
        assert_eq!(f.coeffs.len(), 1);
        assert_eq!(f.degree(), 0);
        assert_eq!(poly(&[0, 0]).degree(), -1);
    }

    #[test]
    fn test_opening_quotient() {
        let f = poly(&[7, 0, 1, 5]);
        let a = Fr::from_u64(3);
        let q = f.opening_quotient(&a);

        // f(X) − f(a) = q(X)(X − a)
        let linear = Polynomial::from_coeffs(vec![-a, Fr::one()]);
        let lhs = &f - &Polynomial::constant(f.evaluate(&a));
        assert_eq!(q.mul_poly(&linear), lhs);
    }

    #[test]
    fn test_blinding_preserves_domain_values() {
        let domain = Domain::new(4).unwrap();
        let f = poly(&[1, 2, 3]);
        let mut blinded = f.clone();
        blinded.add_blinding(Fr::from_u64(11), 1, domain.n);

        assert_eq!(blinded.degree(), 5);
        for x in domain.elements() {
            assert_eq!(blinded.evaluate(&x), f.evaluate(&x));
        }
    }

    #[test]
    fn test_lagrange_basis() {
        let domain = Domain::new(8).unwrap();
        let l2 = Polynomial::lagrange_basis(2, &domain);
        for (j, x) in domain.elements().enumerate() {
            let expected = if j == 2 { Fr::one() } else { Fr::zero() };
            assert_eq!(l2.evaluate(&x), expected);
        }
        let z = Fr::from_u64(99);
        assert_eq!(l2.evaluate(&z), domain.lagrange_eval(2, &z));
    }

    #[test]
    fn test_shift_and_add_scaled() {
        let f = poly(&[1, 1, 1]);
        let omega = Fr::from_u64(2);
        let x = Fr::from_u64(5);
        assert_eq!(f.shift(omega).evaluate(&x), f.evaluate(&(omega * x)));

        let mut g = poly(&[1]);
        g.add_scaled(&f, &Fr::from_u64(3));
        assert_eq!(g, poly(&[4, 3, 3]));
    }

    #[test]
    fn test_vanishing() {
        let domain = Domain::new(8).unwrap();
        let z_h = Polynomial::vanishing(8);
        for x in domain.elements() {
            assert!(z_h.evaluate(&x).is_zero());
        }
    }
}
