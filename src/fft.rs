//! Radix-2 FFT over multiplicative subgroups of Fr
//!
//! Given coefficients of f(X) with deg f < n and a primitive n-th root ω:
//! - `fft` computes [f(ω^0), f(ω^1), ..., f(ω^{n-1})]
//! - `ifft` recovers the coefficients from evaluations
//! - the coset variants evaluate on k·H = {k·ω^i}
//!
//! All transforms work on plain coefficient/evaluation slices so that
//! buffers can move in and out of the polynomial store without wrapping.

use serde::{Deserialize, Serialize};

use crate::field::Fr;

/// Multiplicative subgroup H = {ω^0, ω^1, ..., ω^{n-1}}
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Size of the domain (power of 2)
    pub n: usize,
    /// Primitive n-th root of unity
    pub omega: Fr,
    pub omega_inv: Fr,
    /// 1/n in the field
    pub n_inv: Fr,
}

impl Domain {
    /// Create a domain of size `n`; `None` unless `n` is a supported power of two.
    pub fn new(n: usize) -> Option<Self> {
        let omega = Fr::get_root_of_unity(n)?;
        Some(Domain {
            n,
            omega,
            omega_inv: omega.inverse()?,
            n_inv: Fr::from_u64(n as u64).inverse()?,
        })
    }

    /// ω^i
    pub fn element(&self, i: usize) -> Fr {
        self.omega.pow((i % self.n) as u64)
    }

    pub fn elements(&self) -> impl Iterator<Item = Fr> + '_ {
        std::iter::successors(Some(Fr::one()), move |x| Some(*x * self.omega)).take(self.n)
    }

    /// Z_H(x) = x^n − 1
    pub fn vanishing_eval(&self, x: &Fr) -> Fr {
        x.pow(self.n as u64) - Fr::one()
    }

    /// L_i(x) over this domain
    pub fn lagrange_eval(&self, i: usize, x: &Fr) -> Fr {
        Fr::lagrange_basis_eval(i, x, &self.omega, self.n)
    }

    /// Evaluate coefficients (at most n of them) on H.
    pub fn fft(&self, coeffs: &[Fr]) -> Vec<Fr> {
        assert!(
            coeffs.len() <= self.n,
            "polynomial with {} coefficients does not fit a domain of size {}",
            coeffs.len(),
            self.n
        );
        let mut values = coeffs.to_vec();
        values.resize(self.n, Fr::zero());
        fft_in_place(&mut values, &self.omega);
        values
    }

    /// Interpolate n evaluations on H into n coefficients.
    pub fn ifft(&self, evals: &[Fr]) -> Vec<Fr> {
        assert_eq!(evals.len(), self.n, "IFFT input must match the domain size");
        let mut values = evals.to_vec();
        fft_in_place(&mut values, &self.omega_inv);
        for v in values.iter_mut() {
            *v *= self.n_inv;
        }
        values
    }

    /// Evaluate on the coset k·H.
    pub fn coset_fft(&self, coeffs: &[Fr], k: Fr) -> Vec<Fr> {
        let mut k_power = Fr::one();
        let scaled: Vec<Fr> = coeffs
            .iter()
            .map(|c| {
                let out = *c * k_power;
                k_power *= k;
                out
            })
            .collect();
        self.fft(&scaled)
    }

    /// Interpolate evaluations on the coset k·H.
    pub fn coset_ifft(&self, evals: &[Fr], k: Fr) -> Vec<Fr> {
        let mut coeffs = self.ifft(evals);
        let k_inv = k.invert();
        let mut k_inv_power = Fr::one();
        for c in coeffs.iter_mut() {
            *c *= k_inv_power;
            k_inv_power *= k_inv;
        }
        coeffs
    }
}

/// Shift of the extended evaluation coset used for quotient computation.
pub fn coset_shift() -> Fr {
    Fr::multiplicative_generator()
}

/// In-place Cooley-Tukey FFT, length must be a power of two.
pub fn fft_in_place(values: &mut [Fr], omega: &Fr) {
    let n = values.len();
    assert!(n.is_power_of_two(), "FFT size must be a power of 2");
    if n == 1 {
        return;
    }

    bit_reverse_permutation(values);

    let mut m = 1;
    while m < n {
        let omega_m = omega.pow((n / (2 * m)) as u64);
        let twiddles: Vec<Fr> = std::iter::successors(Some(Fr::one()), |w| Some(*w * omega_m))
            .take(m)
            .collect();
        for chunk in values.chunks_mut(2 * m) {
            let (lo, hi) = chunk.split_at_mut(m);
            for ((u, v), w) in lo.iter_mut().zip(hi.iter_mut()).zip(&twiddles) {
                let t = *w * *v;
                *v = *u - t;
                *u = *u + t;
            }
        }
        m *= 2;
    }
}

fn bit_reverse_permutation(values: &mut [Fr]) {
    let n = values.len();
    let log_n = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - log_n);
        if i < j {
            values.swap(i, j);
        }
    }
}
