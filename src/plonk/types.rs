//! PLONK verification key and proof

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::curve::G1Affine;
use crate::field::Fr;
use crate::proof_system::proving_key::ComposerType;

/// Preprocessed commitments, keyed by upper-case polynomial label
/// (`Q_M`, `SIGMA_1`, `ID_2`, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationKey {
    pub composer_type: ComposerType,
    /// Domain size (power of 2)
    pub circuit_size: usize,
    pub num_public_inputs: usize,
    /// Domain generator ω
    pub omega: Fr,
    pub commitments: BTreeMap<String, G1Affine>,
}

impl VerificationKey {
    pub fn commitment(&self, label: &str) -> Result<G1Affine> {
        self.commitments
            .get(label)
            .copied()
            .with_context(|| format!("verification key has no commitment {label}"))
    }
}

/// PLONK proof structure
/// Contains all commitments and evaluations produced by the prover
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    // Round 1: wire polynomial commitments
    pub a_comm: G1Affine,
    pub b_comm: G1Affine,
    pub c_comm: G1Affine,

    // Round 2: grand product
    pub z_comm: G1Affine,

    // Round 3: quotient split in three
    pub t_lo_comm: G1Affine,
    pub t_mid_comm: G1Affine,
    /// degree ≤ n+6
    pub t_hi_comm: G1Affine,

    // Round 4: evaluations at ζ
    pub a_eval: Fr,
    pub b_eval: Fr,
    pub c_eval: Fr,
    /// S_σ1(ζ)
    pub s_sigma1_eval: Fr,
    /// S_σ2(ζ)
    pub s_sigma2_eval: Fr,
    /// z(ωζ)
    pub z_omega_eval: Fr,

    // Round 5: opening proofs
    /// [W_ζ(X)]_1
    pub w_zeta_comm: G1Affine,
    /// [W_{ζω}(X)]_1
    pub w_zeta_omega_comm: G1Affine,
}

/// Δ = Π_i (x_i + γ + β·k_1·ω^i) / (x_i + γ + β·g_ext·ω^i)
///
/// Public input i sits in cells (0, i) and (1, i). The first of these
/// points into the external coset instead of at (1, i), so the id k_1·ω^i
/// of the second cell never appears among the sigmas and the grand
/// product ends at Δ instead of 1.
pub fn compute_public_input_delta(public_inputs: &[Fr], beta: &Fr, gamma: &Fr, omega: &Fr) -> Fr {
    let k_1 = Fr::coset_generator(0);
    let external = Fr::external_coset_generator();
    let mut numerator = Fr::one();
    let mut denominator = Fr::one();
    let mut root = Fr::one();
    for x in public_inputs {
        numerator *= *x + *gamma + *beta * k_1 * root;
        denominator *= *x + *gamma + *beta * external * root;
        root *= *omega;
    }
    numerator * denominator.invert()
}
