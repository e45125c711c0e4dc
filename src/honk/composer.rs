//! Standard Honk composer
//!
//! Same width-3 circuits as standard PLONK, but the permutation uses
//! integer labels: cell (row, column) is `row + n·column` in both the id and
//! the sigma polynomials, and a public-input cell points to the negative
//! label `−(row + 1)`. Polynomials stay in Lagrange form.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::circuit::standard::STANDARD_SELECTOR_NAMES;
use crate::circuit::{CircuitConstructor, StandardCircuitConstructor};
use crate::config::ComposerConfig;
use crate::field::Fr;
use crate::kzg::Srs;
use crate::plonk::types::VerificationKey;
use crate::proof_system::composer_helper::{
    compute_proving_key_base, compute_verification_key_common, compute_witness_base, Composer,
};
use crate::proof_system::permutation::{
    compute_first_and_last_lagrange_polynomials, compute_standard_honk_id_polynomials,
    compute_standard_honk_sigma_permutations,
};
use crate::proof_system::proving_key::{ComposerType, ProvingKey};

/// Δ = Π_i (x_i + γ + β·(n + i)) / (x_i + γ − β·(i + 1))
///
/// The value the grand product reaches after the last row.
pub fn compute_public_input_delta(public_inputs: &[Fr], beta: &Fr, gamma: &Fr, domain_size: usize) -> Fr {
    let mut numerator = Fr::one();
    let mut denominator = Fr::one();
    let mut numerator_acc = *gamma + *beta * Fr::from_u64(domain_size as u64);
    let mut denominator_acc = *gamma - *beta;
    for x in public_inputs {
        numerator *= numerator_acc + *x;
        denominator *= denominator_acc + *x;
        numerator_acc += *beta;
        denominator_acc -= *beta;
    }
    numerator * denominator.invert()
}

/// Running product z with z[0] = 1 and
/// z[i+1] = z[i] · Π_j (w_j + β·id_j + γ) / Π_j (w_j + β·σ_j + γ).
///
/// Returns n+1 entries. The last one equals the public-input Δ exactly
/// when the copy constraints hold.
pub fn compute_permutation_grand_product(key: &ProvingKey, width: usize, beta: &Fr, gamma: &Fr) -> Result<Vec<Fr>> {
    let n = key.circuit_size;
    let store = &key.polynomial_store;
    let mut numerators = vec![Fr::one(); n];
    let mut denominators = vec![Fr::one(); n];
    for j in 1..=width {
        let wire = store.get(&format!("w_{j}_lagrange"))?;
        let id = store.get(&format!("id_{j}_lagrange"))?;
        let sigma = store.get(&format!("sigma_{j}_lagrange"))?;
        for i in 0..n {
            numerators[i] *= wire[i] + *beta * id[i] + *gamma;
            denominators[i] *= wire[i] + *beta * sigma[i] + *gamma;
        }
    }
    Fr::batch_invert(&mut denominators);

    let mut z = Vec::with_capacity(n + 1);
    let mut acc = Fr::one();
    z.push(acc);
    for (num, den_inv) in numerators.iter().zip(&denominators) {
        acc *= *num * *den_inv;
        z.push(acc);
    }
    Ok(z)
}

pub struct StandardHonkComposer {
    circuit: StandardCircuitConstructor,
    config: ComposerConfig,
    proving_key: Option<ProvingKey>,
    verification_key: Option<VerificationKey>,
    srs: Option<Srs>,
    computed_witness: bool,
}

impl Default for StandardHonkComposer {
    fn default() -> Self {
        Self::new(ComposerConfig::default())
    }
}

impl StandardHonkComposer {
    /// Rows left empty at the end of the trace for the prover's randomness.
    pub const NUM_RANDOMIZED_GATES: usize = 2;

    pub fn new(config: ComposerConfig) -> Self {
        StandardHonkComposer {
            circuit: StandardCircuitConstructor::from_config(&config),
            config,
            proving_key: None,
            verification_key: None,
            srs: None,
            computed_witness: false,
        }
    }

    pub fn with_srs(mut self, srs: Srs) -> Self {
        self.srs = Some(srs);
        self
    }

    /// Labels committed in the verification key.
    fn precomputed_labels() -> Vec<String> {
        let width = StandardCircuitConstructor::PROGRAM_WIDTH;
        let mut labels: Vec<String> = STANDARD_SELECTOR_NAMES.iter().map(|s| format!("{s}_lagrange")).collect();
        for family in ["sigma", "id"] {
            labels.extend((1..=width).map(|j| format!("{family}_{j}_lagrange")));
        }
        labels.push("L_first_lagrange".to_string());
        labels.push("L_last_lagrange".to_string());
        labels
    }
}

impl Composer for StandardHonkComposer {
    type Circuit = StandardCircuitConstructor;

    fn circuit(&self) -> &StandardCircuitConstructor {
        &self.circuit
    }

    fn circuit_mut(&mut self) -> &mut StandardCircuitConstructor {
        self.computed_witness = false;
        &mut self.circuit
    }

    fn compute_proving_key(&mut self) -> Result<&ProvingKey> {
        if self.proving_key.is_none() {
            self.circuit.finalize_circuit();
            let mut key = compute_proving_key_base(
                &self.circuit,
                ComposerType::StandardHonk,
                self.config.min_circuit_size,
                Self::NUM_RANDOMIZED_GATES,
            )?;
            compute_standard_honk_sigma_permutations(&self.circuit, &mut key)?;
            compute_standard_honk_id_polynomials(StandardCircuitConstructor::PROGRAM_WIDTH, &mut key);
            compute_first_and_last_lagrange_polynomials(&mut key);
            info!(circuit_size = key.circuit_size, "honk proving key computed");
            self.proving_key = Some(key);
        }
        self.proving_key.as_ref().context("proving key missing")
    }

    fn compute_witness(&mut self) -> Result<()> {
        if self.computed_witness {
            return Ok(());
        }
        self.compute_proving_key()?;
        let key = self.proving_key.as_mut().context("proving key missing")?;
        compute_witness_base(&self.circuit, key)?;
        self.computed_witness = true;
        Ok(())
    }

    fn compute_verification_key(&mut self) -> Result<&VerificationKey> {
        if self.verification_key.is_none() {
            let n = self.compute_proving_key()?.circuit_size;
            if self.srs.as_ref().map_or(true, |srs| srs.max_degree + 1 < n) {
                debug!(degree = n, "simulating SRS ceremony");
                self.srs = Some(Srs::simulate_ceremony(n, self.config.ceremony_participants));
            }
            let key = self.proving_key.as_ref().context("proving key missing")?;
            let srs = self.srs.as_ref().context("SRS missing")?;
            self.verification_key = Some(VerificationKey {
                composer_type: ComposerType::StandardHonk,
                circuit_size: key.circuit_size,
                num_public_inputs: key.num_public_inputs,
                omega: key.small_domain.omega,
                commitments: compute_verification_key_common(key, srs, &Self::precomputed_labels())?,
            });
        }
        self.verification_key.as_ref().context("verification key missing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::AddTriple;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn sum_composer(a: u64, b: u64) -> StandardHonkComposer {
        let mut composer = StandardHonkComposer::default();
        let circuit = composer.circuit_mut();
        let a = circuit.add_variable(Fr::from_u64(a));
        let b = circuit.add_variable(Fr::from_u64(b));
        let c_value = circuit.get_variable(a) + circuit.get_variable(b);
        let c = circuit.add_public_variable(c_value);
        circuit.create_add_gate(&AddTriple {
            a,
            b,
            c,
            a_scaling: Fr::one(),
            b_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
        // reuse a so that its cycle has more than one cell
        circuit.create_add_gate(&AddTriple {
            a,
            b: a,
            c: a,
            a_scaling: Fr::one(),
            b_scaling: Fr::zero(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
        composer
    }

    #[test]
    fn test_grand_product_ends_at_delta() {
        let mut composer = sum_composer(3, 4);
        composer.compute_witness().unwrap();
        let key = composer.compute_proving_key().unwrap();

        let mut rng = ChaCha20Rng::seed_from_u64(12345);
        let beta = Fr::random(&mut rng);
        let gamma = Fr::random(&mut rng);
        let z = compute_permutation_grand_product(key, 3, &beta, &gamma).unwrap();
        assert_eq!(z.len(), key.circuit_size + 1);
        assert_eq!(z[0], Fr::one());

        let delta = compute_public_input_delta(&[Fr::from_u64(7)], &beta, &gamma, key.circuit_size);
        assert_eq!(z[key.circuit_size], delta);
    }

    #[test]
    fn test_grand_product_detects_broken_copy() {
        let mut composer = sum_composer(3, 4);
        composer.compute_witness().unwrap();
        let mut key = composer.compute_proving_key().unwrap().clone();
        // w_3 on the first gate row holds the public c; change that one cell
        let mut w_3 = key.polynomial_store.get("w_3_lagrange").unwrap().to_vec();
        w_3[2] = Fr::from_u64(8);
        key.polynomial_store.put("w_3_lagrange", w_3);

        let mut rng = ChaCha20Rng::seed_from_u64(12345);
        let beta = Fr::random(&mut rng);
        let gamma = Fr::random(&mut rng);
        let z = compute_permutation_grand_product(&key, 3, &beta, &gamma).unwrap();
        let delta = compute_public_input_delta(&[Fr::from_u64(7)], &beta, &gamma, key.circuit_size);
        assert_ne!(z[key.circuit_size], delta);
    }

    #[test]
    fn test_key_layout() {
        let mut composer = sum_composer(1, 2);
        let key = composer.compute_proving_key().unwrap();
        let n = key.circuit_size;
        let l_first = key.polynomial_store.get("L_first_lagrange").unwrap();
        let l_last = key.polynomial_store.get("L_last_lagrange").unwrap();
        assert_eq!(l_first[0], Fr::one());
        assert_eq!(l_last[n - 1], Fr::one());
        assert_eq!(l_first.iter().filter(|x| !x.is_zero()).count(), 1);
        assert!(!key.polynomial_store.contains("q_m"));

        let vk = composer.compute_verification_key().unwrap();
        assert_eq!(vk.composer_type, ComposerType::StandardHonk);
        assert!(vk.commitment("SIGMA_3_LAGRANGE").is_ok());
        assert!(vk.commitment("L_LAST_LAGRANGE").is_ok());
    }
}
