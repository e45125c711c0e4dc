//! PLONK composers
//!
//! [`StandardPlonkComposer`] compiles a width-3 circuit and can prove and
//! verify. [`UltraComposer`] compiles a width-4 circuit with tagged
//! permutations and memory records into proving and verification keys.

use anyhow::{bail, Context, Result};
use rand::Rng;
use tracing::{debug, info};

use super::prover::Prover;
use super::types::{Proof, VerificationKey};
use super::verifier::Verifier;
use crate::circuit::standard::STANDARD_SELECTOR_NAMES;
use crate::circuit::ultra::ULTRA_SELECTOR_NAMES;
use crate::circuit::{CircuitConstructor, StandardCircuitConstructor, UltraCircuitConstructor};
use crate::config::ComposerConfig;
use crate::field::Fr;
use crate::kzg::Srs;
use crate::proof_system::composer_helper::{
    compute_monomial_and_coset_selector_forms, compute_proving_key_base, compute_verification_key_common,
    compute_witness_base, Composer,
};
use crate::proof_system::permutation::{
    compute_plonk_generalized_sigma_permutations, compute_standard_plonk_sigma_permutations,
};
use crate::proof_system::proving_key::{ComposerType, ProvingKey};
use crate::transcript::Transcript;

/// Verification-key labels: every selector, then each permutation family.
fn key_labels(selectors: &[&str], families: &[&str], width: usize) -> Vec<String> {
    let mut labels: Vec<String> = selectors.iter().map(|s| s.to_string()).collect();
    for family in families {
        labels.extend((1..=width).map(|j| format!("{family}_{j}")));
    }
    labels
}

/// Reuse `srs` if it is large enough, otherwise run a fresh simulated ceremony.
fn ensure_srs<'s>(srs: &'s mut Option<Srs>, degree: usize, config: &ComposerConfig) -> &'s Srs {
    if srs.as_ref().is_some_and(|s| s.max_degree < degree) {
        *srs = None;
    }
    srs.get_or_insert_with(|| {
        debug!(degree, participants = config.ceremony_participants, "simulating SRS ceremony");
        Srs::simulate_ceremony(degree, config.ceremony_participants)
    })
}

pub struct StandardPlonkComposer {
    circuit: StandardCircuitConstructor,
    config: ComposerConfig,
    proving_key: Option<ProvingKey>,
    verification_key: Option<VerificationKey>,
    srs: Option<Srs>,
    computed_witness: bool,
}

impl Default for StandardPlonkComposer {
    fn default() -> Self {
        Self::new(ComposerConfig::default())
    }
}

impl StandardPlonkComposer {
    /// One row stays free at the end of the domain so the grand product
    /// reaches Δ on the last row.
    pub const NUM_RESERVED_GATES: usize = 1;

    pub fn new(config: ComposerConfig) -> Self {
        StandardPlonkComposer {
            circuit: StandardCircuitConstructor::from_config(&config),
            config,
            proving_key: None,
            verification_key: None,
            srs: None,
            computed_witness: false,
        }
    }

    /// Use a known SRS instead of simulating a ceremony.
    pub fn with_srs(mut self, srs: Srs) -> Self {
        self.srs = Some(srs);
        self
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn srs(&mut self) -> Result<&Srs> {
        let degree = self.compute_proving_key()?.circuit_size + self.config.srs_degree_padding;
        Ok(ensure_srs(&mut self.srs, degree, &self.config))
    }

    pub fn prove<R: Rng>(&mut self, rng: &mut R) -> Result<Proof> {
        self.prove_with_transcript(rng).map(|(proof, _)| proof)
    }

    /// Prove the circuit's current witness. Fails on a circuit that has
    /// recorded a failure.
    pub fn prove_with_transcript<R: Rng>(&mut self, rng: &mut R) -> Result<(Proof, Transcript)> {
        if self.circuit.failed() {
            bail!("cannot prove a failed circuit: {}", self.circuit.err());
        }
        self.compute_witness()?;
        self.srs()?;
        let key = self.proving_key.as_ref().context("proving key missing after witness computation")?;
        let srs = self.srs.as_ref().context("SRS missing after setup")?;
        Prover::new(key, srs, &self.config.transcript_label)?.prove_with_transcript(rng)
    }

    pub fn verify(&mut self, proof: &Proof, public_inputs: &[Fr]) -> Result<bool> {
        self.compute_verification_key()?;
        let vk = self.verification_key.as_ref().context("verification key missing")?;
        let srs = self.srs.as_ref().context("SRS missing")?;
        let verifier = Verifier::new(vk, srs).with_transcript_label(self.config.transcript_label.clone());
        Ok(verifier.verify(proof, public_inputs))
    }
}

impl Composer for StandardPlonkComposer {
    type Circuit = StandardCircuitConstructor;

    fn circuit(&self) -> &StandardCircuitConstructor {
        &self.circuit
    }

    /// Witness values may change, so the cached witness is dropped.
    fn circuit_mut(&mut self) -> &mut StandardCircuitConstructor {
        self.computed_witness = false;
        &mut self.circuit
    }

    fn compute_proving_key(&mut self) -> Result<&ProvingKey> {
        if self.proving_key.is_none() {
            self.circuit.finalize_circuit();
            let mut key = compute_proving_key_base(
                &self.circuit,
                ComposerType::Standard,
                self.config.min_circuit_size,
                Self::NUM_RESERVED_GATES,
            )?;
            compute_monomial_and_coset_selector_forms(&mut key, &STANDARD_SELECTOR_NAMES)?;
            compute_standard_plonk_sigma_permutations(&self.circuit, &mut key)?;
            info!(circuit_size = key.circuit_size, "standard proving key computed");
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
            self.srs()?;
            let key = self.proving_key.as_ref().context("proving key missing")?;
            let srs = self.srs.as_ref().context("SRS missing")?;
            let labels = key_labels(&STANDARD_SELECTOR_NAMES, &["sigma"], StandardCircuitConstructor::PROGRAM_WIDTH);
            self.verification_key = Some(VerificationKey {
                composer_type: ComposerType::Standard,
                circuit_size: key.circuit_size,
                num_public_inputs: key.num_public_inputs,
                omega: key.small_domain.omega,
                commitments: compute_verification_key_common(key, srs, &labels)?,
            });
        }
        self.verification_key.as_ref().context("verification key missing")
    }
}

pub struct UltraComposer {
    circuit: UltraCircuitConstructor,
    config: ComposerConfig,
    proving_key: Option<ProvingKey>,
    verification_key: Option<VerificationKey>,
    srs: Option<Srs>,
    computed_witness: bool,
}

impl Default for UltraComposer {
    fn default() -> Self {
        Self::new(ComposerConfig::default())
    }
}

impl UltraComposer {
    pub const NUM_RESERVED_GATES: usize = 4;

    pub fn new(config: ComposerConfig) -> Self {
        UltraComposer {
            circuit: UltraCircuitConstructor::from_config(&config),
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
}

impl Composer for UltraComposer {
    type Circuit = UltraCircuitConstructor;

    fn circuit(&self) -> &UltraCircuitConstructor {
        &self.circuit
    }

    /// Witness values may change, so the cached witness is dropped.
    fn circuit_mut(&mut self) -> &mut UltraCircuitConstructor {
        self.computed_witness = false;
        &mut self.circuit
    }

    fn compute_proving_key(&mut self) -> Result<&ProvingKey> {
        if self.proving_key.is_none() {
            self.circuit.finalize_circuit();
            let mut key = compute_proving_key_base(
                &self.circuit,
                ComposerType::Ultra,
                self.config.min_circuit_size,
                Self::NUM_RESERVED_GATES,
            )?;
            compute_monomial_and_coset_selector_forms(&mut key, &ULTRA_SELECTOR_NAMES)?;
            compute_plonk_generalized_sigma_permutations(&self.circuit, &mut key)?;

            // record rows move past the public-input rows
            let offset = key.num_public_inputs as u32;
            key.memory_read_records = self.circuit.memory_read_records.iter().map(|r| r + offset).collect();
            key.memory_write_records = self.circuit.memory_write_records.iter().map(|r| r + offset).collect();
            info!(
                circuit_size = key.circuit_size,
                memory_reads = key.memory_read_records.len(),
                memory_writes = key.memory_write_records.len(),
                "ultra proving key computed"
            );
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
            let degree = self.compute_proving_key()?.circuit_size + self.config.srs_degree_padding;
            let srs = ensure_srs(&mut self.srs, degree, &self.config);
            let key = self.proving_key.as_ref().context("proving key missing")?;
            let labels = key_labels(
                &ULTRA_SELECTOR_NAMES,
                &["sigma", "id"],
                UltraCircuitConstructor::PROGRAM_WIDTH,
            );
            self.verification_key = Some(VerificationKey {
                composer_type: ComposerType::Ultra,
                circuit_size: key.circuit_size,
                num_public_inputs: key.num_public_inputs,
                omega: key.small_domain.omega,
                commitments: compute_verification_key_common(key, srs, &labels)?,
            });
        }
        self.verification_key.as_ref().context("verification key missing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{AddTriple, MulTriple};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_srs() -> Srs {
        Srs::from_tau(&Fr::from_u64(0x5eed), 64)
    }

    #[test]
    fn test_standard_keys_and_labels() {
        let mut composer = StandardPlonkComposer::default().with_srs(test_srs());
        let a = composer.circuit_mut().add_variable(Fr::from_u64(2));
        let b = composer.circuit_mut().add_public_variable(Fr::from_u64(4));
        composer.circuit_mut().create_mul_gate(&MulTriple {
            a,
            b: a,
            c: b,
            mul_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });

        let key = composer.compute_proving_key().unwrap();
        for label in ["q_m", "q_m_fft", "sigma_3", "sigma_3_fft", "sigma_1_lagrange"] {
            assert!(key.polynomial_store.contains(label), "missing {label}");
        }
        let vk = composer.compute_verification_key().unwrap();
        assert!(vk.commitment("SIGMA_3").is_ok());
        assert_eq!(vk.num_public_inputs, 1);
        assert!(composer.circuit().base().finalized);
    }

    #[test]
    fn test_failed_circuit_is_not_proved() {
        let mut composer = StandardPlonkComposer::default().with_srs(test_srs());
        let a = composer.circuit_mut().add_variable(Fr::from_u64(1));
        let b = composer.circuit_mut().add_variable(Fr::from_u64(2));
        composer.circuit_mut().assert_equal(a, b, "a != b");
        let mut rng = ChaCha20Rng::seed_from_u64(12345);
        let err = composer.prove(&mut rng).unwrap_err();
        assert!(err.to_string().contains("a != b"));
    }

    #[test]
    fn test_standard_prove_and_verify() {
        let mut composer = StandardPlonkComposer::default().with_srs(test_srs());
        let circuit = composer.circuit_mut();
        let a = circuit.add_variable(Fr::from_u64(5));
        let b = circuit.add_variable(Fr::from_u64(6));
        let c = circuit.add_public_variable(Fr::from_u64(11));
        circuit.create_add_gate(&AddTriple {
            a,
            b,
            c,
            a_scaling: Fr::one(),
            b_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });

        let mut rng = ChaCha20Rng::seed_from_u64(12345);
        let proof = composer.prove(&mut rng).unwrap();
        assert!(composer.verify(&proof, &[Fr::from_u64(11)]).unwrap());
        assert!(!composer.verify(&proof, &[Fr::from_u64(12)]).unwrap());
        assert!(!composer.verify(&proof, &[]).unwrap());
    }

    #[test]
    fn test_ultra_key_with_memory() {
        let mut composer = UltraComposer::default().with_srs(test_srs());
        let circuit = composer.circuit_mut();
        let x = circuit.add_public_variable(Fr::from_u64(7));
        let rom = circuit.create_rom_array(2);
        circuit.set_rom_element(rom, 0, x);
        circuit.set_rom_element(rom, 1, x);
        let zero = circuit.zero_idx();
        circuit.read_rom_array(rom, zero);

        let key = composer.compute_proving_key().unwrap();
        assert_eq!(key.composer_type, ComposerType::Ultra);
        assert!(key.polynomial_store.contains("id_4_fft"));
        assert!(key.polynomial_store.contains("q_aux"));
        assert!(!key.memory_read_records.is_empty());
        // every record row sits past the public input row
        assert!(key.memory_read_records.iter().all(|r| *r >= 1));

        composer.compute_witness().unwrap();
        let vk = composer.compute_verification_key().unwrap();
        assert!(vk.commitment("ID_4").is_ok());
        assert!(vk.commitment("Q_SORT").is_ok());
    }
}
