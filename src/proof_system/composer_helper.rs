//! Key-construction steps shared by every composer

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use tracing::debug;

use super::proving_key::{ComposerType, ProvingKey};
use crate::circuit::CircuitConstructor;
use crate::curve::G1Affine;
use crate::fft::coset_shift;
use crate::field::Fr;
use crate::kzg::CommitmentEngine;
use crate::plonk::types::VerificationKey;

/// A circuit builder that compiles its circuit into keys.
///
/// Keys are computed once and cached; computing the proving key finalizes
/// the circuit.
pub trait Composer {
    type Circuit: CircuitConstructor;

    fn circuit(&self) -> &Self::Circuit;
    fn circuit_mut(&mut self) -> &mut Self::Circuit;

    fn compute_proving_key(&mut self) -> Result<&ProvingKey>;
    /// Fill the `w_{j}_lagrange` polynomials of the proving key.
    fn compute_witness(&mut self) -> Result<()>;
    fn compute_verification_key(&mut self) -> Result<&VerificationKey>;
}

/// Size the domain and store every selector in Lagrange form.
///
/// Public inputs occupy the first rows with all selectors zero, gates
/// follow, and `num_reserved_gates` rows are left free at the end for
/// blinding. The circuit must be finalized.
pub fn compute_proving_key_base<C: CircuitConstructor>(
    circuit: &C,
    composer_type: ComposerType,
    minimum_circuit_size: usize,
    num_reserved_gates: usize,
) -> Result<ProvingKey> {
    let base = circuit.base();
    if !base.finalized {
        bail!("proving key requested before the circuit was finalized");
    }
    let num_public_inputs = base.public_inputs.len();
    let total = num_public_inputs + base.num_gates + num_reserved_gates;
    let circuit_size = total.max(minimum_circuit_size).next_power_of_two();

    let mut key = ProvingKey::new(composer_type, circuit_size, num_public_inputs)
        .with_context(|| format!("no evaluation domain of size {circuit_size}"))?;

    for (name, selector) in base.selector_names.iter().zip(&base.selectors) {
        let mut lagrange = vec![Fr::zero(); circuit_size];
        lagrange[num_public_inputs..num_public_inputs + selector.len()].copy_from_slice(selector);
        key.polynomial_store.put(format!("{name}_lagrange"), lagrange);
    }
    debug!(
        ?composer_type,
        circuit_size,
        num_public_inputs,
        gates = base.num_gates,
        "proving key base computed"
    );
    Ok(key)
}

/// `"{name}"` (monomial) and `"{name}_fft"` (4n coset) for each selector.
pub fn compute_monomial_and_coset_selector_forms(key: &mut ProvingKey, selector_names: &[&str]) -> Result<()> {
    for name in selector_names {
        let monomial = key.small_domain.ifft(key.polynomial_store.get(&format!("{name}_lagrange"))?);
        let coset = key.large_domain.coset_fft(&monomial, coset_shift());
        key.polynomial_store.put(*name, monomial);
        key.polynomial_store.put(format!("{name}_fft"), coset);
    }
    Ok(())
}

/// Store `"w_{j}_lagrange"`. On public-input rows the first two wires carry
/// the input and the rest are zero; padding rows are zero.
pub fn compute_witness_base<C: CircuitConstructor>(circuit: &C, key: &mut ProvingKey) -> Result<()> {
    let base = circuit.base();
    let n = key.circuit_size;
    let num_public_inputs = base.public_inputs.len();
    if num_public_inputs + base.num_gates > n {
        bail!(
            "witness of {} rows does not fit a key of size {n}",
            num_public_inputs + base.num_gates
        );
    }

    for (j, wire) in base.wires.iter().enumerate() {
        let mut lagrange = vec![Fr::zero(); n];
        if j < 2 {
            for (row, pi) in base.public_inputs.iter().enumerate() {
                lagrange[row] = base.get_variable(*pi);
            }
        }
        for (row, variable) in wire.iter().enumerate() {
            lagrange[num_public_inputs + row] = base.get_variable(*variable);
        }
        key.polynomial_store.put(format!("w_{}_lagrange", j + 1), lagrange);
    }
    Ok(())
}

/// Commit to each monomial `label` in the store. Commitments are keyed by
/// the upper-cased label (`q_m` → `Q_M`, `sigma_1` → `SIGMA_1`).
pub fn compute_verification_key_common<E: CommitmentEngine + ?Sized>(
    key: &ProvingKey,
    engine: &E,
    labels: &[String],
) -> Result<BTreeMap<String, G1Affine>> {
    let polys = labels
        .iter()
        .map(|label| key.polynomial_store.get(label))
        .collect::<Result<Vec<_>>>()?;
    let commitments = engine.batch_commit(&polys);
    Ok(labels
        .iter()
        .map(|label| label.to_uppercase())
        .zip(commitments)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{MulTriple, StandardCircuitConstructor};
    use crate::kzg::Srs;

    fn square_circuit() -> StandardCircuitConstructor {
        let mut circuit = StandardCircuitConstructor::new();
        let x = circuit.add_variable(Fr::from_u64(3));
        let y = circuit.add_public_variable(Fr::from_u64(9));
        circuit.create_mul_gate(&MulTriple {
            a: x,
            b: x,
            c: y,
            mul_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
        circuit
    }

    #[test]
    fn test_key_requires_finalized_circuit() {
        let circuit = square_circuit();
        let err = compute_proving_key_base(&circuit, ComposerType::Standard, 8, 1).unwrap_err();
        assert!(err.to_string().contains("finalized"));
    }

    #[test]
    fn test_selectors_start_after_public_inputs() {
        let mut circuit = square_circuit();
        circuit.finalize_circuit();
        let key = compute_proving_key_base(&circuit, ComposerType::Standard, 8, 1).unwrap();
        assert_eq!(key.circuit_size, 8);

        let q_m = key.polynomial_store.get("q_m_lagrange").unwrap();
        assert!(q_m[0].is_zero());
        // the mul gate follows the public row and the zero-fixing gate
        assert_eq!(q_m[2], Fr::one());
    }

    #[test]
    fn test_domain_rounds_up() {
        let mut circuit = square_circuit();
        circuit.finalize_circuit();
        let key = compute_proving_key_base(&circuit, ComposerType::Standard, 2, 6).unwrap();
        // 1 public input + 2 gates + 6 reserved
        assert_eq!(key.circuit_size, 16);
    }

    #[test]
    fn test_witness_and_vk_labels() {
        let mut circuit = square_circuit();
        circuit.finalize_circuit();
        let mut key = compute_proving_key_base(&circuit, ComposerType::Standard, 8, 1).unwrap();
        compute_witness_base(&circuit, &mut key).unwrap();
        compute_monomial_and_coset_selector_forms(&mut key, &["q_m", "q_c"]).unwrap();

        let w_1 = key.polynomial_store.get("w_1_lagrange").unwrap();
        let w_2 = key.polynomial_store.get("w_2_lagrange").unwrap();
        let w_3 = key.polynomial_store.get("w_3_lagrange").unwrap();
        assert_eq!(w_1[0], Fr::from_u64(9));
        assert_eq!(w_2[0], Fr::from_u64(9));
        assert!(w_3[0].is_zero());
        assert_eq!(w_3[2], Fr::from_u64(9));

        let srs = Srs::from_tau(&Fr::from_u64(11), 16);
        let labels = vec!["q_m".to_string(), "q_c".to_string()];
        let commitments = compute_verification_key_common(&key, &srs, &labels).unwrap();
        assert_eq!(commitments.keys().collect::<Vec<_>>(), vec!["Q_C", "Q_M"]);
        assert!(compute_verification_key_common(&key, &srs, &["missing".to_string()]).is_err());
    }
}
