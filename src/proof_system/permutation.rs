//! Copy cycles → sigma/id mappings → permutation polynomials
//!
//! Every real variable owns one cycle listing the wire cells that carry it.
//! Public input `i` occupies row `i` on wires 0 and 1, and those two cells
//! open its cycle. Gate rows follow the public-input rows.
//!
//! sigma sends each cell to the next cell of its cycle. In the generalized
//! (tagged) mode the first cell's id and the last cell's sigma leave the
//! wire subgroups and point into the tag coset instead, which is how two
//! differently tagged multisets are proven equal.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::proving_key::ProvingKey;
use crate::circuit::CircuitConstructor;
use crate::fft::coset_shift;
use crate::field::Fr;

/// One wire cell: `wire_index` is the column, `gate_index` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleNode {
    pub wire_index: u32,
    pub gate_index: u32,
}

pub type CyclicPermutation = Vec<CycleNode>;

/// Where a sigma or id polynomial sends one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationSubgroupElement {
    pub row_index: u32,
    pub column_index: u8,
    pub is_public_input: bool,
    pub is_tag: bool,
}

impl PermutationSubgroupElement {
    fn identity(row: usize, column: usize) -> Self {
        PermutationSubgroupElement {
            row_index: row as u32,
            column_index: column as u8,
            is_public_input: false,
            is_tag: false,
        }
    }
}

/// `sigmas[column][row]`, and `ids` in the same layout when generalized.
#[derive(Clone, Debug, Default)]
pub struct PermutationMapping {
    pub sigmas: Vec<Vec<PermutationSubgroupElement>>,
    pub ids: Vec<Vec<PermutationSubgroupElement>>,
}

/// One cycle per variable index; only real indices get non-empty cycles.
pub fn compute_wire_copy_cycles<C: CircuitConstructor>(circuit: &C) -> Vec<CyclicPermutation> {
    let base = circuit.base();
    let num_public_inputs = base.public_inputs.len();
    let mut copy_cycles = vec![CyclicPermutation::new(); base.num_variables()];

    for (i, public_input) in base.public_inputs.iter().enumerate() {
        let real = base.real_index(*public_input) as usize;
        // the two cells must stay adjacent for public-input handling
        copy_cycles[real].push(CycleNode {
            wire_index: 0,
            gate_index: i as u32,
        });
        copy_cycles[real].push(CycleNode {
            wire_index: 1,
            gate_index: i as u32,
        });
    }

    for row in 0..base.num_gates {
        for (column, wire) in base.wires.iter().enumerate() {
            let real = base.real_index(wire[row]) as usize;
            copy_cycles[real].push(CycleNode {
                wire_index: column as u32,
                gate_index: (row + num_public_inputs) as u32,
            });
        }
    }
    copy_cycles
}

/// Build the sigma (and, if `generalized`, id) tables for a circuit of
/// `circuit_size` rows.
///
/// Panics if the public inputs and gates do not fit in `circuit_size`.
pub fn compute_permutation_mapping<C: CircuitConstructor>(
    circuit: &C,
    circuit_size: usize,
    generalized: bool,
) -> Result<PermutationMapping> {
    let base = circuit.base();
    let width = C::PROGRAM_WIDTH;
    let num_public_inputs = base.public_inputs.len();
    assert!(
        num_public_inputs + base.num_gates <= circuit_size,
        "{} public inputs and {} gates do not fit in {} rows",
        num_public_inputs,
        base.num_gates,
        circuit_size
    );

    let copy_cycles = compute_wire_copy_cycles(circuit);
    let identity_table = || -> Vec<Vec<PermutationSubgroupElement>> {
        (0..width)
            .map(|column| (0..circuit_size).map(|row| PermutationSubgroupElement::identity(row, column)).collect())
            .collect()
    };
    let mut mapping = PermutationMapping {
        sigmas: identity_table(),
        ids: if generalized { identity_table() } else { Vec::new() },
    };

    for (variable, cycle) in copy_cycles.iter().enumerate() {
        for (position, node) in cycle.iter().enumerate() {
            let next_position = (position + 1) % cycle.len();
            let next = cycle[next_position];
            let column = node.wire_index as usize;
            let row = node.gate_index as usize;
            mapping.sigmas[column][row] = PermutationSubgroupElement {
                row_index: next.gate_index,
                column_index: next.wire_index as u8,
                is_public_input: false,
                is_tag: false,
            };

            if generalized {
                let tag = base.real_variable_tags[variable];
                if position == 0 {
                    mapping.ids[column][row].is_tag = true;
                    mapping.ids[column][row].row_index = tag;
                }
                if next_position == 0 {
                    let Some(tau) = base.tau.get(&tag) else {
                        bail!("tag {tag} of variable {variable} has no tau entry");
                    };
                    mapping.sigmas[column][row].is_tag = true;
                    mapping.sigmas[column][row].row_index = *tau;
                }
            }
        }
    }

    for i in 0..num_public_inputs {
        let sigma = &mut mapping.sigmas[0][i];
        if sigma.is_tag {
            warn!(row = i, "permutation cell is both a tag and a public input");
        }
        sigma.row_index = i as u32;
        sigma.column_index = 0;
        sigma.is_public_input = true;
    }

    debug!(
        cycles = copy_cycles.iter().filter(|c| !c.is_empty()).count(),
        generalized, "permutation mapping computed"
    );
    Ok(mapping)
}

/// PLONK encoding of one column: ω^row, moved into the coset of its
/// column, the tag coset or the public-input coset.
pub fn compute_standard_plonk_lagrange_polynomial(
    permutation: &[PermutationSubgroupElement],
    key: &ProvingKey,
) -> Vec<Fr> {
    let n = key.circuit_size;
    assert!(
        permutation.len() <= n,
        "permutation of {} cells exceeds polynomial capacity {}",
        permutation.len(),
        n
    );
    let roots: Vec<Fr> = key.small_domain.elements().collect();
    let mut output = vec![Fr::zero(); n];
    for (out, element) in output.iter_mut().zip(permutation) {
        let mut value = roots[element.row_index as usize % n];
        if element.is_public_input {
            value *= Fr::external_coset_generator();
        } else if element.is_tag {
            value *= Fr::tag_coset_generator();
        } else if element.column_index > 0 {
            value *= Fr::coset_generator(element.column_index as usize - 1);
        }
        *out = value;
    }
    output
}

/// Store `"{label}_{j}_lagrange"` for every column of `mappings`.
pub fn compute_plonk_permutation_lagrange_polynomials_from_mapping(
    label: &str,
    mappings: &[Vec<PermutationSubgroupElement>],
    key: &mut ProvingKey,
) {
    for (j, column) in mappings.iter().enumerate() {
        let lagrange = compute_standard_plonk_lagrange_polynomial(column, key);
        key.polynomial_store.put(format!("{label}_{}_lagrange", j + 1), lagrange);
    }
}

/// From `"{label}_{j}_lagrange"` derive the monomial form `"{label}_{j}"`
/// and the coset evaluations `"{label}_{j}_fft"` over the large domain.
pub fn compute_monomial_and_coset_fft_polynomials_from_lagrange(
    label: &str,
    width: usize,
    key: &mut ProvingKey,
) -> Result<()> {
    for j in 1..=width {
        let prefix = format!("{label}_{j}");
        let monomial = key.small_domain.ifft(key.polynomial_store.get(&format!("{prefix}_lagrange"))?);
        let coset = key.large_domain.coset_fft(&monomial, coset_shift());
        key.polynomial_store.put(prefix.clone(), monomial);
        key.polynomial_store.put(format!("{prefix}_fft"), coset);
    }
    Ok(())
}

/// Honk encoding: a cell is its index `row + n·column`; public inputs point
/// to the negative index `−(row + 1 + n·column)`.
pub fn compute_honk_style_sigma_lagrange_polynomials_from_mapping(
    sigma_mappings: &[Vec<PermutationSubgroupElement>],
    key: &mut ProvingKey,
) {
    let n = key.circuit_size;
    for (j, column) in sigma_mappings.iter().enumerate() {
        assert!(column.len() <= n, "sigma mapping exceeds polynomial capacity {n}");
        let mut sigma = vec![Fr::zero(); n];
        for (out, element) in sigma.iter_mut().zip(column) {
            assert!(!element.is_tag, "Honk sigma polynomials carry no tags");
            let index = element.row_index as u64 + (n as u64) * element.column_index as u64;
            *out = if element.is_public_input {
                -Fr::from_u64(index + 1)
            } else {
                Fr::from_u64(index)
            };
        }
        key.polynomial_store.put(format!("sigma_{}_lagrange", j + 1), sigma);
    }
}

/// id_j(ω^i) = j·n + i
pub fn compute_standard_honk_id_polynomials(width: usize, key: &mut ProvingKey) {
    let n = key.circuit_size;
    for j in 0..width {
        let id = (0..n).map(|i| Fr::from_u64((j * n + i) as u64)).collect();
        key.polynomial_store.put(format!("id_{}_lagrange", j + 1), id);
    }
}

pub fn compute_standard_honk_sigma_permutations<C: CircuitConstructor>(circuit: &C, key: &mut ProvingKey) -> Result<()> {
    let mapping = compute_permutation_mapping(circuit, key.circuit_size, false)?;
    compute_honk_style_sigma_lagrange_polynomials_from_mapping(&mapping.sigmas, key);
    Ok(())
}

pub fn compute_standard_plonk_sigma_permutations<C: CircuitConstructor>(circuit: &C, key: &mut ProvingKey) -> Result<()> {
    let mapping = compute_permutation_mapping(circuit, key.circuit_size, false)?;
    compute_plonk_permutation_lagrange_polynomials_from_mapping("sigma", &mapping.sigmas, key);
    compute_monomial_and_coset_fft_polynomials_from_lagrange("sigma", C::PROGRAM_WIDTH, key)
}

/// Sigma and id polynomials for tagged (generalized) permutations.
pub fn compute_plonk_generalized_sigma_permutations<C: CircuitConstructor>(
    circuit: &C,
    key: &mut ProvingKey,
) -> Result<()> {
    let mapping = compute_permutation_mapping(circuit, key.circuit_size, true)?;
    compute_plonk_permutation_lagrange_polynomials_from_mapping("sigma", &mapping.sigmas, key);
    compute_plonk_permutation_lagrange_polynomials_from_mapping("id", &mapping.ids, key);
    compute_monomial_and_coset_fft_polynomials_from_lagrange("sigma", C::PROGRAM_WIDTH, key)?;
    compute_monomial_and_coset_fft_polynomials_from_lagrange("id", C::PROGRAM_WIDTH, key)
}

/// L_first = 1 on row 0, L_last = 1 on row n − 1.
pub fn compute_first_and_last_lagrange_polynomials(key: &mut ProvingKey) {
    let n = key.circuit_size;
    let mut first = vec![Fr::zero(); n];
    let mut last = vec![Fr::zero(); n];
    first[0] = Fr::one();
    last[n - 1] = Fr::one();
    key.polynomial_store.put("L_first_lagrange", first);
    key.polynomial_store.put("L_last_lagrange", last);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{AddTriple, StandardCircuitConstructor};
    use crate::proof_system::proving_key::ComposerType;

    fn add_gate(circuit: &mut StandardCircuitConstructor, a: u32, b: u32, c: u32) {
        circuit.create_add_gate(&AddTriple {
            a,
            b,
            c,
            a_scaling: Fr::one(),
            b_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
    }

    #[test]
    fn test_cycles_cover_every_cell_once() {
        let mut circuit = StandardCircuitConstructor::new();
        let a = circuit.add_variable(Fr::from_u64(1));
        let b = circuit.add_variable(Fr::from_u64(2));
        let c = circuit.add_public_variable(Fr::from_u64(3));
        add_gate(&mut circuit, a, b, c);
        add_gate(&mut circuit, a, a, b);

        let cycles = compute_wire_copy_cycles(&circuit);
        let cells: usize = cycles.iter().map(Vec::len).sum();
        // 3 gates × 3 wires, plus two cells for the public input
        assert_eq!(cells, 3 * 3 + 2);
        assert_eq!(cycles[c as usize][0], CycleNode { wire_index: 0, gate_index: 0 });
        assert_eq!(cycles[c as usize][1], CycleNode { wire_index: 1, gate_index: 0 });
        // gate rows are shifted past the public input row
        assert!(cycles[a as usize].contains(&CycleNode { wire_index: 0, gate_index: 2 }));
    }

    #[test]
    fn test_public_input_sigma_is_external() {
        let mut circuit = StandardCircuitConstructor::new();
        let a = circuit.add_variable(Fr::from_u64(1));
        let c = circuit.add_public_variable(Fr::from_u64(2));
        add_gate(&mut circuit, a, a, c);

        let mapping = compute_permutation_mapping(&circuit, 8, false).unwrap();
        assert!(mapping.ids.is_empty());
        let sigma = mapping.sigmas[0][0];
        assert!(sigma.is_public_input);
        assert_eq!(sigma.row_index, 0);
        // the cycle's last cell returns to the public input row
        let key = ProvingKey::new(ComposerType::Standard, 8, 1).unwrap();
        let lagrange = compute_standard_plonk_lagrange_polynomial(&mapping.sigmas[0], &key);
        assert_eq!(lagrange[0], Fr::external_coset_generator());
    }

    #[test]
    fn test_generalized_mapping_marks_tags() {
        let mut circuit = crate::circuit::UltraCircuitConstructor::new();
        let x = circuit.add_variable(Fr::from_u64(3));
        circuit.create_new_range_constraint(x, 7);
        circuit.finalize_circuit();
        let size = (circuit.num_gates() + 1).next_power_of_two();

        let mapping = compute_permutation_mapping(&circuit, size, true).unwrap();
        let tagged_ids = mapping.ids.iter().flatten().filter(|e| e.is_tag).count();
        let tagged_sigmas = mapping.sigmas.iter().flatten().filter(|e| e.is_tag).count();
        // every non-empty cycle gets exactly one of each
        assert_eq!(tagged_ids, tagged_sigmas);
        assert!(tagged_ids > 0);
    }

    #[test]
    #[should_panic(expected = "do not fit")]
    fn test_mapping_past_capacity_panics() {
        let mut circuit = StandardCircuitConstructor::new();
        let a = circuit.add_variable(Fr::one());
        for _ in 0..8 {
            add_gate(&mut circuit, a, a, a);
        }
        let _ = compute_permutation_mapping(&circuit, 8, false);
    }

    #[test]
    fn test_honk_encoding() {
        let mut circuit = StandardCircuitConstructor::new();
        let a = circuit.add_public_variable(Fr::from_u64(5));
        add_gate(&mut circuit, a, a, a);
        let mut key = ProvingKey::new(ComposerType::StandardHonk, 8, 1).unwrap();
        compute_standard_honk_sigma_permutations(&circuit, &mut key).unwrap();
        compute_standard_honk_id_polynomials(3, &mut key);

        let sigma_1 = key.polynomial_store.get("sigma_1_lagrange").unwrap();
        assert_eq!(sigma_1[0], -Fr::one());
        let id_2 = key.polynomial_store.get("id_2_lagrange").unwrap();
        assert_eq!(id_2[3], Fr::from_u64(8 + 3));
    }
}
