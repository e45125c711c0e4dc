use std::collections::BTreeSet;

use plonk_composer::circuit::{AddTriple, MulTriple};
use plonk_composer::proof_system::permutation::{compute_permutation_mapping, compute_wire_copy_cycles, CycleNode};
use plonk_composer::{CircuitConstructor, Fr, StandardCircuitConstructor};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn cells(cycle: &[CycleNode]) -> BTreeSet<(u32, u32)> {
    cycle.iter().map(|n| (n.wire_index, n.gate_index)).collect()
}

fn non_empty(cycles: &[Vec<CycleNode>]) -> usize {
    cycles.iter().filter(|c| !c.is_empty()).count()
}

/// Two variables holding 5, each used in its own gates.
fn twin_circuit() -> (StandardCircuitConstructor, u32, u32) {
    let mut circuit = StandardCircuitConstructor::new();
    let a = circuit.add_variable(Fr::from_u64(5));
    let b = circuit.add_variable(Fr::from_u64(5));
    let sum = circuit.add_variable(Fr::from_u64(10));
    let square = circuit.add_variable(Fr::from_u64(25));
    circuit.create_add_gate(&AddTriple {
        a,
        b,
        c: sum,
        a_scaling: Fr::one(),
        b_scaling: Fr::one(),
        c_scaling: -Fr::one(),
        const_scaling: Fr::zero(),
    });
    circuit.create_mul_gate(&MulTriple {
        a: b,
        b,
        c: square,
        mul_scaling: Fr::one(),
        c_scaling: -Fr::one(),
        const_scaling: Fr::zero(),
    });
    (circuit, a, b)
}

#[test]
fn test_assert_equal_merges_exactly_two_cycles() {
    let (circuit, a, b) = twin_circuit();
    let before = compute_wire_copy_cycles(&circuit);

    let mut merged = circuit.clone();
    merged.assert_equal(a, b, "twins differ");
    assert!(!merged.failed());
    let after = compute_wire_copy_cycles(&merged);

    assert_eq!(non_empty(&after), non_empty(&before) - 1);

    let root = merged.real_index(a) as usize;
    let merged_cells = cells(&after[root]);
    let expected: BTreeSet<_> = cells(&before[a as usize]).union(&cells(&before[b as usize])).copied().collect();
    assert_eq!(merged_cells, expected);
    assert_eq!(after[root].len(), before[a as usize].len() + before[b as usize].len());
}

#[test]
fn test_every_cell_in_exactly_one_cycle() {
    let (circuit, _, _) = twin_circuit();
    let cycles = compute_wire_copy_cycles(&circuit);
    let mut seen = BTreeSet::new();
    for cycle in &cycles {
        for node in cycle {
            assert!(seen.insert((node.wire_index, node.gate_index)));
        }
    }
    assert_eq!(seen.len(), circuit.num_gates() * 3);
}

#[test]
fn test_sigma_is_a_permutation() {
    let mut rng = ChaCha20Rng::seed_from_u64(12345);
    let mut circuit = StandardCircuitConstructor::new();
    let mut vars: Vec<u32> = (0..6).map(|_| circuit.add_variable(Fr::random(&mut rng))).collect();
    for i in 0..6 {
        let (x, y) = (vars[i], vars[(i + 1) % 6]);
        let value = circuit.get_variable(x) + circuit.get_variable(y);
        let out = circuit.add_variable(value);
        circuit.create_add_gate(&AddTriple {
            a: x,
            b: y,
            c: out,
            a_scaling: Fr::one(),
            b_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
        vars.push(out);
    }

    let size = 16;
    let mapping = compute_permutation_mapping(&circuit, size, false).unwrap();
    let width = mapping.sigmas.len();
    let next = |col: usize, row: usize| {
        let e = mapping.sigmas[col][row];
        (e.column_index as usize, e.row_index as usize)
    };

    let mut targets = BTreeSet::new();
    for col in 0..width {
        for row in 0..size {
            assert!(targets.insert(next(col, row)), "two cells share a sigma target");
        }
    }

    for col in 0..width {
        for row in 0..size {
            let start = (col, row);
            let mut cell = next(col, row);
            let mut steps = 1;
            while cell != start {
                cell = next(cell.0, cell.1);
                steps += 1;
                assert!(steps <= width * size);
            }
        }
    }
}
