//! Arithmetic circuit constructors
//!
//! A constructor records wires and selectors row by row. The common
//! machinery (variable arena, copy constraints, constants, public inputs,
//! failure flag) lives in [`CircuitBase`]; each arithmetization implements
//! [`CircuitConstructor`] to supply its own gate layouts:
//!
//! - [`StandardCircuitConstructor`]: width 3, q_m·a·b + q_1·a + q_2·b + q_3·c + q_c = 0
//! - [`UltraCircuitConstructor`]: width 4 with sort, range-list and memory gates

pub mod base;
pub mod standard;
pub mod ultra;

pub use base::{CircuitBase, VariableArena};
pub use standard::StandardCircuitConstructor;
pub use ultra::UltraCircuitConstructor;

use serde::{Deserialize, Serialize};

use crate::field::Fr;

/// Tag carried by variables outside any generalized-permutation set.
pub const DUMMY_TAG: u32 = 0;

/// a·a_scaling + b·b_scaling + c·c_scaling + const_scaling = 0
#[derive(Clone, Copy, Debug)]
pub struct AddTriple {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub a_scaling: Fr,
    pub b_scaling: Fr,
    pub c_scaling: Fr,
    pub const_scaling: Fr,
}

/// a·b·mul_scaling + c·c_scaling + const_scaling = 0
#[derive(Clone, Copy, Debug)]
pub struct MulTriple {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub mul_scaling: Fr,
    pub c_scaling: Fr,
    pub const_scaling: Fr,
}

/// q_m·a·b + q_l·a + q_r·b + q_o·c + q_c = 0
#[derive(Clone, Copy, Debug)]
pub struct PolyTriple {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub q_m: Fr,
    pub q_l: Fr,
    pub q_r: Fr,
    pub q_o: Fr,
    pub q_c: Fr,
}

/// Linear combination of four variables plus a constant.
#[derive(Clone, Copy, Debug)]
pub struct AddQuad {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
    pub a_scaling: Fr,
    pub b_scaling: Fr,
    pub c_scaling: Fr,
    pub d_scaling: Fr,
    pub const_scaling: Fr,
}

/// a·b·mul_scaling plus a linear combination of a, b, c, d and a constant.
#[derive(Clone, Copy, Debug)]
pub struct MulQuad {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
    pub mul_scaling: Fr,
    pub a_scaling: Fr,
    pub b_scaling: Fr,
    pub c_scaling: Fr,
    pub d_scaling: Fr,
    pub const_scaling: Fr,
}

/// Running base-4 accumulators of a logic constraint, most significant first.
/// The final entries equal the two inputs and the result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorTriple {
    pub left: Vec<u32>,
    pub right: Vec<u32>,
    pub out: Vec<u32>,
}

pub trait CircuitConstructor {
    const PROGRAM_WIDTH: usize;

    fn base(&self) -> &CircuitBase;
    fn base_mut(&mut self) -> &mut CircuitBase;

    fn create_add_gate(&mut self, gate: &AddTriple);
    fn create_mul_gate(&mut self, gate: &MulTriple);
    /// Constrain a variable to {0, 1}.
    fn create_bool_gate(&mut self, variable_index: u32);
    fn create_poly_gate(&mut self, gate: &PolyTriple);
    fn create_big_add_gate(&mut self, gate: &AddQuad);
    fn create_big_mul_gate(&mut self, gate: &MulQuad);
    /// Pin a variable to `value` with a dedicated gate.
    fn fix_witness(&mut self, variable_index: u32, value: Fr);
    /// Constrain a variable to [0, 2^num_bits). Violations are found by
    /// `check_circuit`, not here.
    fn create_range_constraint(&mut self, variable_index: u32, num_bits: usize, msg: &str);

    /// Gates so far plus the gates finalization will add for work already recorded.
    fn estimated_gates(&self) -> usize;
    /// Process deferred work; calling it again does nothing.
    fn finalize_circuit(&mut self);
    fn check_circuit(&self) -> bool;

    /// Exact gate count, known once finalized.
    fn final_gate_count(&self) -> Option<usize> {
        let base = self.base();
        base.finalized.then_some(base.num_gates)
    }

    fn add_variable(&mut self, value: Fr) -> u32 {
        self.base_mut().add_variable(value)
    }

    fn add_public_variable(&mut self, value: Fr) -> u32 {
        let idx = self.add_variable(value);
        self.base_mut().public_inputs.push(idx);
        idx
    }

    fn set_public_input(&mut self, witness_index: u32) {
        if self.base().public_inputs.contains(&witness_index) {
            self.failure("attempted to set a public input that is already public");
            return;
        }
        self.base_mut().public_inputs.push(witness_index);
    }

    fn get_variable(&self, idx: u32) -> Fr {
        self.base().get_variable(idx)
    }

    /// Overwrite a witness value after construction.
    fn set_variable(&mut self, idx: u32, value: Fr) {
        self.base_mut().variables.set_value(idx, value);
    }

    fn real_index(&self, idx: u32) -> u32 {
        self.base().real_index(idx)
    }

    fn num_gates(&self) -> usize {
        self.base().num_gates
    }

    fn num_variables(&self) -> usize {
        self.base().num_variables()
    }

    fn public_inputs(&self) -> &[u32] {
        &self.base().public_inputs
    }

    fn zero_idx(&self) -> u32 {
        self.base().zero_idx
    }

    /// Copy constraint between `a` and `b`. Differing values are recorded
    /// as a failure when strict checking is on; the classes merge either way.
    fn assert_equal(&mut self, a: u32, b: u32, msg: &str) {
        let values_equal = self.get_variable(a) == self.get_variable(b);
        if !values_equal && self.base().strict {
            self.failure(msg);
        }
        self.base_mut().union_variables(a, b);
    }

    fn assert_equal_constant(&mut self, a: u32, value: Fr, msg: &str) {
        let b = self.put_constant_variable(value);
        self.assert_equal(a, b, msg);
    }

    /// Cached variable fixed to `value`.
    fn put_constant_variable(&mut self, value: Fr) -> u32 {
        let key = value.to_canonical();
        if let Some(idx) = self.base().constant_variables.get(&key) {
            return *idx;
        }
        let idx = self.add_variable(value);
        self.fix_witness(idx, value);
        self.base_mut().constant_variables.insert(key, idx);
        idx
    }

    fn failed(&self) -> bool {
        self.base().failed
    }

    fn err(&self) -> &str {
        &self.base().err
    }

    fn failure(&mut self, msg: &str) {
        self.base_mut().failure(msg);
    }

    /// Bitwise AND/XOR of the low `num_bits` bits of `a` and `b`, two bits
    /// per round. Each round booleanity-checks the input bits, combines them
    /// and folds them into base-4 accumulators.
    fn create_logic_constraint(&mut self, a: u32, b: u32, num_bits: usize, is_xor: bool) -> AccumulatorTriple {
        assert!(num_bits % 2 == 0, "logic constraints need an even bit count, got {num_bits}");
        let a_value = self.get_variable(a);
        let b_value = self.get_variable(b);
        let zero = self.zero_idx();

        let mut result = AccumulatorTriple::default();
        let mut accumulators = [(zero, Fr::zero()); 3];
        let four = Fr::from_u64(4);

        for position in (0..num_bits / 2).rev() {
            let left = bit_pair(self, &a_value, 2 * position);
            let right = bit_pair(self, &b_value, 2 * position);

            let mut out = [(zero, Fr::zero()); 2];
            for k in 0..2 {
                let (x, x_value) = left[k];
                let (y, y_value) = right[k];
                let value = if is_xor {
                    x_value + y_value - (x_value * y_value).double()
                } else {
                    x_value * y_value
                };
                let z = self.add_variable(value);
                if is_xor {
                    self.create_poly_gate(&PolyTriple {
                        a: x,
                        b: y,
                        c: z,
                        q_m: -Fr::from_u64(2),
                        q_l: Fr::one(),
                        q_r: Fr::one(),
                        q_o: -Fr::one(),
                        q_c: Fr::zero(),
                    });
                } else {
                    self.create_mul_gate(&MulTriple {
                        a: x,
                        b: y,
                        c: z,
                        mul_scaling: Fr::one(),
                        c_scaling: -Fr::one(),
                        const_scaling: Fr::zero(),
                    });
                }
                out[k] = (z, value);
            }

            for (slot, [(hi, hi_value), (lo, lo_value)]) in [left, right, out].into_iter().enumerate() {
                let (acc, acc_value) = accumulators[slot];
                let next_value = four * acc_value + hi_value.double() + lo_value;
                let next = self.add_variable(next_value);
                self.create_big_add_gate(&AddQuad {
                    a: acc,
                    b: hi,
                    c: lo,
                    d: next,
                    a_scaling: four,
                    b_scaling: Fr::from_u64(2),
                    c_scaling: Fr::one(),
                    d_scaling: -Fr::one(),
                    const_scaling: Fr::zero(),
                });
                accumulators[slot] = (next, next_value);
                match slot {
                    0 => result.left.push(next),
                    1 => result.right.push(next),
                    _ => result.out.push(next),
                }
            }
        }

        if let (Some(left), Some(right)) = (result.left.last().copied(), result.right.last().copied()) {
            self.assert_equal(a, left, "logic constraint: left input has more bits than allowed");
            self.assert_equal(b, right, "logic constraint: right input has more bits than allowed");
        }
        result
    }

    fn create_and_constraint(&mut self, a: u32, b: u32, num_bits: usize) -> AccumulatorTriple {
        self.create_logic_constraint(a, b, num_bits, false)
    }

    fn create_xor_constraint(&mut self, a: u32, b: u32, num_bits: usize) -> AccumulatorTriple {
        self.create_logic_constraint(a, b, num_bits, true)
    }
}

/// Boolean variables for bits `position + 1` and `position` of `value`,
/// high bit first.
fn bit_pair<C: CircuitConstructor + ?Sized>(circuit: &mut C, value: &Fr, position: usize) -> [(u32, Fr); 2] {
    [position + 1, position].map(|bit| {
        let bit_value = Fr::from(value.get_bit(bit));
        let idx = circuit.add_variable(bit_value);
        circuit.create_bool_gate(idx);
        (idx, bit_value)
    })
}
