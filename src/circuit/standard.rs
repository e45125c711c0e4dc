//! Width-3 arithmetization
//!
//! Every gate enforces
//!
//!   q_m · w_l · w_r + q_1 · w_l + q_2 · w_r + q_3 · w_o + q_c = 0
//!
//! Wider relations are split across several rows with temporary variables.

use tracing::debug;

use super::{AddQuad, AddTriple, CircuitBase, CircuitConstructor, MulQuad, MulTriple, PolyTriple};
use crate::config::ComposerConfig;
use crate::field::Fr;

pub const STANDARD_SELECTOR_NAMES: [&str; 5] = ["q_m", "q_1", "q_2", "q_3", "q_c"];

#[derive(Clone, Debug)]
pub struct StandardCircuitConstructor {
    base: CircuitBase,
}

impl Default for StandardCircuitConstructor {
    fn default() -> Self {
        Self::with_strict(true)
    }
}

impl StandardCircuitConstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ComposerConfig) -> Self {
        Self::with_strict(config.strict_assert_equal)
    }

    pub fn with_strict(strict: bool) -> Self {
        let mut circuit = StandardCircuitConstructor {
            base: CircuitBase::new(Self::PROGRAM_WIDTH, &STANDARD_SELECTOR_NAMES, strict),
        };
        // variable 0 is the zero constant, fixed by the first gate
        let zero = circuit.put_constant_variable(Fr::zero());
        circuit.base.zero_idx = zero;
        circuit
    }

    fn push(&mut self, wires: [u32; 3], q_m: Fr, q_1: Fr, q_2: Fr, q_3: Fr, q_c: Fr) {
        self.base.push_gate(&wires, &[q_m, q_1, q_2, q_3, q_c]);
    }

    /// Split a witness into 2-bit quads, most significant first, and chain
    /// them into accumulators a_{i+1} = 4·a_i + quad_i. The final
    /// accumulator is tied to the witness without a value check.
    pub fn decompose_into_base4_accumulators(&mut self, witness_index: u32, num_bits: usize) -> Vec<u32> {
        assert!(num_bits > 0, "range constraint needs at least one bit");
        let target = self.get_variable(witness_index);
        let num_quads = num_bits.div_ceil(2);
        let odd = num_bits % 2 == 1;

        let mut accumulators = Vec::with_capacity(num_quads);
        let mut accumulator = (0u32, Fr::zero());
        for i in (0..num_quads).rev() {
            let lo_value = Fr::from(target.get_bit(2 * i));
            let lo = self.add_variable(lo_value);
            self.create_bool_gate(lo);

            let quad = if odd && i == num_quads - 1 {
                (lo, lo_value)
            } else {
                let hi_value = Fr::from(target.get_bit(2 * i + 1));
                let hi = self.add_variable(hi_value);
                self.create_bool_gate(hi);

                let quad_value = lo_value + hi_value.double();
                let quad = self.add_variable(quad_value);
                self.create_add_gate(&AddTriple {
                    a: lo,
                    b: hi,
                    c: quad,
                    a_scaling: Fr::one(),
                    b_scaling: Fr::from_u64(2),
                    c_scaling: -Fr::one(),
                    const_scaling: Fr::zero(),
                });
                (quad, quad_value)
            };

            if i == num_quads - 1 {
                accumulator = quad;
            } else {
                let next_value = Fr::from_u64(4) * accumulator.1 + quad.1;
                let next = self.add_variable(next_value);
                self.create_add_gate(&AddTriple {
                    a: accumulator.0,
                    b: quad.0,
                    c: next,
                    a_scaling: Fr::from_u64(4),
                    b_scaling: Fr::one(),
                    c_scaling: -Fr::one(),
                    const_scaling: Fr::zero(),
                });
                accumulator = (next, next_value);
            }
            accumulators.push(accumulator.0);
        }

        self.base.union_variables(witness_index, accumulator.0);
        accumulators
    }

    fn gate_holds(&self, row: usize) -> bool {
        let w = |col: usize| self.get_variable(self.base.wires[col][row]);
        let q = |col: usize| self.base.selectors[col][row];
        let (a, b, c) = (w(0), w(1), w(2));
        (q(0) * a * b + q(1) * a + q(2) * b + q(3) * c + q(4)).is_zero()
    }
}

impl CircuitConstructor for StandardCircuitConstructor {
    const PROGRAM_WIDTH: usize = 3;

    fn base(&self) -> &CircuitBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CircuitBase {
        &mut self.base
    }

    fn create_add_gate(&mut self, gate: &AddTriple) {
        self.push(
            [gate.a, gate.b, gate.c],
            Fr::zero(),
            gate.a_scaling,
            gate.b_scaling,
            gate.c_scaling,
            gate.const_scaling,
        );
    }

    fn create_mul_gate(&mut self, gate: &MulTriple) {
        self.push(
            [gate.a, gate.b, gate.c],
            gate.mul_scaling,
            Fr::zero(),
            Fr::zero(),
            gate.c_scaling,
            gate.const_scaling,
        );
    }

    /// a² − a = 0 with all three wires on `a`.
    fn create_bool_gate(&mut self, variable_index: u32) {
        let v = variable_index;
        self.push([v, v, v], Fr::one(), Fr::zero(), Fr::zero(), -Fr::one(), Fr::zero());
    }

    fn create_poly_gate(&mut self, gate: &PolyTriple) {
        self.push([gate.a, gate.b, gate.c], gate.q_m, gate.q_l, gate.q_r, gate.q_o, gate.q_c);
    }

    /// Two rows through a temporary t:
    /// a·a_s + b·b_s + const = t and c·c_s + d·d_s + t = 0.
    fn create_big_add_gate(&mut self, gate: &AddQuad) {
        let temp_value = self.get_variable(gate.a) * gate.a_scaling
            + self.get_variable(gate.b) * gate.b_scaling
            + gate.const_scaling;
        let temp = self.add_variable(temp_value);
        self.create_add_gate(&AddTriple {
            a: gate.a,
            b: gate.b,
            c: temp,
            a_scaling: gate.a_scaling,
            b_scaling: gate.b_scaling,
            c_scaling: -Fr::one(),
            const_scaling: gate.const_scaling,
        });
        self.create_add_gate(&AddTriple {
            a: gate.c,
            b: gate.d,
            c: temp,
            a_scaling: gate.c_scaling,
            b_scaling: gate.d_scaling,
            c_scaling: Fr::one(),
            const_scaling: Fr::zero(),
        });
    }

    /// t = c·c_s + d·d_s on one row, then a·b·mul_s + a·a_s + b·b_s + t + const = 0.
    fn create_big_mul_gate(&mut self, gate: &MulQuad) {
        let temp_value =
            self.get_variable(gate.c) * gate.c_scaling + self.get_variable(gate.d) * gate.d_scaling;
        let temp = self.add_variable(temp_value);
        self.create_add_gate(&AddTriple {
            a: gate.c,
            b: gate.d,
            c: temp,
            a_scaling: gate.c_scaling,
            b_scaling: gate.d_scaling,
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
        self.create_poly_gate(&PolyTriple {
            a: gate.a,
            b: gate.b,
            c: temp,
            q_m: gate.mul_scaling,
            q_l: gate.a_scaling,
            q_r: gate.b_scaling,
            q_o: Fr::one(),
            q_c: gate.const_scaling,
        });
    }

    fn fix_witness(&mut self, variable_index: u32, value: Fr) {
        let zero = self.base.zero_idx;
        self.push([variable_index, zero, zero], Fr::zero(), Fr::one(), Fr::zero(), Fr::zero(), -value);
    }

    fn create_range_constraint(&mut self, variable_index: u32, num_bits: usize, _msg: &str) {
        self.decompose_into_base4_accumulators(variable_index, num_bits);
    }

    fn estimated_gates(&self) -> usize {
        self.base.num_gates
    }

    fn finalize_circuit(&mut self) {
        if !self.base.finalized {
            self.base.finalized = true;
            debug!(num_gates = self.base.num_gates, "standard circuit finalized");
        }
    }

    fn check_circuit(&self) -> bool {
        if !self.base.copy_constraints_hold() {
            debug!("copy constraint violated");
            return false;
        }
        match (0..self.base.num_gates).find(|row| !self.gate_holds(*row)) {
            Some(row) => {
                debug!(row, "arithmetic gate violated");
                false
            }
            None => true,
        }
    }
}
