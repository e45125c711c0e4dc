//! Width-4 arithmetization with sorted-list and memory gates
//!
//! Rows may read the following row, so several relations share the table.
//! The arithmetic relation (q_arith ≠ 0) is
//!
//!   (q_arith − 3)·q_m·w_1·w_2·(−1/2) + q_1·w_1 + q_2·w_2 + q_3·w_3 + q_4·w_4
//!       + q_c + (q_arith − 1)·w_4' = 0
//!
//! so q_arith = 1 is the ordinary gate and q_arith = 2 adds the next w_4.
//! q_sort rows constrain a sorted run, q_aux rows the ROM/RAM transcripts.
//! Range lists and memory transcripts are deferred to [`finalize`].
//!
//! [`finalize`]: CircuitConstructor::finalize_circuit

pub mod memory;
pub mod range;

pub use memory::{AccessType, RamRecord, RamTranscript, RomRecord, RomTranscript, UNINITIALIZED_MEMORY_RECORD};
pub use range::{RangeList, DEFAULT_RANGE_BITNUM, DEFAULT_RANGE_STEP_SIZE};

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{AddQuad, AddTriple, CircuitBase, CircuitConstructor, MulQuad, MulTriple, PolyTriple, DUMMY_TAG};
use crate::config::ComposerConfig;
use crate::field::Fr;
use crate::transcript::Transcript;
use range::{range_list_seed_len, sorted_list_gate_count};

pub const ULTRA_SELECTOR_NAMES: [&str; 9] = ["q_m", "q_c", "q_1", "q_2", "q_3", "q_4", "q_arith", "q_sort", "q_aux"];

/// Selector values of one row, in [`ULTRA_SELECTOR_NAMES`] order.
#[derive(Clone, Copy, Debug, Default)]
pub struct UltraSelectors {
    pub q_m: Fr,
    pub q_c: Fr,
    pub q_1: Fr,
    pub q_2: Fr,
    pub q_3: Fr,
    pub q_4: Fr,
    pub q_arith: Fr,
    pub q_sort: Fr,
    pub q_aux: Fr,
}

impl UltraSelectors {
    fn to_array(self) -> [Fr; 9] {
        [
            self.q_m, self.q_c, self.q_1, self.q_2, self.q_3, self.q_4, self.q_arith, self.q_sort, self.q_aux,
        ]
    }

    fn arithmetic() -> Self {
        UltraSelectors {
            q_arith: Fr::one(),
            ..UltraSelectors::default()
        }
    }
}

/// Which memory relation a q_aux row switches on.
///
/// q_m turns on the record check, q_1 the ROM ordering check, q_3 the RAM
/// ordering check and q_4 the RAM timestamp check. Writes set q_c = 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuxSelector {
    RomRead,
    RomConsistencyCheck,
    RamRead,
    RamWrite,
    RamConsistencyCheck,
    RamTimestampCheck,
}

impl AuxSelector {
    pub fn selectors(self) -> UltraSelectors {
        let on = Fr::one();
        let aux = UltraSelectors {
            q_aux: on,
            ..UltraSelectors::default()
        };
        match self {
            AuxSelector::RomRead | AuxSelector::RamRead => UltraSelectors { q_m: on, ..aux },
            AuxSelector::RomConsistencyCheck => UltraSelectors { q_m: on, q_1: on, ..aux },
            AuxSelector::RamWrite => UltraSelectors { q_m: on, q_c: on, ..aux },
            AuxSelector::RamConsistencyCheck => UltraSelectors { q_3: on, ..aux },
            AuxSelector::RamTimestampCheck => UltraSelectors { q_4: on, ..aux },
        }
    }
}

#[derive(Clone, Debug)]
pub struct UltraCircuitConstructor {
    base: CircuitBase,
    /// Keyed by target range.
    pub(crate) range_lists: BTreeMap<u64, RangeList>,
    pub(crate) rom_arrays: Vec<RomTranscript>,
    pub(crate) ram_arrays: Vec<RamTranscript>,
    /// Rows whose w_4 is a read record, filled in once η is known.
    pub memory_read_records: Vec<u32>,
    /// Rows whose w_4 is a write record.
    pub memory_write_records: Vec<u32>,
}

impl Default for UltraCircuitConstructor {
    fn default() -> Self {
        Self::with_strict(true)
    }
}

impl UltraCircuitConstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ComposerConfig) -> Self {
        Self::with_strict(config.strict_assert_equal)
    }

    pub fn with_strict(strict: bool) -> Self {
        let mut circuit = UltraCircuitConstructor {
            base: CircuitBase::new(Self::PROGRAM_WIDTH, &ULTRA_SELECTOR_NAMES, strict),
            range_lists: BTreeMap::new(),
            rom_arrays: Vec::new(),
            ram_arrays: Vec::new(),
            memory_read_records: Vec::new(),
            memory_write_records: Vec::new(),
        };
        let zero = circuit.put_constant_variable(Fr::zero());
        circuit.base.zero_idx = zero;
        circuit
    }

    pub(crate) fn push_row(&mut self, wires: [u32; 4], selectors: UltraSelectors) {
        self.base.push_gate(&wires, &selectors.to_array());
    }

    pub fn rom_arrays(&self) -> &[RomTranscript] {
        &self.rom_arrays
    }

    pub fn ram_arrays(&self) -> &[RamTranscript] {
        &self.ram_arrays
    }

    /// a·a_s + b·b_s + c·c_s + d·d_s + const (+ w_4 of the next row) = 0.
    pub fn create_big_add_gate_with_next(&mut self, gate: &AddQuad, include_next_gate_w_4: bool) {
        self.push_row(
            [gate.a, gate.b, gate.c, gate.d],
            UltraSelectors {
                q_1: gate.a_scaling,
                q_2: gate.b_scaling,
                q_3: gate.c_scaling,
                q_4: gate.d_scaling,
                q_c: gate.const_scaling,
                q_arith: if include_next_gate_w_4 { Fr::from_u64(2) } else { Fr::one() },
                ..UltraSelectors::default()
            },
        );
    }

    /// Cost of a constant that finalization may create, remembering it so
    /// it is only counted once.
    fn pending_constant_cost(&self, value: u64, pending: &mut BTreeSet<u64>) -> usize {
        let cached = self.base.constant_variables.contains_key(&Fr::from_u64(value).to_canonical());
        usize::from(!cached && pending.insert(value))
    }

    /// η = H(w_1, w_2, w_3). Record wires are excluded since they are
    /// built from η.
    pub fn memory_challenge(&self) -> Fr {
        let mut transcript = Transcript::new(b"ultra-memory-check");
        for (j, wire) in self.base.wires.iter().take(3).enumerate() {
            for (row, idx) in wire.iter().enumerate() {
                transcript.send_to_verifier(&format!("w_{}_{row}", j + 1), &self.base.get_variable(*idx));
            }
        }
        transcript.squeeze_challenge("eta")
    }

    /// Checks every relation with a fixed memory challenge. The circuit must
    /// already be finalized.
    pub fn check_with_eta(&self, eta: Fr) -> bool {
        let base = &self.base;
        if !base.copy_constraints_hold() {
            debug!("copy constraint violated");
            return false;
        }

        let overrides = self.memory_record_values(eta);
        let value = |idx: u32| {
            let real = base.real_index(idx);
            overrides.get(&real).copied().unwrap_or_else(|| base.get_variable(real))
        };
        let n = base.num_gates;
        let wire = |col: usize, row: usize| if row < n { value(base.wires[col][row]) } else { Fr::zero() };

        for row in 0..n {
            let q = |name: &str| base.selector(name).map(|s| s[row]).unwrap_or_default();
            let w = [wire(0, row), wire(1, row), wire(2, row), wire(3, row)];
            let next = [wire(0, row + 1), wire(1, row + 1), wire(2, row + 1), wire(3, row + 1)];

            let q_arith = q("q_arith");
            if !q_arith.is_zero() {
                let half_inv = -Fr::from_u64(2).invert();
                let result = (q_arith - Fr::from_u64(3)) * q("q_m") * w[0] * w[1] * half_inv
                    + q("q_1") * w[0]
                    + q("q_2") * w[1]
                    + q("q_3") * w[2]
                    + q("q_4") * w[3]
                    + q("q_c")
                    + (q_arith - Fr::one()) * next[3];
                if !result.is_zero() {
                    debug!(row, "arithmetic gate violated");
                    return false;
                }
            }

            if !q("q_sort").is_zero() {
                let deltas = [w[1] - w[0], w[2] - w[1], w[3] - w[2], next[0] - w[3]];
                let in_range = |d: &Fr| d.to_u64().is_some_and(|d| d <= DEFAULT_RANGE_STEP_SIZE);
                if !deltas.iter().all(in_range) {
                    debug!(row, "sort gate violated");
                    return false;
                }
            }

            if !q("q_aux").is_zero() && !Self::aux_holds(&q, &w, &next, eta) {
                debug!(row, "memory gate violated");
                return false;
            }
        }

        self.tag_multisets_match(&value)
    }

    fn aux_holds(q: &dyn Fn(&str) -> Fr, w: &[Fr; 4], next: &[Fr; 4], eta: Fr) -> bool {
        let eta2 = eta.square();
        let eta3 = eta2 * eta;
        let is_bool = |x: Fr| (x * (x - Fr::one())).is_zero();
        let index_delta = next[0] - w[0];
        let not_next_index = Fr::one() - index_delta;

        if !q("q_m").is_zero() && w[3] != w[0] * eta + w[1] * eta2 + w[2] * eta3 + q("q_c") {
            return false;
        }
        if !q("q_1").is_zero()
            && !(is_bool(index_delta)
                && (not_next_index * (next[1] - w[1])).is_zero()
                && (not_next_index * (next[2] - w[2])).is_zero())
        {
            return false;
        }
        if !q("q_3").is_zero() {
            let access = w[3] - (w[0] * eta + w[1] * eta2 + w[2] * eta3);
            let next_access = next[3] - (next[0] * eta + next[1] * eta2 + next[2] * eta3);
            let next_is_read = Fr::one() - next_access;
            if !(is_bool(index_delta)
                && is_bool(access)
                && (not_next_index * next_is_read * (next[2] - w[2])).is_zero())
            {
                return false;
            }
        }
        if !q("q_4").is_zero() && !(not_next_index * (next[1] - w[1] - w[2])).is_zero() {
            return false;
        }
        true
    }

    /// Record values implied by `eta`, keyed by real variable index.
    fn memory_record_values(&self, eta: Fr) -> BTreeMap<u32, Fr> {
        let base = &self.base;
        let eta2 = eta.square();
        let eta3 = eta2 * eta;
        let mut values = BTreeMap::new();
        let lists = [(&self.memory_read_records, Fr::zero()), (&self.memory_write_records, Fr::one())];
        for (rows, write_flag) in lists {
            for row in rows {
                let row = *row as usize;
                let w = |col: usize| base.get_variable(base.wires[col][row]);
                let record = w(0) * eta + w(1) * eta2 + w(2) * eta3 + write_flag;
                values.insert(base.real_index(base.wires[3][row]), record);
            }
        }
        values
    }

    /// Each tag's multiset of wire values equals its tau partner's.
    fn tag_multisets_match(&self, value: &dyn Fn(u32) -> Fr) -> bool {
        let base = &self.base;
        let mut seen = BTreeSet::new();
        let mut multisets: BTreeMap<u32, Vec<[u64; 4]>> = BTreeMap::new();
        for column in &base.wires {
            for idx in column {
                let real = base.real_index(*idx);
                let tag = base.real_variable_tags[real as usize];
                if tag != DUMMY_TAG && seen.insert(real) {
                    multisets.entry(tag).or_default().push(value(real).to_canonical());
                }
            }
        }
        for set in multisets.values_mut() {
            set.sort_unstable();
        }

        let empty = Vec::new();
        for tag in multisets.keys().chain(base.tau.keys()) {
            if *tag == DUMMY_TAG {
                continue;
            }
            let Some(partner) = base.tau.get(tag) else {
                debug!(tag, "tag has no tau entry");
                return false;
            };
            let own = multisets.get(tag).unwrap_or(&empty);
            let other = multisets.get(partner).unwrap_or(&empty);
            if own != other {
                debug!(tag, partner, "tagged multisets differ");
                return false;
            }
        }
        true
    }
}

impl CircuitConstructor for UltraCircuitConstructor {
    const PROGRAM_WIDTH: usize = 4;

    fn base(&self) -> &CircuitBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CircuitBase {
        &mut self.base
    }

    fn create_add_gate(&mut self, gate: &AddTriple) {
        let zero = self.base.zero_idx;
        self.push_row(
            [gate.a, gate.b, gate.c, zero],
            UltraSelectors {
                q_1: gate.a_scaling,
                q_2: gate.b_scaling,
                q_3: gate.c_scaling,
                q_c: gate.const_scaling,
                ..UltraSelectors::arithmetic()
            },
        );
    }

    fn create_mul_gate(&mut self, gate: &MulTriple) {
        let zero = self.base.zero_idx;
        self.push_row(
            [gate.a, gate.b, gate.c, zero],
            UltraSelectors {
                q_m: gate.mul_scaling,
                q_3: gate.c_scaling,
                q_c: gate.const_scaling,
                ..UltraSelectors::arithmetic()
            },
        );
    }

    fn create_bool_gate(&mut self, variable_index: u32) {
        let zero = self.base.zero_idx;
        self.push_row(
            [variable_index, variable_index, zero, zero],
            UltraSelectors {
                q_m: Fr::one(),
                q_1: -Fr::one(),
                ..UltraSelectors::arithmetic()
            },
        );
    }

    fn create_poly_gate(&mut self, gate: &PolyTriple) {
        let zero = self.base.zero_idx;
        self.push_row(
            [gate.a, gate.b, gate.c, zero],
            UltraSelectors {
                q_m: gate.q_m,
                q_1: gate.q_l,
                q_2: gate.q_r,
                q_3: gate.q_o,
                q_c: gate.q_c,
                ..UltraSelectors::arithmetic()
            },
        );
    }

    fn create_big_add_gate(&mut self, gate: &AddQuad) {
        self.create_big_add_gate_with_next(gate, false);
    }

    fn create_big_mul_gate(&mut self, gate: &MulQuad) {
        self.push_row(
            [gate.a, gate.b, gate.c, gate.d],
            UltraSelectors {
                q_m: gate.mul_scaling,
                q_1: gate.a_scaling,
                q_2: gate.b_scaling,
                q_3: gate.c_scaling,
                q_4: gate.d_scaling,
                q_c: gate.const_scaling,
                ..UltraSelectors::arithmetic()
            },
        );
    }

    fn fix_witness(&mut self, variable_index: u32, value: Fr) {
        let zero = self.base.zero_idx;
        self.push_row(
            [variable_index, zero, zero, zero],
            UltraSelectors {
                q_1: Fr::one(),
                q_c: -value,
                ..UltraSelectors::arithmetic()
            },
        );
    }

    /// Short ranges go straight into a sorted list; wider ones are split
    /// into 14-bit limbs first.
    fn create_range_constraint(&mut self, variable_index: u32, num_bits: usize, _msg: &str) {
        if num_bits <= DEFAULT_RANGE_BITNUM {
            // a placeholder row keeps the variable on a wire
            self.create_poly_gate(&PolyTriple {
                a: variable_index,
                b: variable_index,
                c: variable_index,
                q_m: Fr::zero(),
                q_l: Fr::one(),
                q_r: -Fr::one(),
                q_o: Fr::zero(),
                q_c: Fr::zero(),
            });
            self.create_new_range_constraint(variable_index, (1u64 << num_bits) - 1);
        } else {
            self.decompose_into_default_range(variable_index, num_bits);
        }
    }

    /// Mirrors `finalize_circuit` step by step without touching the circuit.
    fn estimated_gates(&self) -> usize {
        if self.base.finalized {
            return self.base.num_gates;
        }
        let mut count = self.base.num_gates;
        let mut pending_constants = BTreeSet::new();
        // target range → entries finalization will add (seeds included for new lists)
        let mut range_growth: BTreeMap<u64, usize> = BTreeMap::new();

        for rom in &self.rom_arrays {
            let mut uninitialized = 0;
            for (i, cell) in rom.state.iter().enumerate() {
                if cell[0] == UNINITIALIZED_MEMORY_RECORD {
                    if i != 0 {
                        count += self.pending_constant_cost(i as u64, &mut pending_constants);
                    }
                    count += 1;
                    uninitialized += 1;
                }
            }
            count += rom.records.len() + uninitialized + 1;
        }

        for ram in &self.ram_arrays {
            let mut access_count = ram.access_count;
            let mut uninitialized = 0;
            for (i, cell) in ram.state.iter().enumerate() {
                if *cell == UNINITIALIZED_MEMORY_RECORD {
                    if i != 0 {
                        count += self.pending_constant_cost(i as u64, &mut pending_constants);
                    }
                    count += self.pending_constant_cost(access_count as u64, &mut pending_constants);
                    access_count += 1;
                    count += 1;
                    uninitialized += 1;
                }
            }
            let records = ram.records.len() + uninitialized;
            if records > 0 {
                count += 2 * records;
            }
            if records > 1 {
                let target = (access_count - 1) as u64;
                if !self.range_lists.contains_key(&target) && !range_growth.contains_key(&target) {
                    let seeds = range_list_seed_len(target);
                    count += seeds.div_ceil(4);
                    range_growth.insert(target, seeds);
                }
                *range_growth.entry(target).or_insert(0) += records - 1;
            }
        }

        for (target, list) in &self.range_lists {
            let distinct: BTreeSet<u32> = list.variable_indices.iter().map(|i| self.real_index(*i)).collect();
            let growth = range_growth.remove(target).unwrap_or(0);
            count += sorted_list_gate_count(distinct.len() + growth);
        }
        for growth in range_growth.values() {
            count += sorted_list_gate_count(*growth);
        }
        count
    }

    fn finalize_circuit(&mut self) {
        if self.base.finalized {
            return;
        }
        for rom_id in 0..self.rom_arrays.len() {
            self.process_rom_array(rom_id);
        }
        for ram_id in 0..self.ram_arrays.len() {
            self.process_ram_array(ram_id);
        }
        let lists: Vec<RangeList> = self.range_lists.values().cloned().collect();
        for list in &lists {
            self.process_range_list(list);
        }
        self.base.finalized = true;
        debug!(
            num_gates = self.base.num_gates,
            range_lists = lists.len(),
            "ultra circuit finalized"
        );
    }

    /// Finalizes a copy and checks it under a memory challenge derived
    /// from the first three wires, as the prover would derive η.
    fn check_circuit(&self) -> bool {
        let mut circuit = self.clone();
        circuit.finalize_circuit();
        let eta = circuit.memory_challenge();
        circuit.check_with_eta(eta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn add(circuit: &mut UltraCircuitConstructor, a: u32, b: u32, c: u32) {
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
    fn test_selector_layout() {
        let circuit = UltraCircuitConstructor::new();
        assert_eq!(circuit.base().selectors.len(), 9);
        assert_eq!(circuit.base().wires.len(), 4);
        assert_eq!(circuit.zero_idx(), 0);
        let q_arith = circuit.base().selector("q_arith").unwrap();
        assert_eq!(q_arith, &[Fr::one()]);
    }

    #[test]
    fn test_arithmetic_gates() {
        let mut circuit = UltraCircuitConstructor::new();
        let a = circuit.add_variable(Fr::from_u64(3));
        let b = circuit.add_variable(Fr::from_u64(4));
        let c = circuit.add_variable(Fr::from_u64(7));
        let d = circuit.add_variable(Fr::from_u64(28));
        add(&mut circuit, a, b, c);
        circuit.create_mul_gate(&MulTriple {
            a: b,
            b: c,
            c: d,
            mul_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
        let bit = circuit.add_variable(Fr::one());
        circuit.create_bool_gate(bit);
        // 3·4 + 3 + 7 − 28 + 6 = 0
        circuit.create_big_mul_gate(&MulQuad {
            a,
            b,
            c,
            d,
            mul_scaling: Fr::one(),
            a_scaling: Fr::one(),
            b_scaling: Fr::zero(),
            c_scaling: Fr::one(),
            d_scaling: -Fr::one(),
            const_scaling: Fr::from_u64(6),
        });
        assert!(circuit.check_circuit());

        circuit.set_variable(bit, Fr::from_u64(2));
        assert!(!circuit.check_circuit());
    }

    #[test]
    fn test_big_add_reads_next_row() {
        let mut circuit = UltraCircuitConstructor::new();
        let vars: Vec<u32> = [1u64, 2, 3, 4].iter().map(|v| circuit.add_variable(Fr::from_u64(*v))).collect();
        let next = circuit.add_variable(-Fr::from_u64(10));
        // 1 + 2 + 3 + 4 + w_4' = 0
        circuit.create_big_add_gate_with_next(
            &AddQuad {
                a: vars[0],
                b: vars[1],
                c: vars[2],
                d: vars[3],
                a_scaling: Fr::one(),
                b_scaling: Fr::one(),
                c_scaling: Fr::one(),
                d_scaling: Fr::one(),
                const_scaling: Fr::zero(),
            },
            true,
        );
        let zero = circuit.zero_idx();
        circuit.create_big_add_gate(&AddQuad {
            a: zero,
            b: zero,
            c: zero,
            d: next,
            a_scaling: Fr::zero(),
            b_scaling: Fr::zero(),
            c_scaling: Fr::zero(),
            d_scaling: Fr::one(),
            const_scaling: Fr::from_u64(10),
        });
        assert!(circuit.check_circuit());

        circuit.set_variable(vars[0], Fr::from_u64(2));
        assert!(!circuit.check_circuit());
    }

    #[test]
    fn test_range_constraints() {
        for (value, bits, ok) in [(200u64, 8, true), (255, 8, true), (256, 8, false), (16383, 14, true), (1 << 20, 21, true), (1 << 21, 21, false)] {
            let mut circuit = UltraCircuitConstructor::new();
            let x = circuit.add_variable(Fr::from_u64(value));
            circuit.create_range_constraint(x, bits, "out of range");
            assert!(!circuit.failed());
            assert_eq!(circuit.check_circuit(), ok, "value {value} in {bits} bits");
        }
    }

    #[test]
    fn test_estimate_matches_final_count() {
        let mut circuit = UltraCircuitConstructor::new();
        let mut rng = ChaCha20Rng::seed_from_u64(12345);
        for bits in [3usize, 8, 8, 20] {
            let value = Fr::from_u64(rand::Rng::gen_range(&mut rng, 0..(1u64 << bits)));
            let x = circuit.add_variable(value);
            circuit.create_range_constraint(x, bits, "range");
        }
        let rom = circuit.create_rom_array(3);
        let v = circuit.add_variable(Fr::from_u64(9));
        circuit.set_rom_element(rom, 2, v);
        let ram = circuit.create_ram_array(2);
        circuit.init_ram_element(ram, 1, v);
        let one = circuit.add_variable(Fr::one());
        circuit.read_ram_array(ram, one);

        let estimate = circuit.estimated_gates();
        circuit.finalize_circuit();
        assert_eq!(circuit.final_gate_count(), Some(estimate));
        assert_eq!(circuit.estimated_gates(), estimate);
    }

    #[test]
    fn test_finalize_is_one_shot() {
        let mut circuit = UltraCircuitConstructor::new();
        let x = circuit.add_variable(Fr::from_u64(5));
        circuit.create_range_constraint(x, 4, "range");
        circuit.finalize_circuit();
        let gates = circuit.num_gates();
        circuit.finalize_circuit();
        assert_eq!(circuit.num_gates(), gates);
    }

    #[test]
    fn test_missing_tau_entry_fails() {
        let mut circuit = UltraCircuitConstructor::new();
        let x = circuit.add_variable(Fr::from_u64(5));
        let tag = circuit.base_mut().get_new_tag();
        circuit.base_mut().assign_tag(x, tag);
        let zero = circuit.zero_idx();
        add(&mut circuit, x, zero, x);
        assert!(!circuit.check_circuit());
    }

    #[test]
    fn test_logic_constraints() {
        let mut circuit = UltraCircuitConstructor::new();
        let a = circuit.add_variable(Fr::from_u64(0b1100_1010));
        let b = circuit.add_variable(Fr::from_u64(0b1010_0110));
        let xor = circuit.create_xor_constraint(a, b, 8);
        assert_eq!(circuit.get_variable(*xor.out.last().unwrap()), Fr::from_u64(0b0110_1100));
        assert!(circuit.check_circuit());
    }

    #[test]
    fn test_memory_challenge_is_deterministic() {
        let build = |value: u64| {
            let mut circuit = UltraCircuitConstructor::new();
            let x = circuit.add_variable(Fr::from_u64(value));
            let rom = circuit.create_rom_array(2);
            circuit.set_rom_element(rom, 0, x);
            circuit.set_rom_element(rom, 1, x);
            let zero = circuit.zero_idx();
            circuit.read_rom_array(rom, zero);
            circuit.finalize_circuit();
            circuit
        };
        let circuit = build(9);
        assert_eq!(circuit.memory_challenge(), build(9).memory_challenge());
        assert_ne!(circuit.memory_challenge(), build(10).memory_challenge());
        assert!(circuit.check_circuit());
        assert_eq!(circuit.check_circuit(), circuit.check_with_eta(circuit.memory_challenge()));
    }
}
