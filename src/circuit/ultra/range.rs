//! Range constraints through sorted lists
//!
//! All variables constrained to [0, target] share a tag. At finalization
//! their values are sorted into fresh variables carrying the list's tau tag,
//! and the sorted run is checked to climb from 0 to `target` in steps of at
//! most 3. The generalized permutation then ties the two tagged multisets
//! together. Multiples of 3 up to the target are seeded into every list so
//! that every step of the run is available.

use num_bigint::BigUint;

use super::{UltraCircuitConstructor, UltraSelectors};
use crate::circuit::{AddQuad, AddTriple, CircuitConstructor, DUMMY_TAG};
use crate::field::Fr;

/// Limb size used when decomposing wide range constraints.
pub const DEFAULT_RANGE_BITNUM: usize = 14;
/// Largest gap allowed between adjacent sorted entries.
pub const DEFAULT_RANGE_STEP_SIZE: u64 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeList {
    pub target_range: u64,
    pub range_tag: u32,
    pub tau_tag: u32,
    pub variable_indices: Vec<u32>,
}

/// Entries a new list starts with: 0, 3, 6, ... and the target itself.
pub(crate) fn range_list_seed_len(target_range: u64) -> usize {
    (target_range / DEFAULT_RANGE_STEP_SIZE) as usize + 2
}

/// Gates emitted when a list of `len` distinct variables is processed.
pub(crate) fn sorted_list_gate_count(len: usize) -> usize {
    let mut padding = (4 - len % 4) % 4;
    if len <= 4 {
        padding += 4;
    }
    (len + padding) / 4 + 1
}

impl UltraCircuitConstructor {
    pub fn create_range_list(&mut self, target_range: u64) -> RangeList {
        let range_tag = self.base.get_new_tag();
        let tau_tag = self.base.get_new_tag();
        self.base.create_tag(range_tag, tau_tag);
        self.base.create_tag(tau_tag, range_tag);

        let mut variable_indices = Vec::with_capacity(range_list_seed_len(target_range));
        let seeds = (0..=target_range / DEFAULT_RANGE_STEP_SIZE)
            .map(|i| i * DEFAULT_RANGE_STEP_SIZE)
            .chain(std::iter::once(target_range));
        for value in seeds {
            let idx = self.add_variable(Fr::from_u64(value));
            self.base.assign_tag(idx, range_tag);
            variable_indices.push(idx);
        }
        // the seeds must sit on some wire to enter the permutation
        self.create_dummy_constraints(&variable_indices);

        RangeList {
            target_range,
            range_tag,
            tau_tag,
            variable_indices,
        }
    }

    /// Place variables on selector-free rows, four per row.
    pub fn create_dummy_constraints(&mut self, variable_indices: &[u32]) {
        let zero = self.base.zero_idx;
        for chunk in variable_indices.chunks(4) {
            let mut wires = [zero; 4];
            wires[..chunk.len()].copy_from_slice(chunk);
            self.push_row(wires, UltraSelectors::default());
        }
    }

    /// Constrain a variable to [0, target_range].
    ///
    /// A variable already in a tighter list is left alone. One in a looser
    /// list (or in a non-range set) is copied first, since a tag cannot be
    /// taken back.
    pub fn create_new_range_constraint(&mut self, variable_index: u32, target_range: u64) {
        if !self.range_lists.contains_key(&target_range) {
            let list = self.create_range_list(target_range);
            self.range_lists.insert(target_range, list);
        }
        let list_tag = self.range_lists[&target_range].range_tag;
        let existing_tag = self.base.tag_of(variable_index);
        if existing_tag == list_tag {
            return;
        }

        if existing_tag != DUMMY_TAG {
            let existing_range = self
                .range_lists
                .iter()
                .find(|(_, list)| list.range_tag == existing_tag)
                .map(|(range, _)| *range);
            if matches!(existing_range, Some(range) if range < target_range) {
                return;
            }
            let copy = self.add_variable(self.get_variable(variable_index));
            let zero = self.base.zero_idx;
            self.create_add_gate(&AddTriple {
                a: variable_index,
                b: copy,
                c: zero,
                a_scaling: Fr::one(),
                b_scaling: -Fr::one(),
                c_scaling: Fr::zero(),
                const_scaling: Fr::zero(),
            });
            self.create_new_range_constraint(copy, target_range);
            return;
        }

        self.base.assign_tag(variable_index, list_tag);
        if let Some(list) = self.range_lists.get_mut(&target_range) {
            list.variable_indices.push(variable_index);
        }
    }

    /// Split a wide variable into 14-bit limbs, range-constrain each limb,
    /// and rebuild the value three limbs per row. Every row but the last
    /// passes the remaining accumulator to the next row's w_4.
    pub fn decompose_into_default_range(&mut self, variable_index: u32, num_bits: usize) -> Vec<u32> {
        assert!(num_bits > 0, "range constraint needs at least one bit");
        let value = self.get_variable(variable_index);

        let limb_mask = (1u64 << DEFAULT_RANGE_BITNUM) - 1;
        let remainder_bits = num_bits % DEFAULT_RANGE_BITNUM;
        let num_limbs = num_bits.div_ceil(DEFAULT_RANGE_BITNUM);
        let last_limb_range = (1u64 << remainder_bits) - 1;

        let mut rest = value.to_biguint();
        let mut sublimbs = Vec::with_capacity(num_limbs);
        for _ in 0..num_limbs {
            let limb = (&rest & BigUint::from(limb_mask)).to_u64_digits().first().copied().unwrap_or(0);
            sublimbs.push(limb);
            rest >>= DEFAULT_RANGE_BITNUM;
        }

        let mut sublimb_indices = Vec::with_capacity(num_limbs);
        for (i, limb) in sublimbs.iter().enumerate() {
            let limb_idx = self.add_variable(Fr::from_u64(*limb));
            sublimb_indices.push(limb_idx);
            if i == num_limbs - 1 && remainder_bits != 0 {
                self.create_new_range_constraint(limb_idx, last_limb_range);
            } else {
                self.create_new_range_constraint(limb_idx, limb_mask);
            }
        }

        let num_triples = num_limbs.div_ceil(3);
        let zero = self.base.zero_idx;
        let mut accumulator = value;
        let mut accumulator_idx = variable_index;
        for i in 0..num_triples {
            let mut limbs = [zero; 3];
            let mut scalings = [Fr::zero(); 3];
            let mut next_accumulator = accumulator;
            for k in 0..3 {
                let position = 3 * i + k;
                let shift = Fr::from_u64(2).pow((DEFAULT_RANGE_BITNUM * position) as u64);
                scalings[k] = shift;
                if let Some(idx) = sublimb_indices.get(position) {
                    limbs[k] = *idx;
                    next_accumulator -= Fr::from_u64(sublimbs[position]) * shift;
                }
            }
            let last = i == num_triples - 1;
            self.create_big_add_gate_with_next(
                &AddQuad {
                    a: limbs[0],
                    b: limbs[1],
                    c: limbs[2],
                    d: accumulator_idx,
                    a_scaling: scalings[0],
                    b_scaling: scalings[1],
                    c_scaling: scalings[2],
                    d_scaling: -Fr::one(),
                    const_scaling: Fr::zero(),
                },
                !last,
            );
            if !last {
                accumulator_idx = self.add_variable(next_accumulator);
                accumulator = next_accumulator;
            }
        }
        sublimb_indices
    }

    /// Sort the list's values into tau-tagged copies and constrain the run.
    pub(crate) fn process_range_list(&mut self, list: &RangeList) {
        let mut reals: Vec<u32> = list.variable_indices.iter().map(|i| self.real_index(*i)).collect();
        reals.sort_unstable();
        reals.dedup();

        let mut values: Vec<Fr> = reals.iter().map(|i| self.get_variable(*i)).collect();
        values.sort_by_key(|v| {
            let mut limbs = v.to_canonical();
            limbs.reverse();
            limbs
        });

        let mut padding = (4 - values.len() % 4) % 4;
        if values.len() <= 4 {
            padding += 4;
        }
        let mut indices = vec![self.base.zero_idx; padding];
        for value in values {
            let idx = self.add_variable(value);
            self.base.assign_tag(idx, list.tau_tag);
            indices.push(idx);
        }
        self.create_sort_constraint_with_edges(&indices, Fr::zero(), Fr::from_u64(list.target_range));
    }

    /// Adjacent entries, read across rows, differ by 0..=3.
    pub fn create_sort_constraint(&mut self, variable_indices: &[u32]) {
        assert!(
            variable_indices.len() % 4 == 0,
            "sorted list length must be a multiple of 4"
        );
        let sort = UltraSelectors {
            q_sort: Fr::one(),
            ..UltraSelectors::default()
        };
        for chunk in variable_indices.chunks(4) {
            self.push_row([chunk[0], chunk[1], chunk[2], chunk[3]], sort);
        }
        if let Some(last) = variable_indices.last() {
            let zero = self.base.zero_idx;
            self.push_row([*last, zero, zero, zero], UltraSelectors::default());
        }
    }

    /// Sort constraint that also pins the first entry to `start` and the
    /// last to `end`.
    pub fn create_sort_constraint_with_edges(&mut self, variable_indices: &[u32], start: Fr, end: Fr) {
        let len = variable_indices.len();
        assert!(
            len >= 4 && len % 4 == 0,
            "sorted list length must be a positive multiple of 4"
        );
        let row = |i: usize| [variable_indices[i], variable_indices[i + 1], variable_indices[i + 2], variable_indices[i + 3]];
        let sort = UltraSelectors {
            q_sort: Fr::one(),
            ..UltraSelectors::default()
        };

        self.push_row(
            row(0),
            UltraSelectors {
                q_1: Fr::one(),
                q_c: -start,
                q_arith: Fr::one(),
                q_sort: Fr::one(),
                ..UltraSelectors::default()
            },
        );
        for i in (4..len.saturating_sub(4)).step_by(4) {
            self.push_row(row(i), sort);
        }
        if len > 4 {
            self.push_row(row(len - 4), sort);
        }

        let zero = self.base.zero_idx;
        self.push_row(
            [variable_indices[len - 1], zero, zero, zero],
            UltraSelectors {
                q_1: Fr::one(),
                q_c: -end,
                q_arith: Fr::one(),
                ..UltraSelectors::default()
            },
        );
    }
}
