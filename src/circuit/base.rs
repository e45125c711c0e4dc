//! State shared by every circuit constructor
//!
//! Variables live in an arena indexed by `u32`. Copy constraints are kept
//! as a union-find forest over that arena: the root of a class is the
//! "real" variable whose value and tag the whole class shares.

use std::collections::BTreeMap;

use tracing::warn;

use super::DUMMY_TAG;
use crate::field::Fr;

/// Values plus union-find parents.
#[derive(Clone, Debug, Default)]
pub struct VariableArena {
    values: Vec<Fr>,
    parents: Vec<u32>,
}

impl VariableArena {
    pub fn push(&mut self, value: Fr) -> u32 {
        let idx = self.values.len() as u32;
        self.values.push(value);
        self.parents.push(idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Root of `idx`'s class, without touching the forest.
    pub fn real_index(&self, idx: u32) -> u32 {
        let mut current = idx;
        while self.parents[current as usize] != current {
            current = self.parents[current as usize];
        }
        current
    }

    /// Root of `idx`'s class, compressing the path on the way.
    pub fn find(&mut self, idx: u32) -> u32 {
        let root = self.real_index(idx);
        let mut current = idx;
        while current != root {
            let next = self.parents[current as usize];
            self.parents[current as usize] = root;
            current = next;
        }
        root
    }

    /// Attach `child`'s class below `root`'s; returns the surviving root.
    pub fn union(&mut self, root: u32, child: u32) -> u32 {
        let a = self.find(root);
        let b = self.find(child);
        if a != b {
            self.parents[b as usize] = a;
        }
        a
    }

    pub fn value(&self, idx: u32) -> Fr {
        self.values[self.real_index(idx) as usize]
    }

    /// Value stored at `idx` itself, ignoring aliasing.
    pub fn raw_value(&self, idx: u32) -> Fr {
        self.values[idx as usize]
    }

    /// Overwrite the value of every member of `idx`'s class.
    pub fn set_value(&mut self, idx: u32, value: Fr) {
        let root = self.find(idx);
        for i in 0..self.values.len() as u32 {
            if self.real_index(i) == root {
                self.values[i as usize] = value;
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBase {
    pub variables: VariableArena,
    /// Tag of each variable, read at the real index.
    pub real_variable_tags: Vec<u32>,
    /// Tag → tag the generalized permutation maps it to.
    pub tau: BTreeMap<u32, u32>,
    pub current_tag: u32,
    pub public_inputs: Vec<u32>,
    /// One column of variable indices per wire.
    pub wires: Vec<Vec<u32>>,
    pub selector_names: Vec<&'static str>,
    pub selectors: Vec<Vec<Fr>>,
    pub num_gates: usize,
    /// Cached constant variables, keyed by canonical limbs.
    pub constant_variables: BTreeMap<[u64; 4], u32>,
    pub zero_idx: u32,
    pub failed: bool,
    pub err: String,
    pub finalized: bool,
    /// Record a failure when `assert_equal` joins different values.
    pub strict: bool,
}

impl CircuitBase {
    pub fn new(width: usize, selector_names: &[&'static str], strict: bool) -> Self {
        let mut tau = BTreeMap::new();
        tau.insert(DUMMY_TAG, DUMMY_TAG);
        CircuitBase {
            variables: VariableArena::default(),
            real_variable_tags: Vec::new(),
            tau,
            current_tag: DUMMY_TAG,
            public_inputs: Vec::new(),
            wires: vec![Vec::new(); width],
            selector_names: selector_names.to_vec(),
            selectors: vec![Vec::new(); selector_names.len()],
            num_gates: 0,
            constant_variables: BTreeMap::new(),
            zero_idx: 0,
            failed: false,
            err: String::new(),
            finalized: false,
            strict,
        }
    }

    pub fn add_variable(&mut self, value: Fr) -> u32 {
        self.real_variable_tags.push(DUMMY_TAG);
        self.variables.push(value)
    }

    pub fn get_variable(&self, idx: u32) -> Fr {
        self.variables.value(idx)
    }

    pub fn real_index(&self, idx: u32) -> u32 {
        self.variables.real_index(idx)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Append one row of wires and selectors.
    pub fn push_gate(&mut self, wires: &[u32], selectors: &[Fr]) {
        assert_eq!(wires.len(), self.wires.len(), "gate width mismatch");
        assert_eq!(selectors.len(), self.selectors.len(), "selector count mismatch");
        for (column, idx) in self.wires.iter_mut().zip(wires) {
            column.push(*idx);
        }
        for (column, q) in self.selectors.iter_mut().zip(selectors) {
            column.push(*q);
        }
        self.num_gates += 1;
    }

    pub fn selector(&self, name: &str) -> Option<&[Fr]> {
        self.selector_names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.selectors[i].as_slice())
    }

    /// Join two classes without comparing values; `a`'s root survives and
    /// inherits `b`'s tag if it has none.
    pub fn union_variables(&mut self, a: u32, b: u32) {
        let a_real = self.variables.find(a);
        let b_real = self.variables.find(b);
        if a_real == b_real {
            return;
        }
        self.variables.union(a_real, b_real);
        if self.real_variable_tags[a_real as usize] == DUMMY_TAG {
            self.real_variable_tags[a_real as usize] = self.real_variable_tags[b_real as usize];
        }
    }

    pub fn get_new_tag(&mut self) -> u32 {
        self.current_tag += 1;
        self.current_tag
    }

    pub fn create_tag(&mut self, tag_index: u32, tau_index: u32) -> u32 {
        self.tau.insert(tag_index, tau_index);
        tag_index
    }

    pub fn assign_tag(&mut self, variable_index: u32, tag: u32) {
        let real = self.real_index(variable_index);
        self.real_variable_tags[real as usize] = tag;
    }

    pub fn tag_of(&self, variable_index: u32) -> u32 {
        self.real_variable_tags[self.real_index(variable_index) as usize]
    }

    /// Keep the first failure only.
    pub fn failure(&mut self, msg: &str) {
        if !self.failed {
            warn!(msg, "circuit failure");
            self.failed = true;
            self.err = msg.to_string();
        }
    }

    /// Every member of a copy class carries the class value.
    pub fn copy_constraints_hold(&self) -> bool {
        (0..self.variables.len() as u32)
            .all(|i| self.variables.raw_value(i) == self.variables.value(i))
    }

    pub fn is_public_input(&self, idx: u32) -> bool {
        let real = self.real_index(idx);
        self.public_inputs.iter().any(|p| self.real_index(*p) == real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_paths() {
        let mut arena = VariableArena::default();
        let vars: Vec<u32> = (0..5).map(|i| arena.push(Fr::from_u64(i))).collect();
        arena.union(vars[0], vars[1]);
        arena.union(vars[1], vars[2]);
        arena.union(vars[3], vars[2]);

        let root = arena.real_index(vars[2]);
        assert_eq!(arena.real_index(vars[0]), root);
        assert_eq!(arena.real_index(vars[3]), root);
        assert_ne!(arena.real_index(vars[4]), root);

        // find compresses but never changes the answer
        assert_eq!(arena.find(vars[1]), root);
        assert_eq!(arena.find(vars[1]), arena.real_index(vars[1]));
    }

    #[test]
    fn test_set_value_updates_whole_class() {
        let mut base = CircuitBase::new(3, &["q"], true);
        let a = base.add_variable(Fr::from_u64(1));
        let b = base.add_variable(Fr::from_u64(1));
        base.union_variables(a, b);
        base.variables.set_value(b, Fr::from_u64(9));
        assert_eq!(base.variables.raw_value(a), Fr::from_u64(9));
        assert!(base.copy_constraints_hold());
    }

    #[test]
    fn test_union_keeps_non_dummy_tag() {
        let mut base = CircuitBase::new(3, &["q"], true);
        let a = base.add_variable(Fr::zero());
        let b = base.add_variable(Fr::zero());
        let tag = base.get_new_tag();
        base.assign_tag(b, tag);
        base.union_variables(a, b);
        assert_eq!(base.tag_of(a), tag);
        assert_eq!(base.real_index(b), a);
    }

    #[test]
    fn test_only_first_failure_is_kept() {
        let mut base = CircuitBase::new(3, &["q"], true);
        base.failure("first");
        base.failure("second");
        assert!(base.failed);
        assert_eq!(base.err, "first");
    }
}
