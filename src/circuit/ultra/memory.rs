//! ROM and RAM transcripts
//!
//! Every access becomes a gate whose fourth wire is a "record" binding the
//! index, value and (for RAM) timestamp with powers of a challenge η:
//!
//!   record = w_1·η + w_2·η² + w_3·η³ + is_write
//!
//! η is only known after the first three wires are committed, so the
//! record wires stay zero here and the gates that need one are listed in
//! `memory_read_records` / `memory_write_records`. At finalization the
//! accesses are copied into a list sorted by index (and timestamp) whose
//! records are tied to the originals through the generalized permutation.

use super::{AuxSelector, UltraCircuitConstructor};
use crate::circuit::{AddQuad, CircuitConstructor};
use crate::field::Fr;

/// Placeholder for a memory cell nobody has written yet.
pub const UNINITIALIZED_MEMORY_RECORD: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RomRecord {
    pub index_witness: u32,
    pub value_column1_witness: u32,
    pub value_column2_witness: u32,
    pub index: u32,
    pub record_witness: u32,
    pub gate_index: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RomTranscript {
    /// Two value witnesses per cell.
    pub state: Vec<[u32; 2]>,
    pub records: Vec<RomRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RamRecord {
    pub index_witness: u32,
    pub timestamp_witness: u32,
    pub value_witness: u32,
    pub index: u32,
    pub timestamp: u32,
    pub access_type: AccessType,
    pub record_witness: u32,
    pub gate_index: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RamTranscript {
    /// Witness currently stored in each cell.
    pub state: Vec<u32>,
    pub records: Vec<RamRecord>,
    pub access_count: usize,
}

impl UltraCircuitConstructor {
    fn memory_index(&self, index_witness: u32, size: usize) -> u32 {
        let index = self.get_variable(index_witness).to_u64().unwrap_or(u64::MAX);
        assert!(
            (index as u128) < size as u128,
            "memory index {index} out of bounds for array of size {size}"
        );
        index as u32
    }

    fn index_witness(&mut self, index: u32) -> u32 {
        if index == 0 {
            self.base.zero_idx
        } else {
            self.put_constant_variable(Fr::from_u64(index as u64))
        }
    }

    // ------------------------------------------------------------------
    // ROM
    // ------------------------------------------------------------------

    pub fn create_rom_array(&mut self, array_size: usize) -> usize {
        self.rom_arrays.push(RomTranscript {
            state: vec![[UNINITIALIZED_MEMORY_RECORD; 2]; array_size],
            records: Vec::new(),
        });
        self.rom_arrays.len() - 1
    }

    pub fn set_rom_element(&mut self, rom_id: usize, index_value: usize, value_witness: u32) {
        let zero = self.base.zero_idx;
        self.set_rom_element_pair(rom_id, index_value, [value_witness, zero]);
    }

    pub fn set_rom_element_pair(&mut self, rom_id: usize, index_value: usize, values: [u32; 2]) {
        assert!(rom_id < self.rom_arrays.len(), "unknown ROM array {rom_id}");
        let size = self.rom_arrays[rom_id].state.len();
        assert!(index_value < size, "ROM index {index_value} out of bounds for array of size {size}");
        assert!(
            self.rom_arrays[rom_id].state[index_value][0] == UNINITIALIZED_MEMORY_RECORD,
            "ROM cell {index_value} initialized twice"
        );

        let index_witness = self.index_witness(index_value as u32);
        let mut record = RomRecord {
            index_witness,
            value_column1_witness: values[0],
            value_column2_witness: values[1],
            index: index_value as u32,
            record_witness: 0,
            gate_index: 0,
        };
        self.create_rom_gate(&mut record, AuxSelector::RomRead);
        let array = &mut self.rom_arrays[rom_id];
        array.state[index_value] = values;
        array.records.push(record);
    }

    pub fn read_rom_array(&mut self, rom_id: usize, index_witness: u32) -> u32 {
        self.read_rom_array_pair(rom_id, index_witness)[0]
    }

    /// Read both columns of a cell into fresh witnesses.
    pub fn read_rom_array_pair(&mut self, rom_id: usize, index_witness: u32) -> [u32; 2] {
        assert!(rom_id < self.rom_arrays.len(), "unknown ROM array {rom_id}");
        let index = self.memory_index(index_witness, self.rom_arrays[rom_id].state.len());
        let stored = self.rom_arrays[rom_id].state[index as usize];
        assert!(
            stored[0] != UNINITIALIZED_MEMORY_RECORD,
            "ROM cell {index} read before initialization"
        );

        let values = [
            self.add_variable(self.get_variable(stored[0])),
            self.add_variable(self.get_variable(stored[1])),
        ];
        let mut record = RomRecord {
            index_witness,
            value_column1_witness: values[0],
            value_column2_witness: values[1],
            index,
            record_witness: 0,
            gate_index: 0,
        };
        self.create_rom_gate(&mut record, AuxSelector::RomRead);
        self.rom_arrays[rom_id].records.push(record);
        values
    }

    fn create_rom_gate(&mut self, record: &mut RomRecord, selector: AuxSelector) {
        record.record_witness = self.add_variable(Fr::zero());
        record.gate_index = self.base.num_gates;
        self.push_row(
            [
                record.index_witness,
                record.value_column1_witness,
                record.value_column2_witness,
                record.record_witness,
            ],
            selector.selectors(),
        );
    }

    /// Fill empty cells with zero, then emit the sorted copy of every access
    /// followed by a row pinning w_1 to the array size.
    pub(crate) fn process_rom_array(&mut self, rom_id: usize) {
        let read_tag = self.base.get_new_tag();
        let sorted_list_tag = self.base.get_new_tag();
        self.base.create_tag(read_tag, sorted_list_tag);
        self.base.create_tag(sorted_list_tag, read_tag);

        let zero = self.base.zero_idx;
        for i in 0..self.rom_arrays[rom_id].state.len() {
            if self.rom_arrays[rom_id].state[i][0] == UNINITIALIZED_MEMORY_RECORD {
                self.set_rom_element_pair(rom_id, i, [zero, zero]);
            }
        }

        let mut records = self.rom_arrays[rom_id].records.clone();
        records.sort_by_key(|r| r.index);
        for record in &records {
            let value1 = self.get_variable(record.value_column1_witness);
            let value2 = self.get_variable(record.value_column2_witness);
            let mut sorted = RomRecord {
                index_witness: self.add_variable(Fr::from_u64(record.index as u64)),
                value_column1_witness: self.add_variable(value1),
                value_column2_witness: self.add_variable(value2),
                index: record.index,
                record_witness: 0,
                gate_index: 0,
            };
            self.create_rom_gate(&mut sorted, AuxSelector::RomConsistencyCheck);

            self.base.assign_tag(record.record_witness, read_tag);
            self.base.assign_tag(sorted.record_witness, sorted_list_tag);
            self.memory_read_records.push(sorted.gate_index as u32);
            self.memory_read_records.push(record.gate_index as u32);
        }

        // index deltas are 0 or 1 and the run starts at 0, so ending one
        // below the size means every index was covered
        let size = Fr::from_u64(self.rom_arrays[rom_id].state.len() as u64);
        let max_index = self.add_variable(size);
        self.create_big_add_gate(&AddQuad {
            a: max_index,
            b: zero,
            c: zero,
            d: zero,
            a_scaling: Fr::one(),
            b_scaling: Fr::zero(),
            c_scaling: Fr::zero(),
            d_scaling: Fr::zero(),
            const_scaling: -size,
        });
    }

    // ------------------------------------------------------------------
    // RAM
    // ------------------------------------------------------------------

    pub fn create_ram_array(&mut self, array_size: usize) -> usize {
        self.ram_arrays.push(RamTranscript {
            state: vec![UNINITIALIZED_MEMORY_RECORD; array_size],
            records: Vec::new(),
            access_count: 0,
        });
        self.ram_arrays.len() - 1
    }

    pub fn init_ram_element(&mut self, ram_id: usize, index_value: usize, value_witness: u32) {
        assert!(ram_id < self.ram_arrays.len(), "unknown RAM array {ram_id}");
        let size = self.ram_arrays[ram_id].state.len();
        assert!(index_value < size, "RAM index {index_value} out of bounds for array of size {size}");
        assert!(
            self.ram_arrays[ram_id].state[index_value] == UNINITIALIZED_MEMORY_RECORD,
            "RAM cell {index_value} initialized twice"
        );

        let index_witness = self.index_witness(index_value as u32);
        let timestamp = self.ram_arrays[ram_id].access_count as u32;
        let timestamp_witness = self.put_constant_variable(Fr::from_u64(timestamp as u64));
        let mut record = RamRecord {
            index_witness,
            timestamp_witness,
            value_witness,
            index: index_value as u32,
            timestamp,
            access_type: AccessType::Write,
            record_witness: 0,
            gate_index: 0,
        };
        self.create_ram_gate(&mut record);
        let array = &mut self.ram_arrays[ram_id];
        array.state[index_value] = value_witness;
        array.access_count += 1;
        array.records.push(record);
    }

    pub fn read_ram_array(&mut self, ram_id: usize, index_witness: u32) -> u32 {
        let (index, timestamp, timestamp_witness) = self.ram_access(ram_id, index_witness);
        let stored = self.ram_arrays[ram_id].state[index as usize];
        let value_witness = self.add_variable(self.get_variable(stored));
        let mut record = RamRecord {
            index_witness,
            timestamp_witness,
            value_witness,
            index,
            timestamp,
            access_type: AccessType::Read,
            record_witness: 0,
            gate_index: 0,
        };
        self.create_ram_gate(&mut record);
        let array = &mut self.ram_arrays[ram_id];
        array.records.push(record);
        array.access_count += 1;
        value_witness
    }

    pub fn write_ram_array(&mut self, ram_id: usize, index_witness: u32, value_witness: u32) {
        let (index, timestamp, timestamp_witness) = self.ram_access(ram_id, index_witness);
        let mut record = RamRecord {
            index_witness,
            timestamp_witness,
            value_witness,
            index,
            timestamp,
            access_type: AccessType::Write,
            record_witness: 0,
            gate_index: 0,
        };
        self.create_ram_gate(&mut record);
        let array = &mut self.ram_arrays[ram_id];
        array.records.push(record);
        array.access_count += 1;
        array.state[index as usize] = value_witness;
    }

    /// Bounds and initialization checks shared by reads and writes.
    fn ram_access(&mut self, ram_id: usize, index_witness: u32) -> (u32, u32, u32) {
        assert!(ram_id < self.ram_arrays.len(), "unknown RAM array {ram_id}");
        let index = self.memory_index(index_witness, self.ram_arrays[ram_id].state.len());
        assert!(
            self.ram_arrays[ram_id].state[index as usize] != UNINITIALIZED_MEMORY_RECORD,
            "RAM cell {index} accessed before initialization"
        );
        let timestamp = self.ram_arrays[ram_id].access_count as u32;
        let timestamp_witness = self.put_constant_variable(Fr::from_u64(timestamp as u64));
        (index, timestamp, timestamp_witness)
    }

    fn create_ram_gate(&mut self, record: &mut RamRecord) {
        let selector = match record.access_type {
            AccessType::Read => AuxSelector::RamRead,
            AccessType::Write => AuxSelector::RamWrite,
        };
        self.push_ram_record(record, selector);
    }

    fn push_ram_record(&mut self, record: &mut RamRecord, selector: AuxSelector) {
        record.record_witness = self.add_variable(Fr::zero());
        record.gate_index = self.base.num_gates;
        self.push_row(
            [
                record.index_witness,
                record.timestamp_witness,
                record.value_witness,
                record.record_witness,
            ],
            selector.selectors(),
        );
    }

    /// Last sorted record: an arithmetic row pinning its index to the top cell.
    fn push_final_ram_record(&mut self, record: &mut RamRecord, max_index: Fr) {
        record.record_witness = self.add_variable(Fr::zero());
        record.gate_index = self.base.num_gates;
        self.create_big_add_gate_with_next(
            &AddQuad {
                a: record.index_witness,
                b: record.timestamp_witness,
                c: record.value_witness,
                d: record.record_witness,
                a_scaling: Fr::one(),
                b_scaling: Fr::zero(),
                c_scaling: Fr::zero(),
                d_scaling: Fr::zero(),
                const_scaling: -max_index,
            },
            false,
        );
    }

    /// Initialize empty cells, emit the list sorted by (index, timestamp),
    /// then one timestamp row per adjacent pair whose deltas are range
    /// constrained by the final access count.
    pub(crate) fn process_ram_array(&mut self, ram_id: usize) {
        let access_tag = self.base.get_new_tag();
        let sorted_list_tag = self.base.get_new_tag();
        self.base.create_tag(access_tag, sorted_list_tag);
        self.base.create_tag(sorted_list_tag, access_tag);

        let zero = self.base.zero_idx;
        for i in 0..self.ram_arrays[ram_id].state.len() {
            if self.ram_arrays[ram_id].state[i] == UNINITIALIZED_MEMORY_RECORD {
                self.init_ram_element(ram_id, i, zero);
            }
        }

        let mut records = self.ram_arrays[ram_id].records.clone();
        if records.is_empty() {
            return;
        }
        records.sort_by_key(|r| (r.index, r.timestamp));
        let max_index = Fr::from_u64(self.ram_arrays[ram_id].state.len() as u64 - 1);

        let mut sorted_records = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let value = self.get_variable(record.value_witness);
            let mut sorted = RamRecord {
                index_witness: self.add_variable(Fr::from_u64(record.index as u64)),
                timestamp_witness: self.add_variable(Fr::from_u64(record.timestamp as u64)),
                value_witness: self.add_variable(value),
                ..*record
            };
            if i + 1 < records.len() {
                self.push_ram_record(&mut sorted, AuxSelector::RamConsistencyCheck);
            } else {
                self.push_final_ram_record(&mut sorted, max_index);
            }

            self.base.assign_tag(record.record_witness, access_tag);
            self.base.assign_tag(sorted.record_witness, sorted_list_tag);
            let list = match record.access_type {
                AccessType::Read => &mut self.memory_read_records,
                AccessType::Write => &mut self.memory_write_records,
            };
            list.push(sorted.gate_index as u32);
            list.push(record.gate_index as u32);
            sorted_records.push(sorted);
        }

        let mut timestamp_deltas = Vec::with_capacity(sorted_records.len().saturating_sub(1));
        for pair in sorted_records.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            let delta = if current.index == next.index {
                Fr::from_u64((next.timestamp - current.timestamp) as u64)
            } else {
                Fr::zero()
            };
            let delta_witness = self.add_variable(delta);
            self.push_row(
                [current.index_witness, current.timestamp_witness, delta_witness, zero],
                AuxSelector::RamTimestampCheck.selectors(),
            );
            timestamp_deltas.push(delta_witness);
        }

        // the previous row reads its successor's index and timestamp from here
        if let Some(last) = sorted_records.last() {
            self.create_big_add_gate(&AddQuad {
                a: last.index_witness,
                b: last.timestamp_witness,
                c: zero,
                d: zero,
                a_scaling: Fr::zero(),
                b_scaling: Fr::zero(),
                c_scaling: Fr::zero(),
                d_scaling: Fr::zero(),
                const_scaling: Fr::zero(),
            });
        }

        let max_timestamp = self.ram_arrays[ram_id].access_count.saturating_sub(1) as u64;
        for delta in timestamp_deltas {
            self.create_new_range_constraint(delta, max_timestamp);
        }
    }
}
