//! Proving key: evaluation domains plus the polynomial store

use serde::{Deserialize, Serialize};

use super::polynomial_store::PolynomialStore;
use crate::fft::Domain;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComposerType {
    Standard,
    Ultra,
    StandardHonk,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvingKey {
    pub composer_type: ComposerType,
    /// Rows of every polynomial, a power of two.
    pub circuit_size: usize,
    pub num_public_inputs: usize,
    pub small_domain: Domain,
    /// Four times the circuit size, for coset evaluations of the quotient.
    pub large_domain: Domain,
    pub polynomial_store: PolynomialStore,
    /// Rows whose fourth wire holds a memory record (Ultra only).
    pub memory_read_records: Vec<u32>,
    pub memory_write_records: Vec<u32>,
}

impl ProvingKey {
    /// `None` if the size has no root of unity in Fr.
    pub fn new(composer_type: ComposerType, circuit_size: usize, num_public_inputs: usize) -> Option<Self> {
        Some(ProvingKey {
            composer_type,
            circuit_size,
            num_public_inputs,
            small_domain: Domain::new(circuit_size)?,
            large_domain: Domain::new(4 * circuit_size)?,
            polynomial_store: PolynomialStore::new(),
            memory_read_records: Vec::new(),
            memory_write_records: Vec::new(),
        })
    }
}
