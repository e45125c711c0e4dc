//! Label-addressed polynomial buffers owned by a proving key

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::field::Fr;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PolynomialStore {
    polynomials: BTreeMap<String, Vec<Fr>>,
}

impl PolynomialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the buffer stored under `label`.
    pub fn put(&mut self, label: impl Into<String>, values: Vec<Fr>) {
        self.polynomials.insert(label.into(), values);
    }

    pub fn get(&self, label: &str) -> Result<&[Fr]> {
        self.polynomials
            .get(label)
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("polynomial '{label}' not found in store"))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.polynomials.contains_key(label)
    }

    pub fn remove(&mut self, label: &str) -> Option<Vec<Fr>> {
        self.polynomials.remove(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.polynomials.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.polynomials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polynomials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let mut store = PolynomialStore::new();
        store.put("q_m_lagrange", vec![Fr::one(), Fr::zero()]);
        assert!(store.contains("q_m_lagrange"));
        assert_eq!(store.get("q_m_lagrange").unwrap(), &[Fr::one(), Fr::zero()]);

        store.put("q_m_lagrange", vec![Fr::from_u64(2)]);
        assert_eq!(store.get("q_m_lagrange").unwrap().len(), 1);

        assert!(store.remove("q_m_lagrange").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_label_is_an_error() {
        let store = PolynomialStore::new();
        let err = store.get("sigma_1").unwrap_err();
        assert!(err.to_string().contains("sigma_1"));
    }
}
