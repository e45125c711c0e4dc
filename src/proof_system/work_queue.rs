//! Deferred commitment work
//!
//! Provers queue the polynomials they need committed during a round, then
//! flush the queue once. Results reach the transcript in the order the
//! work was queued, whatever order the engine computes them in.

use std::mem;

use tracing::debug;

use crate::curve::G1Affine;
use crate::field::Fr;
use crate::kzg::CommitmentEngine;
use crate::transcript::Transcript;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkType {
    ScalarMultiplication,
}

#[derive(Clone, Debug)]
pub struct WorkItem {
    pub work_type: WorkType,
    /// Monomial coefficients to commit to.
    pub mul_scalars: Vec<Fr>,
    /// Transcript label the commitment is sent under.
    pub label: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkItemInfo {
    pub num_scalar_multiplications: usize,
}

pub struct WorkQueue<'a, E: CommitmentEngine + ?Sized> {
    engine: &'a E,
    work_item_queue: Vec<WorkItem>,
}

impl<'a, E: CommitmentEngine + ?Sized> WorkQueue<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        WorkQueue {
            engine,
            work_item_queue: Vec::new(),
        }
    }

    pub fn add_commitment(&mut self, mul_scalars: Vec<Fr>, label: impl Into<String>) {
        self.work_item_queue.push(WorkItem {
            work_type: WorkType::ScalarMultiplication,
            mul_scalars,
            label: label.into(),
        });
    }

    pub fn get_queued_work_item_info(&self) -> WorkItemInfo {
        WorkItemInfo {
            num_scalar_multiplications: self
                .work_item_queue
                .iter()
                .filter(|item| item.work_type == WorkType::ScalarMultiplication)
                .count(),
        }
    }

    fn scalar_multiplication(&self, work_item_number: usize) -> Option<&WorkItem> {
        self.work_item_queue
            .iter()
            .filter(|item| item.work_type == WorkType::ScalarMultiplication)
            .nth(work_item_number)
    }

    /// Scalars of the `work_item_number`-th queued multiplication.
    pub fn get_scalar_multiplication_data(&self, work_item_number: usize) -> Option<&[Fr]> {
        self.scalar_multiplication(work_item_number)
            .map(|item| item.mul_scalars.as_slice())
    }

    /// Zero if there is no such item.
    pub fn get_scalar_multiplication_size(&self, work_item_number: usize) -> usize {
        self.scalar_multiplication(work_item_number)
            .map_or(0, |item| item.mul_scalars.len())
    }

    /// Hand back a result computed outside the queue. Out-of-range item
    /// numbers are ignored.
    pub fn put_scalar_multiplication_data(
        &self,
        result: G1Affine,
        work_item_number: usize,
        transcript: &mut Transcript,
    ) {
        if let Some(item) = self.scalar_multiplication(work_item_number) {
            transcript.send_to_verifier(&item.label, &result);
        }
    }

    /// Drop everything queued without computing it.
    pub fn flush_queue(&mut self) {
        self.work_item_queue.clear();
    }

    /// Compute every queued commitment, send each to the transcript in
    /// queue order, and leave the queue empty.
    pub fn process_queue(&mut self, transcript: &mut Transcript) {
        let work = mem::take(&mut self.work_item_queue);
        if work.is_empty() {
            return;
        }
        let scalars: Vec<&[Fr]> = work.iter().map(|item| item.mul_scalars.as_slice()).collect();
        let commitments = self.engine.batch_commit(&scalars);
        debug_assert_eq!(commitments.len(), work.len());

        for (item, commitment) in work.iter().zip(&commitments) {
            transcript.send_to_verifier(&item.label, commitment);
        }
        debug!(items = work.len(), "work queue processed");
    }

    pub fn get_queue(&self) -> &[WorkItem] {
        &self.work_item_queue
    }
}
