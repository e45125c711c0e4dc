use std::cell::RefCell;

use plonk_composer::curve::G1Projective;
use plonk_composer::proof_system::WorkQueue;
use plonk_composer::transcript::Transcript;
use plonk_composer::{CommitmentEngine, Fr, G1Affine, Srs};

/// Commits by summing scalars times the generator, computing the batch
/// back to front.
#[derive(Default)]
struct ReversingEngine {
    order: RefCell<Vec<usize>>,
}

impl CommitmentEngine for ReversingEngine {
    fn commit(&self, coeffs: &[Fr]) -> G1Affine {
        let sum: Fr = coeffs.iter().copied().sum();
        (G1Projective::generator() * sum).to_affine()
    }

    fn batch_commit(&self, polys: &[&[Fr]]) -> Vec<G1Affine> {
        let mut out = vec![G1Affine::identity(); polys.len()];
        for i in (0..polys.len()).rev() {
            self.order.borrow_mut().push(i);
            out[i] = self.commit(polys[i]);
        }
        out
    }
}

#[test]
fn test_results_follow_queue_order() {
    let engine = ReversingEngine::default();
    let mut queue = WorkQueue::new(&engine);
    let mut transcript = Transcript::new(b"queue-order");
    queue.add_commitment(vec![Fr::from_u64(1)], "A");
    queue.add_commitment(vec![Fr::from_u64(2)], "B");
    queue.add_commitment(vec![Fr::from_u64(3)], "C");
    assert_eq!(queue.get_queued_work_item_info().num_scalar_multiplications, 3);

    queue.process_queue(&mut transcript);

    assert_eq!(*engine.order.borrow(), vec![2, 1, 0]);
    assert_eq!(transcript.labels(), vec!["A", "B", "C"]);
    let expected = (G1Projective::generator() * Fr::from_u64(2)).to_affine();
    assert_eq!(transcript.get_commitment("B"), Some(expected));
    assert!(queue.get_queue().is_empty());
}

#[test]
fn test_flush_discards_work() {
    let srs = Srs::from_tau(&Fr::from_u64(3), 4);
    let mut queue = WorkQueue::new(&srs);
    let mut transcript = Transcript::new(b"queue-flush");
    queue.add_commitment(vec![Fr::one()], "A");
    queue.flush_queue();
    queue.process_queue(&mut transcript);
    assert!(transcript.labels().is_empty());
}

#[test]
fn test_second_round_appends_after_first() {
    let srs = Srs::from_tau(&Fr::from_u64(3), 4);
    let mut queue = WorkQueue::new(&srs);
    let mut transcript = Transcript::new(b"queue-rounds");
    queue.add_commitment(vec![Fr::one()], "ROUND_1");
    queue.process_queue(&mut transcript);
    transcript.squeeze_challenge("beta");
    queue.add_commitment(vec![Fr::one(), Fr::one()], "ROUND_2");
    queue.process_queue(&mut transcript);
    assert_eq!(transcript.labels(), vec!["ROUND_1", "ROUND_2"]);
}
