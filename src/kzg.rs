//! KZG polynomial commitments over BN254
//!
//! - Updatable SRS generation (simulated multi-party ceremony)
//! - The [`CommitmentEngine`] seam used by the work queue
//! - Single-point opening proofs and their pairing check

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::curve::{pairing_check, G1Affine, G1Projective, G2Affine};
use crate::field::Fr;
use crate::polynomial::Polynomial;

/// Multi-scalar-multiplication backend for committing to coefficient vectors.
///
/// `batch_commit` must return one commitment per input, in input order.
pub trait CommitmentEngine {
    fn commit(&self, coeffs: &[Fr]) -> G1Affine;

    fn batch_commit(&self, polys: &[&[Fr]]) -> Vec<G1Affine> {
        polys.iter().map(|coeffs| self.commit(coeffs)).collect()
    }
}

/// Structured Reference String
///
/// - G1: [1]₁, [τ]₁, ..., [τ^d]₁
/// - G2: [1]₂, [τ]₂
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Srs {
    pub max_degree: usize,
    pub g1_powers: Vec<G1Affine>,
    pub g2_generator: G2Affine,
    pub g2_tau: G2Affine,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CeremonyRound {
    pub participant_id: usize,
    pub contribution_hash: String,
}

#[derive(Clone, Debug)]
pub struct CeremonyResult {
    pub srs: Srs,
    pub rounds: Vec<CeremonyRound>,
    pub final_hash: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub point: G1Affine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningProof(pub G1Affine);

impl Srs {
    /// Single-secret setup, for tests.
    pub fn generate_insecure<R: Rng>(rng: &mut R, max_degree: usize) -> Self {
        let tau = Fr::random(rng);
        Self::from_tau(&tau, max_degree)
    }

    /// Setup from a known τ.
    pub fn from_tau(tau: &Fr, max_degree: usize) -> Self {
        let g1 = G1Affine::generator();
        let g1_powers = std::iter::successors(Some(Fr::one()), |p| Some(*p * *tau))
            .take(max_degree + 1)
            .map(|power| g1.mul_glv(&power).to_affine())
            .collect();
        let g2 = G2Affine::generator();
        Srs {
            max_degree,
            g1_powers,
            g2_generator: g2,
            g2_tau: g2.to_projective().scalar_mul(tau).to_affine(),
        }
    }

    pub fn simulate_ceremony(max_degree: usize, num_participants: usize) -> Srs {
        let mut rng = rand::thread_rng();
        Self::simulate_ceremony_with_rng(&mut rng, max_degree, num_participants).srs
    }

    /// Each participant multiplies the running τ by a fresh secret r_i,
    /// so τ = Π r_i stays unknown while any one of them forgets r_i.
    pub fn simulate_ceremony_with_rng<R: Rng>(
        rng: &mut R,
        max_degree: usize,
        num_participants: usize,
    ) -> CeremonyResult {
        let mut g1_powers: Vec<G1Projective> = vec![G1Projective::generator(); max_degree + 1];
        let g2 = G2Affine::generator();
        let mut g2_tau = g2.to_projective();
        let mut rounds = Vec::with_capacity(num_participants);

        for participant_id in 0..num_participants {
            let r = Fr::random(rng);
            let mut r_power = Fr::one();
            for power in g1_powers.iter_mut() {
                *power = power.scalar_mul(&r_power);
                r_power *= r;
            }
            g2_tau = g2_tau.scalar_mul(&r);

            let mut hasher = Sha256::new();
            hasher.update(participant_id.to_le_bytes());
            for p in g1_powers.iter().take(3) {
                hasher.update(p.to_affine().to_compressed_bytes());
            }
            let contribution_hash = hex::encode(hasher.finalize());
            debug!(participant_id, %contribution_hash, "ceremony contribution");
            rounds.push(CeremonyRound {
                participant_id,
                contribution_hash,
            });
        }

        let g1_powers: Vec<G1Affine> = g1_powers.iter().map(|p| p.to_affine()).collect();
        let g2_tau = g2_tau.to_affine();

        let mut hasher = Sha256::new();
        for p in &g1_powers {
            hasher.update(p.to_compressed_bytes());
        }
        hasher.update(g2_tau.to_compressed_bytes());
        let final_hash = hex::encode(hasher.finalize());

        CeremonyResult {
            srs: Srs {
                max_degree,
                g1_powers,
                g2_generator: g2,
                g2_tau,
            },
            rounds,
            final_hash,
        }
    }

    /// Spot-check e([τ^i]₁, [1]₂) = e([τ^{i-1}]₁, [τ]₂) on a few powers.
    pub fn verify(&self) -> bool {
        [1, 2, 5, self.max_degree]
            .into_iter()
            .filter(|i| *i >= 1 && *i < self.g1_powers.len())
            .all(|i| {
                pairing_check(
                    &self.g1_powers[i],
                    &self.g2_generator,
                    &self.g1_powers[i - 1],
                    &self.g2_tau,
                )
            })
    }
}

impl CommitmentEngine for Srs {
    /// [f]₁ = Σ f_i · [τ^i]₁
    fn commit(&self, coeffs: &[Fr]) -> G1Affine {
        assert!(
            coeffs.len() <= self.g1_powers.len(),
            "polynomial of degree {} exceeds SRS max degree {}",
            coeffs.len().saturating_sub(1),
            self.max_degree
        );
        G1Projective::msm(&self.g1_powers[..coeffs.len()], coeffs).to_affine()
    }
}

impl Commitment {
    pub fn commit<E: CommitmentEngine + ?Sized>(poly: &Polynomial, engine: &E) -> Self {
        Commitment {
            point: engine.commit(&poly.coeffs),
        }
    }

    pub fn to_hex(&self) -> String {
        self.point.to_hex()
    }
}

impl OpeningProof {
    /// Prove f(z) = y with π = [(f(X) − y) / (X − z)]₁.
    pub fn create(poly: &Polynomial, z: &Fr, srs: &Srs) -> (Fr, Self) {
        let y = poly.evaluate(z);
        let quotient = poly.opening_quotient(z);
        (y, OpeningProof(srs.commit(&quotient.coeffs)))
    }

    /// e([f]₁ − y·[1]₁, [1]₂) = e(π, [τ]₂ − z·[1]₂)
    pub fn verify(commitment: &Commitment, z: &Fr, y: &Fr, proof: &OpeningProof, srs: &Srs) -> bool {
        let lhs = commitment.point.to_projective() - G1Projective::generator().scalar_mul(y);
        let rhs_g2 = srs.g2_tau.to_projective() + srs.g2_generator.to_projective().scalar_mul(&-*z);
        pairing_check(&lhs.to_affine(), &srs.g2_generator, &proof.0, &rhs_g2.to_affine())
    }
}
