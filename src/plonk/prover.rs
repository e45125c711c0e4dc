//! PLONK Prover
//!
//! Five rounds over a proving key built by the standard composer.
//!
//! Round 1: blinded wire polynomials, commitments [a], [b], [c]
//! Round 2: permutation grand product [z]
//! Round 3: quotient t(X), split into [t_lo], [t_mid], [t_hi]
//! Round 4: evaluations at ζ
//! Round 5: opening proofs [W_ζ], [W_{ζω}]
//!
//! Commitments are queued per round and reach the transcript when the
//! queue is processed; the proof is read back out of the transcript.
//! Public inputs are not a separate polynomial. Their cells are mapped
//! into the external coset, so the grand product ends at Δ instead of 1.

use anyhow::{bail, Context, Result};
use rand::Rng;
use tracing::{debug, info, warn};

use super::types::{compute_public_input_delta, Proof};
use crate::fft::coset_shift;
use crate::field::Fr;
use crate::kzg::Srs;
use crate::polynomial::{evaluate_coeffs, Polynomial};
use crate::proof_system::proving_key::ProvingKey;
use crate::proof_system::work_queue::WorkQueue;
use crate::transcript::Transcript;

pub const MIN_PROVING_SIZE: usize = 8;

pub(crate) const WIRE_LABELS: [&str; 3] = ["W_1", "W_2", "W_3"];
pub(crate) const QUOTIENT_LABELS: [&str; 3] = ["T_1", "T_2", "T_3"];
pub(crate) const EVALUATION_LABELS: [&str; 6] =
    ["a_eval", "b_eval", "c_eval", "sigma_1_eval", "sigma_2_eval", "z_omega_eval"];

/// Identity multipliers k_j of the three wire columns.
pub(crate) fn column_multipliers() -> [Fr; 3] {
    [Fr::one(), Fr::coset_generator(0), Fr::coset_generator(1)]
}

/// Send the circuit size and public inputs; both sides start this way.
pub(crate) fn start_transcript(label: &str, circuit_size: usize, public_inputs: &[Fr]) -> Transcript {
    let mut transcript = Transcript::new(label.as_bytes());
    transcript.send_to_verifier("circuit_size", &(circuit_size as u64));
    for (i, x) in public_inputs.iter().enumerate() {
        transcript.send_to_verifier(&format!("public_input_{i}"), x);
    }
    transcript
}

struct Challenges {
    beta: Fr,
    gamma: Fr,
    alpha: Fr,
    zeta: Fr,
    v: Fr,
}

pub struct Prover<'a> {
    key: &'a ProvingKey,
    queue: WorkQueue<'a, Srs>,
    transcript: Transcript,
    public_inputs: Vec<Fr>,
}

impl<'a> Prover<'a> {
    /// The key must hold selectors, sigmas and the witness.
    pub fn new(key: &'a ProvingKey, srs: &'a Srs, transcript_label: &str) -> Result<Self> {
        // the quotient has degree 3n+6 and must fit the 4n coset
        if key.circuit_size < MIN_PROVING_SIZE {
            bail!(
                "circuit size {} is below the smallest provable size {MIN_PROVING_SIZE}",
                key.circuit_size
            );
        }
        let w_1 = key.polynomial_store.get("w_1_lagrange")?;
        let public_inputs = w_1[..key.num_public_inputs].to_vec();
        Ok(Prover {
            key,
            queue: WorkQueue::new(srs),
            transcript: start_transcript(transcript_label, key.circuit_size, &public_inputs),
            public_inputs,
        })
    }

    pub fn prove<R: Rng>(self, rng: &mut R) -> Result<Proof> {
        self.prove_with_transcript(rng).map(|(proof, _)| proof)
    }

    /// The proof together with the transcript it was derived from.
    pub fn prove_with_transcript<R: Rng>(mut self, rng: &mut R) -> Result<(Proof, Transcript)> {
        let n = self.key.circuit_size;

        let wires = self.round1(rng)?;
        let beta = self.transcript.squeeze_challenge("beta");
        let gamma = self.transcript.squeeze_challenge("gamma");

        let z = self.round2(beta, gamma, rng)?;
        let alpha = self.transcript.squeeze_challenge("alpha");

        let quotient = self.round3(&wires, &z, beta, gamma, alpha, rng)?;
        let zeta = self.transcript.squeeze_challenge_outside_domain("zeta", n);

        let evals = self.round4(&wires, &z, zeta)?;
        let v = self.transcript.squeeze_challenge("v");

        let challenges = Challenges {
            beta,
            gamma,
            alpha,
            zeta,
            v,
        };
        self.round5(&wires, &z, &quotient, &evals, &challenges)?;
        self.transcript.squeeze_challenge("u");

        let proof = self.read_proof(&evals)?;
        info!(circuit_size = n, public_inputs = self.public_inputs.len(), "proof generated");
        Ok((proof, self.transcript))
    }

    fn round1<R: Rng>(&mut self, rng: &mut R) -> Result<Vec<Polynomial>> {
        let n = self.key.circuit_size;
        let mut wires = Vec::with_capacity(WIRE_LABELS.len());
        for (j, label) in WIRE_LABELS.iter().enumerate() {
            let lagrange = self.key.polynomial_store.get(&format!("w_{}_lagrange", j + 1))?;
            let mut poly = Polynomial::from_evaluations(lagrange, &self.key.small_domain);
            poly.add_blinding(Fr::random(rng), 0, n);
            poly.add_blinding(Fr::random(rng), 1, n);
            self.queue.add_commitment(poly.coeffs.clone(), *label);
            wires.push(poly);
        }
        self.queue.process_queue(&mut self.transcript);
        debug!("round 1: wire commitments sent");
        Ok(wires)
    }

    /// z(ω^0) = 1, z(ω^{i+1}) = z(ω^i) · Π(w + βk_jω^i + γ) / Π(w + βσ_j + γ)
    fn round2<R: Rng>(&mut self, beta: Fr, gamma: Fr, rng: &mut R) -> Result<Polynomial> {
        let n = self.key.circuit_size;
        let store = &self.key.polynomial_store;
        let ks = column_multipliers();

        let mut numerators = vec![Fr::one(); n];
        let mut denominators = vec![Fr::one(); n];
        for (j, k) in ks.iter().enumerate() {
            let wire = store.get(&format!("w_{}_lagrange", j + 1))?;
            let sigma = store.get(&format!("sigma_{}_lagrange", j + 1))?;
            for (i, root) in self.key.small_domain.elements().enumerate() {
                numerators[i] *= wire[i] + beta * *k * root + gamma;
                denominators[i] *= wire[i] + beta * sigma[i] + gamma;
            }
        }
        Fr::batch_invert(&mut denominators);

        let mut z_lagrange = vec![Fr::one(); n];
        for i in 0..n - 1 {
            z_lagrange[i + 1] = z_lagrange[i] * numerators[i] * denominators[i];
        }

        let mut z = Polynomial::from_evaluations(&z_lagrange, &self.key.small_domain);
        for shift in 0..3 {
            z.add_blinding(Fr::random(rng), shift, n);
        }
        self.queue.add_commitment(z.coeffs.clone(), "Z_PERM");
        self.queue.process_queue(&mut self.transcript);
        debug!("round 2: grand product committed");
        Ok(z)
    }

    /// t(X) = [gate + α·perm + α²·L_1(z − 1) + α³·L_n(z − Δ)] / Z_H
    ///
    /// perm = (X − ω^{n−1})·[z(X)·f(X) − z(ωX)·g(X)]. The (X − ω^{n−1})
    /// factor switches the recurrence off on the last row, where L_n pins
    /// z to Δ instead.
    fn round3<R: Rng>(
        &mut self,
        wires: &[Polynomial],
        z: &Polynomial,
        beta: Fr,
        gamma: Fr,
        alpha: Fr,
        rng: &mut R,
    ) -> Result<[Vec<Fr>; 3]> {
        let key = self.key;
        let n = key.circuit_size;
        let large = &key.large_domain;
        let four_n = large.n;
        let shift = coset_shift();
        let store = &key.polynomial_store;
        let ks = column_multipliers();

        let wire_cosets: Vec<Vec<Fr>> = wires.iter().map(|w| large.coset_fft(&w.coeffs, shift)).collect();
        let z_coset = large.coset_fft(&z.coeffs, shift);
        let q_m = store.get("q_m_fft")?;
        let q_1 = store.get("q_1_fft")?;
        let q_2 = store.get("q_2_fft")?;
        let q_3 = store.get("q_3_fft")?;
        let q_c = store.get("q_c_fft")?;
        let sigmas = [store.get("sigma_1_fft")?, store.get("sigma_2_fft")?, store.get("sigma_3_fft")?];

        let points: Vec<Fr> = large.elements().map(|w| w * shift).collect();
        // x^n on the coset cycles through four values
        let shift_n = shift.pow(n as u64);
        let omega4 = large.omega.pow(n as u64);
        let mut vanishing = [Fr::zero(); 4];
        let mut power = Fr::one();
        for value in vanishing.iter_mut() {
            *value = shift_n * power - Fr::one();
            power *= omega4;
        }
        let mut vanishing_inv = vanishing;
        for value in vanishing_inv.iter_mut() {
            *value = value.inverse().context("vanishing polynomial is zero on the quotient coset")?;
        }

        let n_fr = Fr::from_u64(n as u64);
        let omega_last = key.small_domain.element(n - 1);
        let mut l1_denominators: Vec<Fr> = points.iter().map(|x| n_fr * (*x - Fr::one())).collect();
        let mut ln_denominators: Vec<Fr> = points.iter().map(|x| n_fr * (*x - omega_last)).collect();
        Fr::batch_invert(&mut l1_denominators);
        Fr::batch_invert(&mut ln_denominators);

        let delta = compute_public_input_delta(&self.public_inputs, &beta, &gamma, &key.small_domain.omega);
        let alpha2 = alpha.square();
        let alpha3 = alpha2 * alpha;

        let mut quotient = vec![Fr::zero(); four_n];
        for (i, t) in quotient.iter_mut().enumerate() {
            let x = points[i];
            let (a, b, c) = (wire_cosets[0][i], wire_cosets[1][i], wire_cosets[2][i]);
            let z_x = z_coset[i];
            let z_wx = z_coset[(i + 4) % four_n];

            let gate = q_m[i] * a * b + q_1[i] * a + q_2[i] * b + q_3[i] * c + q_c[i];
            let f = (a + beta * ks[0] * x + gamma) * (b + beta * ks[1] * x + gamma) * (c + beta * ks[2] * x + gamma);
            let g = (a + beta * sigmas[0][i] + gamma) * (b + beta * sigmas[1][i] + gamma) * (c + beta * sigmas[2][i] + gamma);
            let permutation = (x - omega_last) * (z_x * f - z_wx * g);

            let z_h = vanishing[i % 4];
            let l1 = z_h * l1_denominators[i];
            let ln = omega_last * z_h * ln_denominators[i];

            let numerator = gate
                + alpha * permutation
                + alpha2 * l1 * (z_x - Fr::one())
                + alpha3 * ln * (z_x - delta);
            *t = numerator * vanishing_inv[i % 4];
        }

        let mut t = large.coset_ifft(&quotient, shift);
        let max_len = 3 * n + 7;
        if t[max_len..].iter().any(|c| !c.is_zero()) {
            warn!(circuit_size = n, "quotient exceeds degree 3n+6; the witness does not satisfy the circuit");
        }
        t.truncate(max_len);

        // t = t_lo + X^n·t_mid + X^{2n}·t_hi, with blinding that cancels in the sum
        let b10 = Fr::random(rng);
        let b11 = Fr::random(rng);
        let mut t_lo = t[..n].to_vec();
        t_lo.push(b10);
        let mut t_mid = t[n..2 * n].to_vec();
        t_mid[0] -= b10;
        t_mid.push(b11);
        let mut t_hi = t[2 * n..].to_vec();
        t_hi[0] -= b11;

        for (label, part) in QUOTIENT_LABELS.iter().zip([&t_lo, &t_mid, &t_hi]) {
            self.queue.add_commitment(part.clone(), *label);
        }
        self.queue.process_queue(&mut self.transcript);
        debug!("round 3: quotient committed");
        Ok([t_lo, t_mid, t_hi])
    }

    /// [ā, b̄, c̄, s̄_σ1, s̄_σ2, z̄_ω]
    fn round4(&mut self, wires: &[Polynomial], z: &Polynomial, zeta: Fr) -> Result<[Fr; 6]> {
        let store = &self.key.polynomial_store;
        let zeta_omega = zeta * self.key.small_domain.omega;
        let evals = [
            wires[0].evaluate(&zeta),
            wires[1].evaluate(&zeta),
            wires[2].evaluate(&zeta),
            evaluate_coeffs(store.get("sigma_1")?, &zeta),
            evaluate_coeffs(store.get("sigma_2")?, &zeta),
            z.evaluate(&zeta_omega),
        ];
        for (label, value) in EVALUATION_LABELS.iter().zip(&evals) {
            self.transcript.send_to_verifier(label, value);
        }
        Ok(evals)
    }

    /// Linearize at ζ, batch the openings with powers of v, and commit to
    /// the two KZG witnesses.
    fn round5(
        &mut self,
        wires: &[Polynomial],
        z: &Polynomial,
        quotient: &[Vec<Fr>; 3],
        evals: &[Fr; 6],
        challenges: &Challenges,
    ) -> Result<()> {
        let key = self.key;
        let n = key.circuit_size;
        let store = &key.polynomial_store;
        let Challenges {
            beta,
            gamma,
            alpha,
            zeta,
            v,
        } = *challenges;
        let [a, b, c, s1, s2, z_omega] = *evals;
        let ks = column_multipliers();
        let monomial = |label: &str| -> Result<Polynomial> { Ok(Polynomial::from_coeffs(store.get(label)?.to_vec())) };

        let zeta_n = zeta.pow(n as u64);
        let z_h_zeta = zeta_n - Fr::one();
        let l1_zeta = key.small_domain.lagrange_eval(0, &zeta);
        let ln_zeta = key.small_domain.lagrange_eval(n - 1, &zeta);
        let d = zeta - key.small_domain.element(n - 1);
        let p1 = (a + beta * ks[0] * zeta + gamma) * (b + beta * ks[1] * zeta + gamma) * (c + beta * ks[2] * zeta + gamma);
        let p2 = (a + beta * s1 + gamma) * (b + beta * s2 + gamma);
        let alpha2 = alpha.square();
        let alpha3 = alpha2 * alpha;

        // r(X) without its constant term; r(ζ) = −r_0 on an honest proof
        let mut r = Polynomial::zero();
        r.add_scaled(&monomial("q_m")?, &(a * b));
        r.add_scaled(&monomial("q_1")?, &a);
        r.add_scaled(&monomial("q_2")?, &b);
        r.add_scaled(&monomial("q_3")?, &c);
        r.add_scaled(&monomial("q_c")?, &Fr::one());
        r.add_scaled(z, &(alpha * d * p1 + alpha2 * l1_zeta + alpha3 * ln_zeta));
        r.add_scaled(&monomial("sigma_3")?, &(-(alpha * d * z_omega * p2 * beta)));
        let mut t_scale = -z_h_zeta;
        for part in quotient {
            r.add_scaled(&Polynomial::from_coeffs(part.clone()), &t_scale);
            t_scale *= zeta_n;
        }

        let mut batched = r;
        let mut v_power = v;
        let opened = [
            wires[0].clone(),
            wires[1].clone(),
            wires[2].clone(),
            monomial("sigma_1")?,
            monomial("sigma_2")?,
        ];
        for poly in &opened {
            batched.add_scaled(poly, &v_power);
            v_power *= v;
        }

        let w_zeta = batched.opening_quotient(&zeta);
        let w_zeta_omega = z.opening_quotient(&(zeta * key.small_domain.omega));
        self.queue.add_commitment(w_zeta.coeffs, "PI_Z");
        self.queue.add_commitment(w_zeta_omega.coeffs, "PI_Z_OMEGA");
        self.queue.process_queue(&mut self.transcript);
        debug!("round 5: opening proofs committed");
        Ok(())
    }

    fn read_proof(&self, evals: &[Fr; 6]) -> Result<Proof> {
        let commitment = |label: &str| {
            self.transcript
                .get_commitment(label)
                .with_context(|| format!("transcript has no commitment {label}"))
        };
        Ok(Proof {
            a_comm: commitment(WIRE_LABELS[0])?,
            b_comm: commitment(WIRE_LABELS[1])?,
            c_comm: commitment(WIRE_LABELS[2])?,
            z_comm: commitment("Z_PERM")?,
            t_lo_comm: commitment(QUOTIENT_LABELS[0])?,
            t_mid_comm: commitment(QUOTIENT_LABELS[1])?,
            t_hi_comm: commitment(QUOTIENT_LABELS[2])?,
            a_eval: evals[0],
            b_eval: evals[1],
            c_eval: evals[2],
            s_sigma1_eval: evals[3],
            s_sigma2_eval: evals[4],
            z_omega_eval: evals[5],
            w_zeta_comm: commitment("PI_Z")?,
            w_zeta_omega_comm: commitment("PI_Z_OMEGA")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{AddTriple, CircuitConstructor};
    use crate::plonk::StandardPlonkComposer;
    use crate::proof_system::Composer;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_grand_product_ends_at_delta() {
        let mut composer = StandardPlonkComposer::default();
        let circuit = composer.circuit_mut();
        let a = circuit.add_variable(Fr::from_u64(3));
        let b = circuit.add_variable(Fr::from_u64(4));
        let c = circuit.add_public_variable(Fr::from_u64(7));
        let d = circuit.add_public_variable(Fr::from_u64(14));
        circuit.create_add_gate(&AddTriple {
            a,
            b,
            c,
            a_scaling: Fr::one(),
            b_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
        circuit.create_add_gate(&AddTriple {
            a: c,
            b: c,
            c: d,
            a_scaling: Fr::one(),
            b_scaling: Fr::one(),
            c_scaling: -Fr::one(),
            const_scaling: Fr::zero(),
        });
        composer.compute_witness().unwrap();
        let key = composer.compute_proving_key().unwrap();
        let store = &key.polynomial_store;

        let mut rng = ChaCha20Rng::seed_from_u64(12345);
        let beta = Fr::random(&mut rng);
        let gamma = Fr::random(&mut rng);
        let ks = column_multipliers();
        let mut product = Fr::one();
        for (j, k) in ks.iter().enumerate() {
            let wire = store.get(&format!("w_{}_lagrange", j + 1)).unwrap();
            let sigma = store.get(&format!("sigma_{}_lagrange", j + 1)).unwrap();
            for (i, root) in key.small_domain.elements().enumerate() {
                product *= (wire[i] + beta * *k * root + gamma) * (wire[i] + beta * sigma[i] + gamma).invert();
            }
        }

        let public_inputs = [Fr::from_u64(7), Fr::from_u64(14)];
        let delta = compute_public_input_delta(&public_inputs, &beta, &gamma, &key.small_domain.omega);
        assert_eq!(product, delta);
        assert_ne!(delta, Fr::one());
    }

    #[test]
    fn test_rejects_tiny_domain() {
        let mut composer = StandardPlonkComposer::new(crate::config::ComposerConfig {
            min_circuit_size: 2,
            ..Default::default()
        });
        let x = composer.circuit_mut().add_variable(Fr::one());
        composer.circuit_mut().create_bool_gate(x);
        composer.compute_witness().unwrap();
        let key = composer.compute_proving_key().unwrap().clone();
        let srs = Srs::from_tau(&Fr::from_u64(5), 16);
        assert!(key.circuit_size < MIN_PROVING_SIZE);
        assert!(Prover::new(&key, &srs, "plonk-composer-v1").is_err());
    }
}
