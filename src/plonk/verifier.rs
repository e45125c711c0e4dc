//! PLONK Verifier
//!
//! 1. Replay the transcript to recover β, γ, α, ζ, v, u
//! 2. Evaluate Z_H(ζ), L_1(ζ), L_n(ζ) and the public-input factor Δ
//! 3. Build the linearization commitment [r] from the verification key
//! 4. One batched pairing check for both openings

use anyhow::{bail, Result};
use tracing::{debug, warn};

use super::prover::{column_multipliers, start_transcript, EVALUATION_LABELS, QUOTIENT_LABELS, WIRE_LABELS};
use super::types::{compute_public_input_delta, Proof, VerificationKey};
use crate::config::ComposerConfig;
use crate::curve::{pairing_check, G1Affine, G1Projective};
use crate::field::Fr;
use crate::kzg::Srs;

/// The PLONK verifier
pub struct Verifier<'a> {
    vk: &'a VerificationKey,
    /// Only [1]_2 and [τ]_2 are used.
    srs: &'a Srs,
    transcript_label: String,
}

impl<'a> Verifier<'a> {
    pub fn new(vk: &'a VerificationKey, srs: &'a Srs) -> Self {
        Verifier {
            vk,
            srs,
            transcript_label: ComposerConfig::default().transcript_label,
        }
    }

    /// Domain separator; must match the prover's.
    pub fn with_transcript_label(mut self, label: impl Into<String>) -> Self {
        self.transcript_label = label.into();
        self
    }

    pub fn verify(&self, proof: &Proof, public_inputs: &[Fr]) -> bool {
        match self.check(proof, public_inputs) {
            Ok(accepted) => {
                debug!(accepted, "proof verified");
                accepted
            }
            Err(err) => {
                warn!(%err, "proof rejected");
                false
            }
        }
    }

    fn check(&self, proof: &Proof, public_inputs: &[Fr]) -> Result<bool> {
        let vk = self.vk;
        let n = vk.circuit_size;
        let omega = vk.omega;
        if public_inputs.len() != vk.num_public_inputs {
            bail!(
                "expected {} public inputs, got {}",
                vk.num_public_inputs,
                public_inputs.len()
            );
        }

        // Step 1: transcript
        let mut transcript = start_transcript(&self.transcript_label, n, public_inputs);
        for (label, comm) in WIRE_LABELS.iter().zip([&proof.a_comm, &proof.b_comm, &proof.c_comm]) {
            transcript.send_to_verifier(label, comm);
        }
        let beta = transcript.squeeze_challenge("beta");
        let gamma = transcript.squeeze_challenge("gamma");

        transcript.send_to_verifier("Z_PERM", &proof.z_comm);
        let alpha = transcript.squeeze_challenge("alpha");

        for (label, comm) in QUOTIENT_LABELS
            .iter()
            .zip([&proof.t_lo_comm, &proof.t_mid_comm, &proof.t_hi_comm])
        {
            transcript.send_to_verifier(label, comm);
        }
        let zeta = transcript.squeeze_challenge_outside_domain("zeta", n);

        let evals = [
            proof.a_eval,
            proof.b_eval,
            proof.c_eval,
            proof.s_sigma1_eval,
            proof.s_sigma2_eval,
            proof.z_omega_eval,
        ];
        for (label, value) in EVALUATION_LABELS.iter().zip(&evals) {
            transcript.send_to_verifier(label, value);
        }
        let v = transcript.squeeze_challenge("v");

        transcript.send_to_verifier("PI_Z", &proof.w_zeta_comm);
        transcript.send_to_verifier("PI_Z_OMEGA", &proof.w_zeta_omega_comm);
        let u = transcript.squeeze_challenge("u");

        // Step 2: public evaluations at ζ
        let n_fr = Fr::from_u64(n as u64);
        let zeta_n = zeta.pow(n as u64);
        let z_h_zeta = zeta_n - Fr::one();
        let omega_last = omega.pow((n - 1) as u64);
        // ζ is outside H, so neither denominator vanishes
        let l1_zeta = z_h_zeta * (n_fr * (zeta - Fr::one())).invert();
        let ln_zeta = omega_last * z_h_zeta * (n_fr * (zeta - omega_last)).invert();
        let delta = compute_public_input_delta(public_inputs, &beta, &gamma, &omega);

        // Step 3: linearization commitment
        let [a_bar, b_bar, c_bar, s1_bar, s2_bar, z_bar_omega] = evals;
        let ks = column_multipliers();
        let alpha2 = alpha.square();
        let alpha3 = alpha2 * alpha;
        let d = zeta - omega_last;
        let p1 = (a_bar + beta * ks[0] * zeta + gamma)
            * (b_bar + beta * ks[1] * zeta + gamma)
            * (c_bar + beta * ks[2] * zeta + gamma);
        let p2 = (a_bar + beta * s1_bar + gamma) * (b_bar + beta * s2_bar + gamma);

        let point = |label: &str| -> Result<G1Projective> { Ok(G1Projective::from(vk.commitment(label)?)) };
        let mut r_comm = point("Q_M")? * (a_bar * b_bar)
            + point("Q_1")? * a_bar
            + point("Q_2")? * b_bar
            + point("Q_3")? * c_bar
            + point("Q_C")?;
        r_comm = r_comm + G1Projective::from(proof.z_comm) * (alpha * d * p1 + alpha2 * l1_zeta + alpha3 * ln_zeta);
        r_comm = r_comm - point("SIGMA_3")? * (alpha * d * z_bar_omega * p2 * beta);
        let t_coeff = -z_h_zeta;
        r_comm = r_comm
            + G1Projective::from(proof.t_lo_comm) * t_coeff
            + G1Projective::from(proof.t_mid_comm) * (t_coeff * zeta_n)
            + G1Projective::from(proof.t_hi_comm) * (t_coeff * zeta_n * zeta_n);

        // r₀: the constant part of r(X) the prover leaves out
        let r0 = -(alpha2 * l1_zeta + alpha3 * ln_zeta * delta + alpha * d * z_bar_omega * p2 * (c_bar + gamma));

        // Step 4: batched opening
        // [F] = [r] + v[a] + v²[b] + v³[c] + v⁴[S_σ1] + v⁵[S_σ2] + u[z]
        let v2 = v * v;
        let v3 = v2 * v;
        let v4 = v3 * v;
        let v5 = v4 * v;
        let f_comm = r_comm
            + G1Projective::from(proof.a_comm) * v
            + G1Projective::from(proof.b_comm) * v2
            + G1Projective::from(proof.c_comm) * v3
            + point("SIGMA_1")? * v4
            + point("SIGMA_2")? * v5
            + G1Projective::from(proof.z_comm) * u;

        let e_eval = -r0 + v * a_bar + v2 * b_bar + v3 * c_bar + v4 * s1_bar + v5 * s2_bar + u * z_bar_omega;
        let e_comm = G1Projective::generator() * e_eval;

        // e([W_ζ] + u[W_{ζω}], [τ]_2) = e([F] + ζ[W_ζ] + uζω[W_{ζω}] − [E], [1]_2)
        let w_zeta = G1Projective::from(proof.w_zeta_comm);
        let w_zeta_omega = G1Projective::from(proof.w_zeta_omega_comm);
        let left = G1Affine::from(w_zeta + w_zeta_omega * u);
        let right = G1Affine::from(f_comm + w_zeta * zeta + w_zeta_omega * (u * zeta * omega) - e_comm);

        Ok(pairing_check(&left, &self.srs.g2_tau, &right, &self.srs.g2_generator))
    }
}
