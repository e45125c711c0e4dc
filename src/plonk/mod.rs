//! PLONK proving over the standard arithmetization
//!
//! - [`composer`]: standard and ultra composers (circuit → keys)
//! - [`prover`] / [`verifier`]: the five-round protocol with KZG openings
//! - [`types`]: verification key and proof

pub mod composer;
pub mod prover;
pub mod types;
pub mod verifier;

pub use composer::{StandardPlonkComposer, UltraComposer};
pub use prover::Prover;
pub use types::{Proof, VerificationKey};
pub use verifier::Verifier;
