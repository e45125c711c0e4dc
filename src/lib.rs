//! PLONK circuit composers over BN254
//!
//! Circuits are built gate by gate, compiled into proving and verification
//! keys, and proven with KZG commitments.
//!
//! # Modules
//! - `field`: Montgomery arithmetic for the BN254 scalar and base fields
//! - `curve`: G1/G2 group operations and the pairing check
//! - `polynomial`, `fft`: coefficient arithmetic and radix-2 transforms
//! - `kzg`: structured reference string, commitments and openings
//! - `transcript`: Fiat-Shamir transcript
//! - `circuit`: standard (width 3) and ultra (width 4) circuit constructors
//! - `proof_system`: permutation mapping, polynomial store, work queue
//! - `plonk`: standard/ultra composers, prover and verifier
//! - `honk`: standard Honk composer
//! - `config`: composer configuration

pub mod circuit;
pub mod config;
pub mod curve;
pub mod fft;
pub mod field;
pub mod honk;
pub mod kzg;
pub mod plonk;
pub mod polynomial;
pub mod proof_system;
pub mod transcript;

/// Re-export commonly used types
pub use circuit::{CircuitConstructor, StandardCircuitConstructor, UltraCircuitConstructor};
pub use config::ComposerConfig;
pub use curve::{G1Affine, G1Projective, G2Affine, G2Projective};
pub use field::{Fq, Fr};
pub use kzg::{CommitmentEngine, Srs};
pub use plonk::{Proof, StandardPlonkComposer, UltraComposer, VerificationKey};
pub use polynomial::Polynomial;
pub use proof_system::{Composer, ProvingKey};
