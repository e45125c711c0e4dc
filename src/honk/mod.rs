//! Honk-style composers: integer permutation labels, Lagrange-form keys

pub mod composer;

pub use composer::{compute_permutation_grand_product, compute_public_input_delta, StandardHonkComposer};
