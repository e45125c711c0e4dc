//! Demo: prove knowledge of a and b with a + b = c, c public.
//!
//! Usage: `plonk-composer [a] [b]` (defaults 3 and 4). Composer settings
//! come from `PLONK_*` environment variables; logging from `RUST_LOG`.

use anyhow::{Context, Result};
use plonk_composer::circuit::AddTriple;
use plonk_composer::{CircuitConstructor, Composer, ComposerConfig, Fr, StandardPlonkComposer};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn parse_arg(args: &[String], index: usize, default: u64) -> Result<u64> {
    args.get(index)
        .map(|s| s.parse::<u64>().with_context(|| format!("argument {index} must be an integer, got {s:?}")))
        .transpose()
        .map(|v| v.unwrap_or(default))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let a_value = Fr::from_u64(parse_arg(&args, 1, 3)?);
    let b_value = Fr::from_u64(parse_arg(&args, 2, 4)?);
    let c_value = a_value + b_value;

    let config = ComposerConfig::from_env()?;
    let mut composer = StandardPlonkComposer::new(config);
    let circuit = composer.circuit_mut();
    let a = circuit.add_variable(a_value);
    let b = circuit.add_variable(b_value);
    let c = circuit.add_public_variable(c_value);
    circuit.create_add_gate(&AddTriple {
        a,
        b,
        c,
        a_scaling: Fr::one(),
        b_scaling: Fr::one(),
        c_scaling: -Fr::one(),
        const_scaling: Fr::zero(),
    });
    info!(a = %a_value, b = %b_value, c = %c_value, "circuit built");

    let mut rng = rand::thread_rng();
    let (proof, transcript) = composer.prove_with_transcript(&mut rng)?;
    let verified = composer.verify(&proof, &[c_value])?;
    let tampered = composer.verify(&proof, &[c_value + Fr::one()])?;

    let circuit_size = composer.compute_proving_key()?.circuit_size;
    let summary = json!({
        "public_inputs": [c_value],
        "num_gates": composer.circuit().num_gates(),
        "circuit_size": circuit_size,
        "verified": verified,
        "verified_with_wrong_public_input": tampered,
        "transcript_labels": transcript.labels(),
        "proof": proof,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
