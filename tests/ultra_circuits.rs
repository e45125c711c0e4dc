use plonk_composer::proof_system::permutation::compute_permutation_mapping;
use plonk_composer::{CircuitConstructor, Composer, Fr, Srs, UltraCircuitConstructor, UltraComposer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Range checks, a ROM table and a RAM array in one circuit.
fn mixed_circuit(circuit: &mut UltraCircuitConstructor, rng: &mut ChaCha20Rng) -> Vec<u32> {
    let mut values = Vec::new();
    for bits in [4usize, 6, 10] {
        let x = circuit.add_variable(Fr::from_u64(rng.gen_range(0..(1u64 << bits))));
        circuit.create_range_constraint(x, bits, "range");
        values.push(x);
    }

    let rom = circuit.create_rom_array(4);
    for (i, v) in values.iter().enumerate() {
        circuit.set_rom_element(rom, i, *v);
    }
    let two = circuit.add_variable(Fr::from_u64(2));
    let read = circuit.read_rom_array(rom, two);
    assert_eq!(circuit.get_variable(read), circuit.get_variable(values[2]));

    let ram = circuit.create_ram_array(3);
    let zero = circuit.zero_idx();
    for i in 0..3 {
        circuit.init_ram_element(ram, i, zero);
    }
    let one = circuit.add_variable(Fr::one());
    circuit.write_ram_array(ram, one, values[0]);
    let out = circuit.read_ram_array(ram, one);
    assert_eq!(circuit.get_variable(out), circuit.get_variable(values[0]));
    values
}

#[test]
fn test_mixed_circuit_is_satisfied() {
    let mut rng = ChaCha20Rng::seed_from_u64(12345);
    let mut circuit = UltraCircuitConstructor::new();
    mixed_circuit(&mut circuit, &mut rng);

    let estimate = circuit.estimated_gates();
    assert!(circuit.check_circuit());
    circuit.finalize_circuit();
    assert_eq!(circuit.final_gate_count(), Some(estimate));
    assert!(!circuit.memory_read_records.is_empty());
    assert!(!circuit.memory_write_records.is_empty());
}

#[test]
fn test_out_of_range_value_is_caught_at_check() {
    let mut circuit = UltraCircuitConstructor::new();
    let x = circuit.add_variable(Fr::from_u64(1 << 12));
    circuit.create_range_constraint(x, 12, "x fits in 12 bits");
    // construction does not evaluate the constraint
    assert!(!circuit.failed());
    assert!(!circuit.check_circuit());
}

#[test]
fn test_generalized_permutation_tags_balance() {
    let mut rng = ChaCha20Rng::seed_from_u64(12345);
    let mut circuit = UltraCircuitConstructor::new();
    mixed_circuit(&mut circuit, &mut rng);
    circuit.finalize_circuit();

    let size = (circuit.num_gates() + 4).next_power_of_two();
    let mapping = compute_permutation_mapping(&circuit, size, true).unwrap();
    assert_eq!(mapping.ids.len(), 4);
    let tagged_ids = mapping.ids.iter().flatten().filter(|e| e.is_tag).count();
    let tagged_sigmas = mapping.sigmas.iter().flatten().filter(|e| e.is_tag).count();
    assert_eq!(tagged_ids, tagged_sigmas);
}

#[test]
fn test_ultra_composer_keys() {
    let mut rng = ChaCha20Rng::seed_from_u64(12345);
    let mut composer = UltraComposer::default().with_srs(Srs::from_tau(&Fr::from_u64(99), 600));
    let values = mixed_circuit(composer.circuit_mut(), &mut rng);
    composer.circuit_mut().set_public_input(values[1]);

    let public_value = composer.circuit().get_variable(values[1]);

    composer.compute_witness().unwrap();
    let key = composer.compute_proving_key().unwrap();
    assert!(key.circuit_size.is_power_of_two());
    assert_eq!(key.num_public_inputs, 1);
    for j in 1..=4 {
        assert!(key.polynomial_store.contains(&format!("w_{j}_lagrange")));
        assert!(key.polynomial_store.contains(&format!("sigma_{j}_fft")));
        assert!(key.polynomial_store.contains(&format!("id_{j}")));
    }
    let w_1 = key.polynomial_store.get("w_1_lagrange").unwrap();
    assert_eq!(w_1[0], public_value);

    let vk = composer.compute_verification_key().unwrap();
    assert_eq!(vk.commitments.len(), 9 + 4 + 4);
}
