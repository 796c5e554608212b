use anyhow::Result;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::fs::File;

use yao::circuit::{BooleanFunction, Circuit};
use yao::counter::count_gate_functions;
use yao::encoding::{DecodingInfo, EncodingInfo};
use yao::error::{EvaluationError, ProtocolError};
use yao::evaluator::evaluate_circuit;
use yao::garbler::{garble_circuit, load_tables};
use yao::ot::{IdealOt, simulate_random_choices};
use yao::parser::{format_circuit, load_circuit, parse_circuit};
use yao::protocol::{EvaluatorSession, GarblerSession, run_protocol};
use yao::stream::BufferedLineStream;
use yao::wire_analyzer::analyze_wire_usage;
use yao_integration_tests::blood_compatibility::{
    BLOOD_TYPES, COMPATIBILITY_TABLE, blood_compatibility_circuit, to_bits,
};
use yao_integration_tests::init_tracing;
use yao_integration_tests::plain_evaluator::evaluate_plain_circuit;

// Fixed seed for reproducible tests
const TEST_SEED: [u8; 32] = [42; 32];

const AND_CIRCUIT: &str = "../example_ckts/and.circuit";
const AND_OR_CIRCUIT: &str = "../example_ckts/and_or.circuit";
const BLOOD_CIRCUIT: &str = "../example_ckts/blood_compatibility.circuit";

/// Expand `value` into `width` bits, most significant first
fn bits_of(value: u32, width: usize) -> Vec<u8> {
    (0..width)
        .rev()
        .map(|shift| ((value >> shift) & 1) as u8)
        .collect()
}

/// Plain evaluation of a circuit file through the independent line evaluator
fn plain_outputs(path: &str, garbler_bits: &[u8], evaluator_bits: &[u8]) -> Result<Vec<bool>> {
    let inputs: Vec<bool> = garbler_bits
        .iter()
        .chain(evaluator_bits)
        .map(|&bit| bit == 1)
        .collect();
    let mut stream = BufferedLineStream::new(File::open(path)?);
    Ok(evaluate_plain_circuit(&mut stream, &inputs)?.outputs)
}

/// Run every input combination through the protocol and compare with plain evaluation
fn check_all_inputs(path: &str, garbler_inputs: usize) -> Result<()> {
    let circuit = load_circuit(path)?;
    let evaluator_inputs = circuit.num_inputs() - garbler_inputs;
    let mut rng = ChaCha12Rng::from_seed(TEST_SEED);

    for g in 0..1u32 << garbler_inputs {
        for e in 0..1u32 << evaluator_inputs {
            let garbler_bits = bits_of(g, garbler_inputs);
            let evaluator_bits = bits_of(e, evaluator_inputs);
            let mut ot = IdealOt::new();

            let garbled = run_protocol(&circuit, &garbler_bits, &evaluator_bits, &mut ot, &mut rng)?;
            let plain = plain_outputs(path, &garbler_bits, &evaluator_bits)?;

            assert_eq!(
                garbled, plain,
                "{path}: garbler {garbler_bits:?} evaluator {evaluator_bits:?}"
            );
            assert_eq!(ot.transfers(), evaluator_inputs);
        }
    }
    Ok(())
}

#[test]
fn test_single_and_gate() -> Result<()> {
    let _guard = init_tracing();
    check_all_inputs(AND_CIRCUIT, 1)
}

#[test]
fn test_and_or_circuit() -> Result<()> {
    let _guard = init_tracing();
    check_all_inputs(AND_OR_CIRCUIT, 2)?;

    let circuit = load_circuit(AND_OR_CIRCUIT)?;
    let mut rng = ChaCha12Rng::from_seed(TEST_SEED);
    let out = run_protocol(&circuit, &[1, 0], &[1], &mut IdealOt::new(), &mut rng)?;
    assert_eq!(out, vec![true]);
    Ok(())
}

#[test]
fn test_blood_compatibility_all_pairs() -> Result<()> {
    let _guard = init_tracing();
    let circuit = load_circuit(BLOOD_CIRCUIT)?;
    assert_eq!(circuit, blood_compatibility_circuit()?);

    let mut rng = ChaCha12Rng::from_seed(TEST_SEED);
    for receiver in 0..8u8 {
        for donor in 0..8u8 {
            let out = run_protocol(
                &circuit,
                &to_bits(receiver),
                &to_bits(donor),
                &mut IdealOt::new(),
                &mut rng,
            )?;
            assert_eq!(
                out,
                vec![COMPATIBILITY_TABLE[receiver as usize][donor as usize] == 1],
                "receiver {} donor {}",
                BLOOD_TYPES[receiver as usize],
                BLOOD_TYPES[donor as usize]
            );
        }
    }
    Ok(())
}

/// Random layered circuit in the text format, using all sixteen functions
fn random_circuit_text(rng: &mut impl Rng, num_inputs: u32, num_gates: u32) -> String {
    let num_outputs = rng.random_range(1..=num_gates.min(4));
    let mut text = format!("{num_inputs} {num_gates} {num_outputs}\n");
    for id in num_inputs + 1..=num_inputs + num_gates {
        let left = rng.random_range(1..id);
        let right = rng.random_range(1..id);
        let table: u8 = rng.random_range(0..16);
        let tag = if rng.random_bool(0.5) {
            BooleanFunction::from_rows(
                table & 1 != 0,
                table & 2 != 0,
                table & 4 != 0,
                table & 8 != 0,
            )
            .tag()
            .to_string()
        } else {
            format!("TT{}{}{}{}", table & 1, (table >> 1) & 1, (table >> 2) & 1, (table >> 3) & 1)
        };
        text.push_str(&format!("{id} {left} {right} {tag}\n"));
    }
    text
}

#[test]
fn test_random_circuits_against_plain_evaluator() -> Result<()> {
    let _guard = init_tracing();
    let mut rng = ChaCha12Rng::from_seed(TEST_SEED);

    for _ in 0..25 {
        let num_inputs = rng.random_range(2..=8);
        let num_gates = rng.random_range(1..=40);
        let text = random_circuit_text(&mut rng, num_inputs, num_gates);
        let circuit = parse_circuit(&mut BufferedLineStream::new(text.as_bytes()))?;
        let garbler_inputs = rng.random_range(0..=num_inputs as usize);

        for _ in 0..4 {
            let inputs = bits_of(rng.next_u32(), num_inputs as usize);
            let (garbler_bits, evaluator_bits) = inputs.split_at(garbler_inputs);

            let garbled = run_protocol(
                &circuit,
                garbler_bits,
                evaluator_bits,
                &mut IdealOt::new(),
                &mut rng,
            )?;
            let bools: Vec<bool> = inputs.iter().map(|&bit| bit == 1).collect();
            let plain = evaluate_plain_circuit(&mut BufferedLineStream::new(text.as_bytes()), &bools)?;

            assert_eq!(garbled, plain.outputs, "circuit:\n{text}inputs {inputs:?}");
            assert_eq!(garbled, circuit.evaluate_plain(&bools)?);
        }
    }
    Ok(())
}

#[test]
fn test_file_pipeline() -> Result<()> {
    let _guard = init_tracing();
    let dir = tempfile::tempdir()?;
    let circuit = load_circuit(BLOOD_CIRCUIT)?;
    let mut rng = ChaCha12Rng::from_seed(TEST_SEED);

    let garbled = garble_circuit(&circuit, &mut rng)?;
    let tables_path = dir.path().join("blood.tables");
    let encoding_path = dir.path().join("blood.encoding.json");
    let decoding_path = dir.path().join("blood.decoding.json");
    garbled.save(&tables_path, &encoding_path, &decoding_path)?;

    let tables = load_tables(&tables_path)?;
    let encoding = EncodingInfo::load_json(&encoding_path)?;
    let decoding = DecodingInfo::load_json(&decoding_path)?;

    // A+ receiver, O- donor
    let mut input_keys = encoding.encode_range(0..3, &to_bits(3))?;
    input_keys.extend(encoding.encode_range(3..6, &to_bits(0))?);

    let outputs = evaluate_circuit(&circuit, &tables, &input_keys)?;
    outputs.save_json(dir.path().join("blood.outputs.json"))?;
    assert_eq!(decoding.decode(&outputs.keys)?, vec![true]);
    Ok(())
}

#[test]
fn test_random_evaluator_choices() -> Result<()> {
    let _guard = init_tracing();
    let circuit = load_circuit(AND_OR_CIRCUIT)?;
    let mut rng = ChaCha12Rng::from_seed(TEST_SEED);
    let garbler = GarblerSession::new(circuit.clone(), 1, &mut rng)?;
    let garbler_keys = garbler.encode_own_inputs(&[1])?;

    let mut ot = IdealOt::new();
    let (choices, keys) = simulate_random_choices(&mut ot, garbler.evaluator_input_pairs(), &[7; 32])?;
    assert_eq!(keys.len(), 2);

    let outputs = EvaluatorSession::new(circuit.clone(), garbler.tables().to_vec())
        .receive_inputs(garbler_keys, &mut ot, garbler.evaluator_input_pairs(), &choices)?
        .evaluate()?;

    let inputs = [true, choices[0] == 1, choices[1] == 1];
    assert_eq!(garbler.decode(&outputs)?, circuit.evaluate_plain(&inputs)?);
    Ok(())
}

#[test]
fn test_tampered_table_aborts() -> Result<()> {
    let _guard = init_tracing();
    let circuit = load_circuit(AND_OR_CIRCUIT)?;
    let mut rng = ChaCha12Rng::from_seed(TEST_SEED);
    let mut garbled = garble_circuit(&circuit, &mut rng)?;
    let input_keys = garbled.encoding.encode(&[1, 1, 0])?;

    // Corrupt the padding of every entry of the first gate
    for ciphertext in garbled.tables[0].ciphertexts.iter_mut() {
        let mut bytes = *ciphertext.as_bytes();
        bytes[31] ^= 0x01;
        *ciphertext = yao::cipher::Ciphertext::new(bytes);
    }

    assert_eq!(
        evaluate_circuit(&circuit, &garbled.tables, &input_keys),
        Err(EvaluationError::NoMatchingEntry { gate: 4 })
    );
    Ok(())
}

#[test]
fn test_invalid_inputs_rejected() -> Result<()> {
    let _guard = init_tracing();
    let circuit = load_circuit(AND_CIRCUIT)?;
    let mut rng = ChaCha12Rng::from_seed(TEST_SEED);

    let err = run_protocol(&circuit, &[2], &[1], &mut IdealOt::new(), &mut rng).unwrap_err();
    assert!(matches!(err, ProtocolError::Encode(_)), "{err:?}");

    let err = run_protocol(&circuit, &[1, 1, 1], &[], &mut IdealOt::new(), &mut rng).unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidPartition { .. }), "{err:?}");
    Ok(())
}

#[test]
fn test_malformed_circuits_rejected() {
    let cases = [
        ("", "Missing header"),
        ("2 1 1\n3 1 2 MAJ\n", "unknown gate function"),
        ("2 1 1\n3 1 3 AND\n", "wire"),
        ("2 2 3\n3 1 2 AND\n4 3 1 OR\n", "output"),
        ("2 1 1\n4 1 2 AND\n", "4"),
    ];
    for (text, needle) in cases {
        let err = parse_circuit(&mut BufferedLineStream::new(text.as_bytes())).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(needle), "{text:?}: {message}");
    }
}

#[test]
fn test_example_circuit_statistics() -> Result<()> {
    let mut stream = BufferedLineStream::new(File::open(BLOOD_CIRCUIT)?);
    let counts = count_gate_functions(&mut stream)?;
    assert_eq!(counts.get("A_OR_NOT_B"), Some(&3));
    assert_eq!(counts.get("AND"), Some(&2));

    let report = analyze_wire_usage(&load_circuit(BLOOD_CIRCUIT)?);
    assert_eq!(report.unused_inputs, 0);
    assert_eq!(report.dead_gates, 0);
    assert_eq!(report.primary_output_wires, vec![11]);
    Ok(())
}

#[test]
fn test_format_matches_example_file() -> Result<()> {
    let circuit: Circuit = blood_compatibility_circuit()?;
    let text = format_circuit(&circuit);
    let reparsed = parse_circuit(&mut BufferedLineStream::new(text.as_bytes()))?;
    assert_eq!(reparsed, load_circuit(BLOOD_CIRCUIT)?);
    Ok(())
}
