use anyhow::Result;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::cipher::{Decryption, decrypt};
use crate::circuit::{Circuit, Gate, WireId};
use crate::constants::PROGRESS_UPDATE_INTERVAL;
use crate::error::EvaluationError;
use crate::garbler::GarbledTable;
use crate::keys::WireKey;
use crate::progress::gate_progress_bar;
use crate::wire_analyzer::{SATURATED_USAGE, analyze_wire_usage};

/// Output keys produced by evaluation, in output order
///
/// Only the garbler's decoding info can turn these back into bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedOutputs {
    /// Output wire ids, in output order
    pub wires: Vec<WireId>,
    /// Resolved key of each output wire
    pub keys: Vec<WireKey>,
}

impl EvaluatedOutputs {
    /// Save evaluation result as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load evaluation result from JSON
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Resolve the output key of one gate by trial decryption
///
/// Every entry is tried so that a table with more than one opening entry is
/// detected instead of silently taking the first.
pub fn evaluate_gate(
    gate: &Gate,
    left: &WireKey,
    right: &WireKey,
    table: &GarbledTable,
) -> Result<WireKey, EvaluationError> {
    let mut resolved = None;
    let mut matches = 0usize;
    for ciphertext in &table.ciphertexts {
        if let Decryption::Matched(key) = decrypt(left, right, gate.id, ciphertext) {
            matches += 1;
            resolved.get_or_insert(key);
        }
    }

    match (resolved, matches) {
        (Some(key), 1) => Ok(key),
        (None, _) => {
            tracing::warn!(gate = gate.id, "no garbled table entry opened");
            Err(EvaluationError::NoMatchingEntry { gate: gate.id })
        }
        (Some(_), matches) => {
            tracing::warn!(gate = gate.id, matches, "several garbled table entries opened");
            Err(EvaluationError::AmbiguousEntries {
                gate: gate.id,
                matches,
            })
        }
    }
}

/// Evaluate a garbled circuit
///
/// Gates are processed in ascending id order; only keys that a later gate (or the
/// output) still needs are kept.
///
/// # Arguments
/// * `circuit` - The circuit topology shared by both parties
/// * `tables` - One garbled table per gate, in gate order
/// * `input_keys` - One key per input wire, wire 1 first
///
/// # Returns
/// * `Ok(EvaluatedOutputs)` - Keys of the output wires
/// * `Err(EvaluationError)` - Shape mismatch or a gate without exactly one opening entry
pub fn evaluate_circuit(
    circuit: &Circuit,
    tables: &[GarbledTable],
    input_keys: &[WireKey],
) -> Result<EvaluatedOutputs, EvaluationError> {
    evaluate_circuit_with_progress(circuit, tables, input_keys, &ProgressBar::hidden())
}

/// [`evaluate_circuit`] reporting per-gate progress on `pb`
pub fn evaluate_circuit_with_progress(
    circuit: &Circuit,
    tables: &[GarbledTable],
    input_keys: &[WireKey],
    pb: &ProgressBar,
) -> Result<EvaluatedOutputs, EvaluationError> {
    circuit.validate()?;
    if input_keys.len() != circuit.num_inputs() {
        return Err(EvaluationError::InputCountMismatch {
            expected: circuit.num_inputs(),
            found: input_keys.len(),
        });
    }
    if tables.len() != circuit.num_gates() {
        return Err(EvaluationError::TableCountMismatch {
            expected: circuit.num_gates(),
            found: tables.len(),
        });
    }

    let report = analyze_wire_usage(circuit);
    let mut remaining_usage = report.wire_usage_counts;

    let mut active_keys: HashMap<WireId, WireKey> = (1..)
        .zip(input_keys.iter().copied())
        .collect();
    let mut peak_active = active_keys.len();

    for (index, (gate, table)) in circuit.gates().iter().zip(tables).enumerate() {
        let resolve = |wire: WireId| {
            active_keys
                .get(&wire)
                .copied()
                .ok_or(EvaluationError::MissingWireKey {
                    gate: gate.id,
                    wire,
                })
        };
        let left = resolve(gate.left)?;
        let right = resolve(gate.right)?;

        let output = evaluate_gate(gate, &left, &right, table)?;
        active_keys.insert(gate.id, output);
        tracing::trace!(gate = gate.id, "resolved gate key");

        // Release input keys once their last consumer has run.
        for wire in [gate.left, gate.right] {
            let usage = &mut remaining_usage[wire as usize - 1];
            if *usage == SATURATED_USAGE || *usage == 0 {
                continue;
            }
            *usage -= 1;
            if *usage == 0 && !circuit.is_output(wire) {
                active_keys.remove(&wire);
            }
        }
        peak_active = peak_active.max(active_keys.len());

        if (index as u32 + 1).is_multiple_of(PROGRESS_UPDATE_INTERVAL) {
            pb.set_position(index as u64 + 1);
            pb.set_message(format!("Evaluating... {} active keys", active_keys.len()));
        }
    }
    pb.set_position(circuit.num_gates() as u64);
    pb.finish_with_message(format!("✓ Evaluated {} gates", circuit.num_gates()));

    let wires: Vec<WireId> = circuit.output_wires().collect();
    let keys = wires
        .iter()
        .map(|&wire| {
            active_keys
                .get(&wire)
                .copied()
                .ok_or(EvaluationError::MissingWireKey { gate: wire, wire })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        gates = circuit.num_gates(),
        outputs = keys.len(),
        peak_active,
        "evaluated garbled circuit"
    );

    Ok(EvaluatedOutputs { wires, keys })
}

/// Evaluate with progress shown on the terminal
pub fn evaluate_circuit_verbose(
    circuit: &Circuit,
    tables: &[GarbledTable],
    input_keys: &[WireKey],
) -> Result<EvaluatedOutputs, EvaluationError> {
    let pb = gate_progress_bar(circuit.num_gates(), "Evaluating circuit...");
    evaluate_circuit_with_progress(circuit, tables, input_keys, &pb)
}
