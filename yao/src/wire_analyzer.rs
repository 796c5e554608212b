use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::circuit::{Circuit, WireId};

/// Fan-out value meaning "used 255 times or more"; such wires are held for the whole evaluation
pub const SATURATED_USAGE: u8 = u8::MAX;

/// Wire usage analysis results.
/// Can be exported as binary for fast loading and summarized as JSON for human readable reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct WireUsageReport {
    /// Total number of wires in the circuit (`n + q`)
    pub total_wires: u32,
    /// Number of primary input wires
    pub primary_inputs: u32,
    /// Number of gate wires that are neither outputs nor dead
    pub intermediate_wires: u32,
    /// Number of primary output wires
    pub primary_outputs: u32,
    /// Input wires that no gate reads
    pub unused_inputs: u32,
    /// Gates whose result is neither read nor a circuit output
    pub dead_gates: u32,
    /// Fan-out per wire: index = wire_id - 1, capped at 255.
    /// A wire read 255 times or more is never released during evaluation.
    pub wire_usage_counts: Vec<u8>,
    /// List of primary output wire IDs
    pub primary_output_wires: Vec<WireId>,
}

impl WireUsageReport {
    /// Fan-out of `wire`, or 0 for unknown wires
    pub fn usage(&self, wire: WireId) -> u8 {
        (wire as usize)
            .checked_sub(1)
            .and_then(|index| self.wire_usage_counts.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Save the report to a binary file for fast loading
    pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = bincode::encode_to_vec(self, bincode::config::standard())?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    /// Load a report from a binary file
    pub fn load_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buffer = std::fs::read(path)?;
        let (report, _) = bincode::decode_from_slice(&buffer, bincode::config::standard())?;
        Ok(report)
    }

    /// Export summary as JSON for human inspection
    pub fn export_summary_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let summary = serde_json::json!({
            "total_wires": self.total_wires,
            "primary_inputs": self.primary_inputs,
            "intermediate_wires": self.intermediate_wires,
            "primary_outputs": self.primary_outputs,
            "unused_inputs": self.unused_inputs,
            "dead_gates": self.dead_gates,
            "primary_output_wires": self.primary_output_wires
        });

        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;
        Ok(())
    }
}

// Validation bounds every count of a circuit by u32::MAX.
fn saturating_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Analyze wire usage of a validated circuit
pub fn analyze_wire_usage(circuit: &Circuit) -> WireUsageReport {
    let mut wire_usage_counts = vec![0u8; circuit.num_wires()];
    for gate in circuit.gates() {
        for wire in [gate.left, gate.right] {
            let count = &mut wire_usage_counts[wire as usize - 1];
            *count = count.saturating_add(1);
        }
    }

    let num_inputs = circuit.num_inputs();
    let unused_inputs = wire_usage_counts[..num_inputs]
        .iter()
        .filter(|&&count| count == 0)
        .count();

    let primary_output_wires: Vec<WireId> = circuit.output_wires().collect();
    let mut intermediate_wires = 0u32;
    let mut dead_gates = 0u32;
    for gate in circuit.gates() {
        if circuit.is_output(gate.id) {
            continue;
        }
        if wire_usage_counts[gate.id as usize - 1] == 0 {
            dead_gates += 1;
        } else {
            intermediate_wires += 1;
        }
    }

    WireUsageReport {
        total_wires: saturating_count(circuit.num_wires()),
        primary_inputs: saturating_count(num_inputs),
        intermediate_wires,
        primary_outputs: saturating_count(primary_output_wires.len()),
        unused_inputs: saturating_count(unused_inputs),
        dead_gates,
        wire_usage_counts,
        primary_output_wires,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{BooleanFunction, CircuitBuilder};

    fn sample() -> Circuit {
        // wire 4 unused input, gate 6 dead, gates 7/8 outputs
        CircuitBuilder::new(4)
            .gate(5, 1, 2, BooleanFunction::AND)
            .gate(6, 1, 3, BooleanFunction::XOR)
            .gate(7, 5, 3, BooleanFunction::OR)
            .gate(8, 5, 5, BooleanFunction::NAND)
            .outputs(2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_analyze_wire_usage_basic() {
        let report = analyze_wire_usage(&sample());
        assert_eq!(report.total_wires, 8);
        assert_eq!(report.primary_inputs, 4);
        assert_eq!(report.primary_outputs, 2);
        assert_eq!(report.primary_output_wires, vec![7, 8]);
        assert_eq!(report.unused_inputs, 1);
        assert_eq!(report.dead_gates, 1);
        assert_eq!(report.intermediate_wires, 1);
        assert_eq!(report.usage(1), 2);
        assert_eq!(report.usage(5), 3);
        assert_eq!(report.usage(4), 0);
        assert_eq!(report.usage(0), 0);
        assert_eq!(report.usage(99), 0);
    }

    #[test]
    fn test_usage_saturates() {
        let mut builder = CircuitBuilder::new(2);
        for id in 3..300u32 {
            builder = builder.gate(id, 1, 2, BooleanFunction::AND);
        }
        let report = analyze_wire_usage(&builder.build().unwrap());
        assert_eq!(report.usage(1), SATURATED_USAGE);
    }

    #[test]
    fn test_binary_round_trip() -> Result<()> {
        let report = analyze_wire_usage(&sample());
        let temp_file = tempfile::NamedTempFile::new()?;
        report.save_binary(temp_file.path())?;
        assert_eq!(WireUsageReport::load_binary(temp_file.path())?, report);
        Ok(())
    }

    #[test]
    fn test_export_summary_json() -> Result<()> {
        let report = analyze_wire_usage(&sample());
        let temp_file = tempfile::NamedTempFile::new()?;
        report.export_summary_json(temp_file.path())?;
        let summary: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(temp_file.path())?)?;
        assert_eq!(summary["dead_gates"], 1);
        assert!(summary.get("wire_usage_counts").is_none());
        Ok(())
    }
}
