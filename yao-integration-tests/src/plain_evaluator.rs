use anyhow::{Result, anyhow, bail};
use std::io::Read;
use yao::stream::BufferedLineStream;

/// Result of plain circuit evaluation
#[derive(Debug, PartialEq, Eq)]
pub struct PlainEvaluationResult {
    /// Values of the last `m` gates, in gate order
    pub outputs: Vec<bool>,
}

/// Compute a named or `TTdddd` gate function directly, without the library's truth tables
fn apply_gate(tag: &str, a: bool, b: bool) -> Option<bool> {
    let value = match tag.to_ascii_uppercase().as_str() {
        "FALSE" => false,
        "TRUE" => true,
        "AND" => a && b,
        "OR" => a || b,
        "XOR" => a != b,
        "NAND" => !(a && b),
        "NOR" => !(a || b),
        "XNOR" => a == b,
        "A" => a,
        "B" => b,
        "NOT_A" => !a,
        "NOT_B" => !b,
        "A_AND_NOT_B" => a && !b,
        "NOT_A_AND_B" => !a && b,
        "A_OR_NOT_B" => a || !b,
        "NOT_A_OR_B" => !a || b,
        other => {
            let rows = other.strip_prefix("TT")?.as_bytes();
            if rows.len() != 4 {
                return None;
            }
            match rows[(a as usize) * 2 + b as usize] {
                b'0' => false,
                b'1' => true,
                _ => return None,
            }
        }
    };
    Some(value)
}

/// Evaluate a circuit description in plain (ungarbled) form
///
/// This walks the text line by line and computes each gate directly on bit values,
/// providing ground truth for comparing against garbled circuit evaluation. Only
/// the structural checks needed to evaluate are made here.
///
/// # Arguments
/// * `stream` - The line stream over the circuit description
/// * `inputs` - Values of input wires `1..=n`
///
/// # Returns
/// * `Ok(PlainEvaluationResult)` - Values of the output wires
/// * `Err(anyhow::Error)` - Parse error or evaluation error
pub fn evaluate_plain_circuit<R: Read>(
    stream: &mut BufferedLineStream<R>,
    inputs: &[bool],
) -> Result<PlainEvaluationResult> {
    let header_line = stream
        .next_record()
        .ok_or_else(|| anyhow!("Missing header line"))??;
    let header: Vec<usize> = header_line
        .split_whitespace()
        .map(|token| token.parse())
        .collect::<Result<_, _>>()
        .map_err(|_| anyhow!("Invalid header: '{}'", header_line))?;
    let [num_inputs, num_gates, num_outputs] = header[..] else {
        bail!("Invalid header: '{}'", header_line);
    };

    if inputs.len() != num_inputs {
        bail!("Expected {} input bits, got {}", num_inputs, inputs.len());
    }
    if num_outputs == 0 || num_outputs > num_gates {
        bail!("Invalid output count {} for {} gates", num_outputs, num_gates);
    }

    // Index 0 is unused so that wire ids index directly
    let mut wire_values: Vec<Option<bool>> = vec![None; num_inputs + num_gates + 1];
    for (index, &bit) in inputs.iter().enumerate() {
        wire_values[index + 1] = Some(bit);
    }

    let mut gates_read = 0usize;
    while let Some(line_result) = stream.next_record() {
        let line = line_result?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [id, left, right, tag] = tokens[..] else {
            bail!("Invalid gate line: '{}'", line);
        };
        let id: usize = id.parse()?;
        let left: usize = left.parse()?;
        let right: usize = right.parse()?;

        if id == 0 || id >= wire_values.len() {
            bail!("Gate id {} out of range", id);
        }
        let value = |wire: usize| -> Result<bool> {
            if wire >= id {
                bail!("Gate {} reads wire {} before it is computed", id, wire);
            }
            wire_values
                .get(wire)
                .copied()
                .flatten()
                .ok_or_else(|| anyhow!("Gate {} reads undefined wire {}", id, wire))
        };
        let a = value(left)?;
        let b = value(right)?;
        let out = apply_gate(tag, a, b).ok_or_else(|| anyhow!("Unknown gate function '{}'", tag))?;
        wire_values[id] = Some(out);
        gates_read += 1;
    }

    if gates_read != num_gates {
        bail!("Header declares {} gates but {} were read", num_gates, gates_read);
    }

    let first_output = num_inputs + num_gates - num_outputs + 1;
    let outputs: Vec<bool> = (first_output..=num_inputs + num_gates)
        .map(|wire| wire_values[wire].ok_or_else(|| anyhow!("Output wire {} was never computed", wire)))
        .collect::<Result<_>>()?;

    Ok(PlainEvaluationResult { outputs })
}
