use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::io::Read;

use crate::circuit::BooleanFunction;
use crate::constants::PROGRESS_UPDATE_INTERVAL;
use crate::parser::{parse_gate_line, parse_header};
use crate::stream::BufferedLineStream;

/// Count gates per function in a circuit description
///
/// Recognised functions are counted under their canonical tag, so `and` and
/// `TT0001` both count as `AND`. Unrecognised tags are counted verbatim; this
/// function does not validate the circuit.
///
/// # Arguments
/// * `stream` - The line stream to process
///
/// # Returns
/// * `Ok(BTreeMap<String, usize>)` - Function tag to count mapping
/// * `Err(anyhow::Error)` - IO error, missing header or malformed gate line
pub fn count_gate_functions<R: Read>(
    stream: &mut BufferedLineStream<R>,
) -> Result<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    let mut gates_seen: u32 = 0;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .map_err(|e| anyhow!("Invalid progress template: {}", e))?,
    );
    pb.set_message("Counting gate functions...");

    let header_line = stream
        .next_record()
        .ok_or_else(|| anyhow!("Missing header line"))??;
    parse_header(header_line)?;

    while let Some(line_result) = stream.next_record() {
        let line = line_result?;
        let tag = parse_gate_line(line)?.tag;
        let key = match tag.parse::<BooleanFunction>() {
            Ok(function) => function.tag().to_string(),
            Err(_) => tag.to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;

        gates_seen += 1;
        if gates_seen.is_multiple_of(PROGRESS_UPDATE_INTERVAL) {
            pb.tick();
            pb.set_message(format!("Counting gate functions... {gates_seen} processed"));
        }
    }

    pb.finish_and_clear();
    tracing::debug!(gates = gates_seen, kinds = counts.len(), "counted gate functions");

    Ok(counts)
}
