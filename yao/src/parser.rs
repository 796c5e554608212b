use anyhow::{Result, anyhow, bail};
use std::io::Read;
use std::path::Path;

use crate::circuit::{BooleanFunction, Circuit, CircuitBuilder, WireId};
use crate::stream::BufferedLineStream;

/// Header of a circuit description: `<num_inputs> <num_gates> <num_outputs>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitHeader {
    /// Number of input wires
    pub num_inputs: usize,
    /// Number of gate lines that follow
    pub num_gates: usize,
    /// Number of outputs (the last gates)
    pub num_outputs: usize,
}

/// One gate line: `<gate_id> <left_wire> <right_wire> <FUNCTION_TAG>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateRecord<'a> {
    /// Gate id, equal to its output wire id
    pub id: WireId,
    /// Left input wire
    pub left: WireId,
    /// Right input wire
    pub right: WireId,
    /// Unparsed function tag
    pub tag: &'a str,
}

/// Parse the header line of a circuit description
pub fn parse_header(line: &str) -> Result<CircuitHeader> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 3 {
        bail!(
            "Invalid header: expected '<num_inputs> <num_gates> <num_outputs>', got: '{}'",
            line
        );
    }

    let field = |index: usize, name: &str| -> Result<usize> {
        tokens[index]
            .parse()
            .map_err(|_| anyhow!("Invalid {}: '{}'", name, tokens[index]))
    };

    Ok(CircuitHeader {
        num_inputs: field(0, "num_inputs")?,
        num_gates: field(1, "num_gates")?,
        num_outputs: field(2, "num_outputs")?,
    })
}

/// Parse a single gate line into its wire ids and function tag
pub fn parse_gate_line(line: &str) -> Result<GateRecord<'_>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 4 {
        bail!(
            "Invalid gate line: expected '<gate_id> <left> <right> <FUNCTION>', got: '{}'",
            line
        );
    }

    let wire = |index: usize, name: &str| -> Result<WireId> {
        tokens[index]
            .parse()
            .map_err(|_| anyhow!("Invalid {} wire ID: '{}'", name, tokens[index]))
    };

    Ok(GateRecord {
        id: wire(0, "gate")?,
        left: wire(1, "left")?,
        right: wire(2, "right")?,
        tag: tokens[3],
    })
}

/// Parse and validate a circuit description
///
/// Expected format:
/// First line: `<num_inputs> <num_gates> <num_outputs>`
/// Followed by one `<gate_id> <left> <right> <FUNCTION>` line per gate.
/// Blank lines and lines starting with `#` are ignored.
///
/// # Returns
/// * `Ok(Circuit)` - A validated, topologically ordered circuit
/// * `Err(anyhow::Error)` - IO error, malformed line, unknown function or invalid circuit
pub fn parse_circuit<R: Read>(stream: &mut BufferedLineStream<R>) -> Result<Circuit> {
    let header_line = stream.next_record().ok_or_else(|| {
        anyhow!("Missing header line - circuit must start with '<num_inputs> <num_gates> <num_outputs>'")
    })??;
    let header = parse_header(header_line)?;

    let mut builder = CircuitBuilder::new(header.num_inputs).outputs(header.num_outputs);
    let mut gates_read = 0usize;

    while let Some(line_result) = stream.next_record() {
        let line = line_result?;
        let parsed = parse_gate_line(line).and_then(|record| {
            let function: BooleanFunction = record.tag.parse()?;
            Ok((record.id, record.left, record.right, function))
        });
        let line_number = stream.line_number();
        let (id, left, right, function) =
            parsed.map_err(|e| anyhow!("Line {}: {}", line_number, e))?;
        builder = builder.gate(id, left, right, function);
        gates_read += 1;
    }

    if gates_read != header.num_gates {
        bail!(
            "Header declares {} gates but {} gate lines were read",
            header.num_gates,
            gates_read
        );
    }

    Ok(builder.build()?)
}

/// Open and parse a circuit description file
pub fn load_circuit<P: AsRef<Path>>(path: P) -> Result<Circuit> {
    let path = path.as_ref();
    let mut stream = BufferedLineStream::open(path)
        .map_err(|e| anyhow!("Cannot open circuit file {}: {}", path.display(), e))?;
    parse_circuit(&mut stream)
}

/// Render a circuit in the textual description format
pub fn format_circuit(circuit: &Circuit) -> String {
    let mut out = format!(
        "{} {} {}\n",
        circuit.num_inputs(),
        circuit.num_gates(),
        circuit.num_outputs()
    );
    for gate in circuit.gates() {
        out.push_str(&format!(
            "{} {} {} {}\n",
            gate.id, gate.left, gate.right, gate.function
        ));
    }
    out
}
