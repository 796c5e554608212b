//! Circuit description: wires, gates and their Boolean functions.
//!
//! Input wires are numbered `1..=n`, gates (and their output wires) `n+1..=n+q`,
//! and the last `m` gates are the circuit outputs. Every gate may only read wires
//! with a smaller id, so ascending id order is a topological order.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::CircuitError;

/// Identifier of a wire; a gate shares the id of its output wire
pub type WireId = u32;

/// A two-input Boolean function stored as its 4-row truth table
///
/// Bit `(a << 1) | b` of the table holds `f(a, b)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BooleanFunction(u8);

/// Canonical tags, indexed by truth table
const FUNCTION_TAGS: [&str; 16] = [
    "FALSE",
    "NOR",
    "NOT_A_AND_B",
    "NOT_A",
    "A_AND_NOT_B",
    "NOT_B",
    "XOR",
    "NAND",
    "AND",
    "XNOR",
    "B",
    "NOT_A_OR_B",
    "A",
    "A_OR_NOT_B",
    "OR",
    "TRUE",
];

impl BooleanFunction {
    /// Constant 0
    pub const FALSE: Self = Self::from_rows(false, false, false, false);
    /// `a AND b`
    pub const AND: Self = Self::from_rows(false, false, false, true);
    /// `a AND NOT b`
    pub const A_AND_NOT_B: Self = Self::from_rows(false, false, true, false);
    /// `a`
    pub const A: Self = Self::from_rows(false, false, true, true);
    /// `NOT a AND b`
    pub const NOT_A_AND_B: Self = Self::from_rows(false, true, false, false);
    /// `b`
    pub const B: Self = Self::from_rows(false, true, false, true);
    /// `a XOR b`
    pub const XOR: Self = Self::from_rows(false, true, true, false);
    /// `a OR b`
    pub const OR: Self = Self::from_rows(false, true, true, true);
    /// `NOT (a OR b)`
    pub const NOR: Self = Self::from_rows(true, false, false, false);
    /// `NOT (a XOR b)`
    pub const XNOR: Self = Self::from_rows(true, false, false, true);
    /// `NOT b`
    pub const NOT_B: Self = Self::from_rows(true, false, true, false);
    /// `a OR NOT b`
    pub const A_OR_NOT_B: Self = Self::from_rows(true, false, true, true);
    /// `NOT a`
    pub const NOT_A: Self = Self::from_rows(true, true, false, false);
    /// `NOT a OR b`
    pub const NOT_A_OR_B: Self = Self::from_rows(true, true, false, true);
    /// `NOT (a AND b)`
    pub const NAND: Self = Self::from_rows(true, true, true, false);
    /// Constant 1
    pub const TRUE: Self = Self::from_rows(true, true, true, true);

    /// Build a function from its rows `f(0,0), f(0,1), f(1,0), f(1,1)`
    pub const fn from_rows(f00: bool, f01: bool, f10: bool, f11: bool) -> Self {
        BooleanFunction((f00 as u8) | (f01 as u8) << 1 | (f10 as u8) << 2 | (f11 as u8) << 3)
    }

    /// 4-bit truth table, bit `(a << 1) | b` holding `f(a, b)`
    pub const fn truth_table(&self) -> u8 {
        self.0
    }

    /// Apply the function
    pub const fn apply(&self, a: bool, b: bool) -> bool {
        let row = ((a as u8) << 1) | b as u8;
        (self.0 >> row) & 1 == 1
    }

    /// Canonical tag for this function
    pub fn tag(&self) -> &'static str {
        FUNCTION_TAGS[self.0 as usize]
    }
}

impl fmt::Debug for BooleanFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl fmt::Display for BooleanFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Parses a canonical tag (case-insensitive) or a literal table such as `TT1011`,
/// whose digits are `f(0,0) f(0,1) f(1,0) f(1,1)`.
impl FromStr for BooleanFunction {
    type Err = CircuitError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let upper = tag.trim().to_ascii_uppercase();
        if let Some(index) = FUNCTION_TAGS.iter().position(|name| *name == upper) {
            return Ok(BooleanFunction(index as u8));
        }

        let unknown = || CircuitError::UnknownFunction {
            tag: tag.to_string(),
        };
        let rows = upper.strip_prefix("TT").ok_or_else(unknown)?;
        if rows.len() != 4 {
            return Err(unknown());
        }
        let mut table = 0u8;
        for (row, digit) in rows.chars().enumerate() {
            match digit {
                '0' => {}
                '1' => table |= 1 << row,
                _ => return Err(unknown()),
            }
        }
        Ok(BooleanFunction(table))
    }
}

impl TryFrom<String> for BooleanFunction {
    type Error = CircuitError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

impl From<BooleanFunction> for String {
    fn from(function: BooleanFunction) -> Self {
        function.tag().to_string()
    }
}

/// A two-input gate; `id` is also the id of its output wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// Gate id, equal to its output wire id
    pub id: WireId,
    /// Left input wire
    pub left: WireId,
    /// Right input wire
    pub right: WireId,
    /// Function computed by the gate
    pub function: BooleanFunction,
}

impl Gate {
    /// Create a gate record
    #[must_use]
    pub fn new(id: WireId, left: WireId, right: WireId, function: BooleanFunction) -> Self {
        Gate {
            id,
            left,
            right,
            function,
        }
    }
}

/// Serialized form of a circuit, validated on the way in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitDescription {
    /// Number of input wires
    pub num_inputs: usize,
    /// Number of output wires (the last gates)
    pub num_outputs: usize,
    /// Gate records
    pub gates: Vec<Gate>,
}

/// Collects gate records and produces a validated [`Circuit`]
#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    num_inputs: usize,
    num_outputs: usize,
    gates: Vec<Gate>,
}

impl CircuitBuilder {
    /// Start a circuit with `num_inputs` input wires and a single output
    pub fn new(num_inputs: usize) -> Self {
        CircuitBuilder {
            num_inputs,
            num_outputs: 1,
            gates: Vec::new(),
        }
    }

    /// Add a gate
    pub fn gate(mut self, id: WireId, left: WireId, right: WireId, function: BooleanFunction) -> Self {
        self.gates.push(Gate::new(id, left, right, function));
        self
    }

    /// Add a gate whose function is given by tag, e.g. `"A_OR_NOT_B"`
    pub fn gate_with_tag(
        self,
        id: WireId,
        left: WireId,
        right: WireId,
        tag: &str,
    ) -> Result<Self, CircuitError> {
        let function = tag.parse()?;
        Ok(self.gate(id, left, right, function))
    }

    /// Declare the number of outputs; they are the last `num_outputs` gates
    pub fn outputs(mut self, num_outputs: usize) -> Self {
        self.num_outputs = num_outputs;
        self
    }

    /// Order the gates by id and validate the result
    pub fn build(mut self) -> Result<Circuit, CircuitError> {
        self.gates.sort_by_key(|gate| gate.id);
        let circuit = Circuit {
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
            gates: self.gates,
        };
        circuit.validate()?;
        Ok(circuit)
    }
}

/// A validated Boolean circuit whose gates are in topological order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CircuitDescription", into = "CircuitDescription")]
pub struct Circuit {
    num_inputs: usize,
    num_outputs: usize,
    gates: Vec<Gate>,
}

impl TryFrom<CircuitDescription> for Circuit {
    type Error = CircuitError;

    fn try_from(description: CircuitDescription) -> Result<Self, Self::Error> {
        description
            .gates
            .into_iter()
            .fold(CircuitBuilder::new(description.num_inputs), |builder, gate| {
                builder.gate(gate.id, gate.left, gate.right, gate.function)
            })
            .outputs(description.num_outputs)
            .build()
    }
}

impl From<Circuit> for CircuitDescription {
    fn from(circuit: Circuit) -> Self {
        CircuitDescription {
            num_inputs: circuit.num_inputs,
            num_outputs: circuit.num_outputs,
            gates: circuit.gates,
        }
    }
}

impl Circuit {
    /// Check wire numbering, acyclicity and the output count
    ///
    /// Gate ids must run contiguously from `n + 1`, and each gate may only read
    /// input wires or gates listed before it.
    pub fn validate(&self) -> Result<(), CircuitError> {
        if self.num_inputs == 0 {
            return Err(CircuitError::NoInputs);
        }
        if self.gates.is_empty() {
            return Err(CircuitError::NoGates);
        }

        // Every wire id up to n + q must fit a WireId; the casts below rely on it.
        let fits = self
            .num_inputs
            .checked_add(self.gates.len())
            .is_some_and(|total| WireId::try_from(total).is_ok());
        if !fits {
            return Err(CircuitError::TooManyWires {
                inputs: self.num_inputs,
                gates: self.gates.len(),
            });
        }

        for (position, gate) in self.gates.iter().enumerate() {
            let expected = (self.num_inputs + position + 1) as WireId;
            if gate.id != expected {
                if position > 0 && gate.id == self.gates[position - 1].id {
                    return Err(CircuitError::DuplicateGate { gate: gate.id });
                }
                return Err(CircuitError::NonContiguousGate {
                    expected,
                    found: gate.id,
                });
            }

            for wire in [gate.left, gate.right] {
                if wire == 0 {
                    return Err(CircuitError::UndefinedWire {
                        gate: gate.id,
                        wire,
                    });
                }
                if wire >= gate.id {
                    return Err(CircuitError::ForwardReference {
                        gate: gate.id,
                        wire,
                    });
                }
            }
        }

        if self.num_outputs == 0 || self.num_outputs > self.gates.len() {
            return Err(CircuitError::InvalidOutputCount {
                outputs: self.num_outputs,
                gates: self.gates.len(),
            });
        }
        Ok(())
    }

    /// Number of input wires `n`
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Number of gates `q`
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Number of output wires `m`
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Total number of wires `n + q`
    pub fn num_wires(&self) -> usize {
        self.num_inputs + self.gates.len()
    }

    /// Gates in topological order
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Gate with the given id
    pub fn gate(&self, id: WireId) -> Option<&Gate> {
        (id as usize)
            .checked_sub(self.num_inputs + 1)
            .and_then(|index| self.gates.get(index))
    }

    /// Ids of the input wires `1..=n`
    pub fn input_wires(&self) -> std::ops::RangeInclusive<WireId> {
        1..=self.num_inputs as WireId
    }

    /// Ids of the output wires, in order
    pub fn output_wires(&self) -> impl Iterator<Item = WireId> + '_ {
        self.gates[self.gates.len() - self.num_outputs..]
            .iter()
            .map(|gate| gate.id)
    }

    /// Whether `wire` is one of the circuit outputs
    pub fn is_output(&self, wire: WireId) -> bool {
        wire as usize > self.num_wires() - self.num_outputs && wire as usize <= self.num_wires()
    }

    /// Evaluate the circuit directly on plaintext bits
    pub fn evaluate_plain(&self, inputs: &[bool]) -> Result<Vec<bool>, CircuitError> {
        if inputs.len() != self.num_inputs {
            return Err(CircuitError::InputLengthMismatch {
                expected: self.num_inputs,
                found: inputs.len(),
            });
        }

        let mut values = Vec::with_capacity(self.num_wires());
        values.extend_from_slice(inputs);
        for gate in &self.gates {
            let a = values[gate.left as usize - 1];
            let b = values[gate.right as usize - 1];
            values.push(gate.function.apply(a, b));
        }

        Ok(values.split_off(values.len() - self.num_outputs))
    }

    /// Save the circuit as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a circuit from JSON
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let circuit = serde_json::from_str(&data)?;
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn and_or_circuit() -> Circuit {
        // (A AND B) OR C
        CircuitBuilder::new(3)
            .gate(4, 1, 2, BooleanFunction::AND)
            .gate(5, 4, 3, BooleanFunction::OR)
            .build()
            .unwrap()
    }

    #[test]
    fn test_named_truth_tables() {
        // bit 3 = f(1,1), bit 0 = f(0,0)
        assert_eq!(BooleanFunction::AND.truth_table(), 0b1000);
        assert_eq!(BooleanFunction::OR.truth_table(), 0b1110);
        assert_eq!(BooleanFunction::XOR.truth_table(), 0b0110);
        assert_eq!(BooleanFunction::NAND.truth_table(), 0b0111);
        assert_eq!(BooleanFunction::A_OR_NOT_B.truth_table(), 0b1101);

        assert_eq!(BooleanFunction::AND.tag(), "AND");
        assert_eq!(BooleanFunction::NOR.tag(), "NOR");
        assert_eq!(BooleanFunction::NOT_A_OR_B.tag(), "NOT_A_OR_B");
        assert_eq!(BooleanFunction::A_OR_NOT_B.to_string(), "A_OR_NOT_B");
    }

    #[test]
    fn test_tags_index_matches_table() {
        for table in 0u8..16 {
            let function = BooleanFunction(table);
            assert_eq!(function.tag().parse::<BooleanFunction>().unwrap(), function);
        }
    }

    #[test]
    fn test_apply_a_or_not_b() {
        let f = BooleanFunction::A_OR_NOT_B;
        assert!(f.apply(false, false));
        assert!(!f.apply(false, true));
        assert!(f.apply(true, false));
        assert!(f.apply(true, true));
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!("and".parse::<BooleanFunction>().unwrap(), BooleanFunction::AND);
        assert_eq!("TT1011".parse::<BooleanFunction>().unwrap(), BooleanFunction::A_OR_NOT_B);
        assert_eq!("tt0001".parse::<BooleanFunction>().unwrap(), BooleanFunction::AND);
        assert!(matches!(
            "MAJ".parse::<BooleanFunction>(),
            Err(CircuitError::UnknownFunction { .. })
        ));
        assert!("TT102".parse::<BooleanFunction>().is_err());
        assert!("TT1021".parse::<BooleanFunction>().is_err());
    }

    #[test]
    fn test_builder_sorts_gates() {
        let circuit = CircuitBuilder::new(3)
            .gate(5, 4, 3, BooleanFunction::OR)
            .gate(4, 1, 2, BooleanFunction::AND)
            .build()
            .unwrap();
        assert_eq!(circuit, and_or_circuit());
        assert_eq!(circuit.gate(4).unwrap().function, BooleanFunction::AND);
        assert!(circuit.gate(3).is_none());
    }

    #[test]
    fn test_reject_forward_reference() {
        let result = CircuitBuilder::new(2)
            .gate(3, 1, 4, BooleanFunction::AND)
            .gate(4, 1, 2, BooleanFunction::OR)
            .build();
        assert_eq!(result, Err(CircuitError::ForwardReference { gate: 3, wire: 4 }));
    }

    #[test]
    fn test_reject_self_reference() {
        let result = CircuitBuilder::new(2)
            .gate(3, 3, 1, BooleanFunction::AND)
            .build();
        assert_eq!(result, Err(CircuitError::ForwardReference { gate: 3, wire: 3 }));
    }

    #[test]
    fn test_reject_wire_zero() {
        let result = CircuitBuilder::new(2)
            .gate(3, 0, 1, BooleanFunction::AND)
            .build();
        assert_eq!(result, Err(CircuitError::UndefinedWire { gate: 3, wire: 0 }));
    }

    #[test]
    fn test_reject_gaps_and_duplicates() {
        let gap = CircuitBuilder::new(2)
            .gate(4, 1, 2, BooleanFunction::AND)
            .build();
        assert_eq!(gap, Err(CircuitError::NonContiguousGate { expected: 3, found: 4 }));

        let duplicate = CircuitBuilder::new(2)
            .gate(3, 1, 2, BooleanFunction::AND)
            .gate(3, 1, 2, BooleanFunction::OR)
            .build();
        assert_eq!(duplicate, Err(CircuitError::DuplicateGate { gate: 3 }));
    }

    #[test]
    fn test_reject_bad_shapes() {
        assert_eq!(CircuitBuilder::new(0).build(), Err(CircuitError::NoInputs));
        assert_eq!(CircuitBuilder::new(2).build(), Err(CircuitError::NoGates));
        let too_many_outputs = CircuitBuilder::new(2)
            .gate(3, 1, 2, BooleanFunction::AND)
            .outputs(2)
            .build();
        assert_eq!(
            too_many_outputs,
            Err(CircuitError::InvalidOutputCount { outputs: 2, gates: 1 })
        );
    }

    #[test]
    fn test_evaluate_plain() {
        let circuit = and_or_circuit();
        assert_eq!(circuit.evaluate_plain(&[true, false, true]).unwrap(), vec![true]);
        assert_eq!(circuit.evaluate_plain(&[true, true, false]).unwrap(), vec![true]);
        assert_eq!(circuit.evaluate_plain(&[false, false, false]).unwrap(), vec![false]);
        assert!(circuit.evaluate_plain(&[true]).is_err());
    }

    #[test]
    fn test_output_wires() {
        let circuit = CircuitBuilder::new(2)
            .gate(3, 1, 2, BooleanFunction::AND)
            .gate(4, 1, 2, BooleanFunction::XOR)
            .gate(5, 3, 4, BooleanFunction::OR)
            .outputs(2)
            .build()
            .unwrap();
        assert_eq!(circuit.output_wires().collect::<Vec<_>>(), vec![4, 5]);
        assert!(circuit.is_output(4));
        assert!(!circuit.is_output(3));
        assert!(!circuit.is_output(6));
    }

    #[test]
    fn test_json_round_trip_revalidates() -> Result<()> {
        let circuit = and_or_circuit();
        let temp_file = tempfile::NamedTempFile::new()?;
        circuit.save_json(temp_file.path())?;
        assert_eq!(Circuit::load_json(temp_file.path())?, circuit);

        let broken = r#"{"num_inputs":2,"num_outputs":1,"gates":[{"id":3,"left":1,"right":3,"function":"AND"}]}"#;
        assert!(serde_json::from_str::<Circuit>(broken).is_err());
        let unknown = r#"{"num_inputs":2,"num_outputs":1,"gates":[{"id":3,"left":1,"right":2,"function":"MAJ"}]}"#;
        assert!(serde_json::from_str::<Circuit>(unknown).is_err());
        Ok(())
    }

    #[test]
    fn test_reject_wire_ids_beyond_u32() {
        let huge = CircuitBuilder::new(u32::MAX as usize)
            .gate(3, 1, 2, BooleanFunction::AND)
            .build();
        assert_eq!(
            huge,
            Err(CircuitError::TooManyWires {
                inputs: u32::MAX as usize,
                gates: 1
            })
        );

        #[cfg(target_pointer_width = "64")]
        {
            // n = 2^32 + 2 would wrap the first gate id back to 3
            let wrapped = CircuitBuilder::new((1usize << 32) + 2)
                .gate(3, 1, 2, BooleanFunction::AND)
                .build();
            assert!(matches!(wrapped, Err(CircuitError::TooManyWires { .. })));

            let overflowing = format!(
                r#"{{"num_inputs":{},"num_outputs":1,"gates":[{{"id":3,"left":1,"right":2,"function":"AND"}}]}}"#,
                usize::MAX
            );
            let err = serde_json::from_str::<Circuit>(&overflowing).unwrap_err();
            assert!(err.to_string().contains("32-bit wire id space"), "{err}");
        }
    }

    #[test]
    fn test_input_wires() {
        assert_eq!(and_or_circuit().input_wires().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
