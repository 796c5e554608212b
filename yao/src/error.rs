//! Error types for the garbling, evaluation and coding stages.
//!
//! A trial decryption that does not match is *not* an error; it is the
//! [`Decryption::NoMatch`](crate::cipher::Decryption::NoMatch) value.

// Variants are documented by their messages.
#![allow(missing_docs)]

use crate::circuit::WireId;

/// A circuit description that cannot be garbled or evaluated.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CircuitError {
    #[error("circuit must have at least one input wire")]
    NoInputs,
    #[error("circuit must have at least one gate")]
    NoGates,
    #[error("{inputs} inputs and {gates} gates exceed the 32-bit wire id space")]
    TooManyWires { inputs: usize, gates: usize },
    #[error("gate {gate} is defined more than once")]
    DuplicateGate { gate: WireId },
    #[error("gate ids must be contiguous from {expected}, found gate {found}")]
    NonContiguousGate { expected: WireId, found: WireId },
    #[error("gate {gate} references undefined wire {wire}")]
    UndefinedWire { gate: WireId, wire: WireId },
    #[error("gate {gate} references wire {wire}, which is not defined before it")]
    ForwardReference { gate: WireId, wire: WireId },
    #[error("unknown gate function tag: '{tag}'")]
    UnknownFunction { tag: String },
    #[error("circuit declares {outputs} outputs but has {gates} gates")]
    InvalidOutputCount { outputs: usize, gates: usize },
    #[error("expected {expected} input bits, got {found}")]
    InputLengthMismatch { expected: usize, found: usize },
}

/// Plaintext input that cannot be mapped onto wire keys.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("input at position {position} is {value}, expected 0 or 1")]
    NonBinary { position: usize, value: u8 },
    #[error("expected {expected} input bits, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("wire range {start}..{end} is outside the {available} encoded input wires")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        available: usize,
    },
}

/// Failure while evaluating a garbled circuit.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    #[error("expected {expected} input keys, got {found}")]
    InputCountMismatch { expected: usize, found: usize },
    #[error("expected {expected} garbled tables, got {found}")]
    TableCountMismatch { expected: usize, found: usize },
    #[error("gate {gate} needs wire {wire}, which has no resolved key")]
    MissingWireKey { gate: WireId, wire: WireId },
    #[error("no garbled table entry of gate {gate} decrypts under its input keys")]
    NoMatchingEntry { gate: WireId },
    #[error("{matches} garbled table entries of gate {gate} decrypt under its input keys")]
    AmbiguousEntries { gate: WireId, matches: usize },
}

/// Output keys that cannot be mapped back to plaintext bits.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} output keys, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("output key for wire {wire} matches neither key of its decoding pair")]
    UnknownOutputKey { wire: WireId },
    #[error("output {position} is labelled wire {found}, expected wire {expected}")]
    WireMismatch {
        position: usize,
        expected: WireId,
        found: WireId,
    },
}

/// Failure reported by an oblivious-transfer collaborator.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum OtError {
    #[error("oblivious transfer needs between 1 and {max} candidates, got {found}")]
    CandidateCount { found: usize, max: usize },
    #[error("choice index {choice} is out of range for {candidates} candidates")]
    ChoiceOutOfRange { choice: usize, candidates: usize },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("oblivious transfer peer failed: {0}")]
    Peer(String),
}

/// Any failure that aborts a protocol run.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid circuit: {0}")]
    Circuit(#[from] CircuitError),
    #[error("input encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("decoding failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("oblivious transfer failed: {0}")]
    Ot(#[from] OtError),
    #[error("garbler owns {garbler_inputs} inputs but the circuit only has {inputs}")]
    InvalidPartition { garbler_inputs: usize, inputs: usize },
}
