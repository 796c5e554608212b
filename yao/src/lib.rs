//! Yao's garbled circuits with a special-correctness cipher and trial-decryption evaluation.
//!
//! The garbler turns a [`circuit::Circuit`] into one shuffled four-entry table per
//! gate. The evaluator opens each table by trial decryption with the two keys it
//! holds for the gate's inputs, and the garbler decodes the resulting output keys.

/// Special-correctness cipher and its keystream
pub mod cipher;
/// Circuit model, Boolean functions and plaintext evaluation
pub mod circuit;
/// Shared constants used across the library
pub mod constants;
/// Gate function counting utilities
pub mod counter;
/// Plaintext bits to wire keys and back
pub mod encoding;
/// Error types
pub mod error;
/// Garbled circuit evaluation functionality
pub mod evaluator;
/// Circuit garbling using Yao's protocol
pub mod garbler;
/// Wire keys and per-circuit key storage
pub mod keys;
/// Oblivious transfer (OT) contract and ideal functionality
pub mod ot;
/// Textual circuit description format
pub mod parser;
/// Progress reporting helpers
pub mod progress;
/// Garbler and evaluator sessions
pub mod protocol;
/// Buffered line reader for circuit descriptions
pub mod stream;
/// Wire usage analysis for key lifetime management
pub mod wire_analyzer;

pub use circuit::{BooleanFunction, Circuit, CircuitBuilder, Gate, WireId};
pub use error::{CircuitError, DecodeError, EncodeError, EvaluationError, OtError, ProtocolError};
pub use keys::{WireKey, WireKeyPair};
