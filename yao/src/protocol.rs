//! Garbler and evaluator sessions for one protocol run.
//!
//! A run moves through `GARBLED -> INPUTS-ENCODED -> EVALUATED -> DECODED`. Each
//! step consumes the previous session value, so a run cannot move backwards or
//! be evaluated twice. The garbler owns input wires `1..=k`, the evaluator owns
//! `k+1..=n`.

use rand::{CryptoRng, RngCore};

use crate::circuit::Circuit;
use crate::error::ProtocolError;
use crate::evaluator::{EvaluatedOutputs, evaluate_circuit};
use crate::garbler::{GarbledCircuit, GarbledTable, garble_circuit};
use crate::keys::{WireKey, WireKeyPair};
use crate::ot::{ObliviousTransfer, transfer_input_keys};

/// The garbler's side of a run, in the GARBLED state
#[derive(Debug)]
pub struct GarblerSession {
    circuit: Circuit,
    garbled: GarbledCircuit,
    garbler_inputs: usize,
}

impl GarblerSession {
    /// Garble `circuit`, the garbler owning its first `garbler_inputs` input wires
    pub fn new<R: RngCore + CryptoRng + ?Sized>(
        circuit: Circuit,
        garbler_inputs: usize,
        rng: &mut R,
    ) -> Result<Self, ProtocolError> {
        if garbler_inputs > circuit.num_inputs() {
            return Err(ProtocolError::InvalidPartition {
                garbler_inputs,
                inputs: circuit.num_inputs(),
            });
        }
        let garbled = garble_circuit(&circuit, rng)?;
        Ok(GarblerSession {
            circuit,
            garbled,
            garbler_inputs,
        })
    }

    /// Circuit topology, shared with the evaluator
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Garbled tables, sent to the evaluator
    pub fn tables(&self) -> &[GarbledTable] {
        &self.garbled.tables
    }

    /// Number of input wires owned by the garbler
    pub fn garbler_inputs(&self) -> usize {
        self.garbler_inputs
    }

    /// Encode the garbler's own input bits for wires `1..=k`
    pub fn encode_own_inputs(&self, bits: &[u8]) -> Result<Vec<WireKey>, ProtocolError> {
        Ok(self
            .garbled
            .encoding
            .encode_range(0..self.garbler_inputs, bits)?)
    }

    /// Key pairs of the evaluator-owned wires; only ever offered through OT
    pub fn evaluator_input_pairs(&self) -> &[WireKeyPair] {
        &self.garbled.encoding.pairs()[self.garbler_inputs..]
    }

    /// Decode the evaluator's output keys (DECODED)
    pub fn decode(&self, outputs: &EvaluatedOutputs) -> Result<Vec<bool>, ProtocolError> {
        let bits = self.garbled.decoding.decode_wires(&outputs.wires, &outputs.keys)?;
        tracing::info!(outputs = bits.len(), "decoded circuit outputs");
        Ok(bits)
    }
}

/// The evaluator's side of a run, in the GARBLED state
#[derive(Debug)]
pub struct EvaluatorSession {
    circuit: Circuit,
    tables: Vec<GarbledTable>,
}

/// The evaluator's side once every input wire has a key (INPUTS-ENCODED)
#[derive(Debug)]
pub struct EncodedEvaluatorSession {
    circuit: Circuit,
    tables: Vec<GarbledTable>,
    input_keys: Vec<WireKey>,
}

impl EvaluatorSession {
    /// Start from the circuit topology and the garbled tables received from the garbler
    pub fn new(circuit: Circuit, tables: Vec<GarbledTable>) -> Self {
        EvaluatorSession { circuit, tables }
    }

    /// Combine the garbler's keys with the evaluator's own keys obtained by OT
    ///
    /// `pairs` are the sender-side candidates of the OT, one pair per
    /// evaluator-owned wire, and `bits` the evaluator's private choices.
    pub fn receive_inputs<O: ObliviousTransfer + ?Sized>(
        self,
        garbler_keys: Vec<WireKey>,
        ot: &mut O,
        pairs: &[WireKeyPair],
        bits: &[u8],
    ) -> Result<EncodedEvaluatorSession, ProtocolError> {
        let own_keys = transfer_input_keys(ot, pairs, bits)?;
        let mut input_keys = garbler_keys;
        input_keys.extend(own_keys);
        Ok(EncodedEvaluatorSession {
            circuit: self.circuit,
            tables: self.tables,
            input_keys,
        })
    }
}

impl EncodedEvaluatorSession {
    /// Evaluate the garbled circuit (EVALUATED); intermediate keys are dropped here
    pub fn evaluate(self) -> Result<EvaluatedOutputs, ProtocolError> {
        Ok(evaluate_circuit(&self.circuit, &self.tables, &self.input_keys)?)
    }
}

/// Drive one complete run between the two roles
///
/// # Returns
/// * `Ok(Vec<bool>)` - The decoded circuit outputs
/// * `Err(ProtocolError)` - The run aborted; no partial outputs exist
pub fn run_protocol<O, R>(
    circuit: &Circuit,
    garbler_bits: &[u8],
    evaluator_bits: &[u8],
    ot: &mut O,
    rng: &mut R,
) -> Result<Vec<bool>, ProtocolError>
where
    O: ObliviousTransfer + ?Sized,
    R: RngCore + CryptoRng + ?Sized,
{
    let garbler = GarblerSession::new(circuit.clone(), garbler_bits.len(), rng)?;
    let garbler_keys = garbler.encode_own_inputs(garbler_bits)?;

    let outputs = EvaluatorSession::new(circuit.clone(), garbler.tables().to_vec())
        .receive_inputs(garbler_keys, ot, garbler.evaluator_input_pairs(), evaluator_bits)?
        .evaluate()?;

    garbler.decode(&outputs)
}
