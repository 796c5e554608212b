use anyhow::{Result, bail};
use indicatif::ProgressBar;
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cipher::{Ciphertext, encrypt};
use crate::circuit::{Circuit, Gate};
use crate::constants::{CIPHERTEXT_SIZE, PROGRESS_UPDATE_INTERVAL, TABLE_SIZE};
use crate::encoding::{DecodingInfo, EncodingInfo, OutputDecoding};
use crate::error::CircuitError;
use crate::keys::{WireKeyPair, WireKeyStore};
use crate::progress::gate_progress_bar;

/// Size of one serialized garbled table in bytes
pub const TABLE_BYTES: usize = TABLE_SIZE * CIPHERTEXT_SIZE;

/// Input-bit combinations `(a, b)` in the order the entries are built, before shuffling
const ROWS: [(bool, bool); TABLE_SIZE] = [(false, false), (false, true), (true, false), (true, true)];

/// Garbled truth table of one gate: 4 ciphertexts in random order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbledTable {
    /// Table entries; position carries no information about `(a, b)`
    pub ciphertexts: [Ciphertext; TABLE_SIZE],
}

impl GarbledTable {
    /// Serialize the table as binary (128 bytes total)
    pub fn as_binary(&self) -> [u8; TABLE_BYTES] {
        let mut result = [0u8; TABLE_BYTES];
        for (chunk, ciphertext) in result.chunks_exact_mut(CIPHERTEXT_SIZE).zip(&self.ciphertexts) {
            chunk.copy_from_slice(ciphertext.as_bytes());
        }
        result
    }

    /// Parse a table from exactly [`TABLE_BYTES`] bytes
    pub fn from_binary(data: &[u8]) -> Result<Self> {
        if data.len() != TABLE_BYTES {
            bail!("Invalid garbled table: expected {} bytes, got {}", TABLE_BYTES, data.len());
        }
        let mut ciphertexts = [Ciphertext::new([0u8; CIPHERTEXT_SIZE]); TABLE_SIZE];
        for (slot, chunk) in ciphertexts.iter_mut().zip(data.chunks_exact(CIPHERTEXT_SIZE)) {
            let mut bytes = [0u8; CIPHERTEXT_SIZE];
            bytes.copy_from_slice(chunk);
            *slot = Ciphertext::new(bytes);
        }
        Ok(GarbledTable { ciphertexts })
    }
}

/// Write garbled tables as a flat binary file of [`TABLE_BYTES`]-byte records
pub fn save_tables<P: AsRef<Path>>(tables: &[GarbledTable], path: P) -> Result<()> {
    let mut data = Vec::with_capacity(tables.len() * TABLE_BYTES);
    for table in tables {
        data.extend_from_slice(&table.as_binary());
    }
    std::fs::write(path, data)?;
    Ok(())
}

/// Load garbled tables written by [`save_tables`]
pub fn load_tables<P: AsRef<Path>>(path: P) -> Result<Vec<GarbledTable>> {
    let data = std::fs::read(path)?;
    if !data.len().is_multiple_of(TABLE_BYTES) {
        bail!(
            "Invalid garbled tables file: size {} is not multiple of {}",
            data.len(),
            TABLE_BYTES
        );
    }
    data.chunks_exact(TABLE_BYTES)
        .map(GarbledTable::from_binary)
        .collect()
}

/// Everything the garbler produces for one run
#[derive(Debug)]
pub struct GarbledCircuit {
    /// One table per gate, in gate order; handed to the evaluator
    pub tables: Vec<GarbledTable>,
    /// Input key pairs; kept by the garbler
    pub encoding: EncodingInfo,
    /// Output key pairs; kept by the garbler
    pub decoding: DecodingInfo,
}

impl GarbledCircuit {
    /// Save the tables (binary) and the encoding/decoding info (JSON)
    pub fn save<P: AsRef<Path>>(&self, tables_path: P, encoding_path: P, decoding_path: P) -> Result<()> {
        save_tables(&self.tables, tables_path)?;
        self.encoding.save_json(encoding_path)?;
        self.decoding.save_json(decoding_path)?;
        Ok(())
    }
}

/// Garble one gate
///
/// Entry `(a, b)` encrypts the output key for `f(a, b)` under the left key for `a`,
/// the right key for `b` and the gate id. The four entries are then shuffled.
pub fn garble_gate<R: RngCore + ?Sized>(
    gate: &Gate,
    left: &WireKeyPair,
    right: &WireKeyPair,
    output: &WireKeyPair,
    rng: &mut R,
) -> GarbledTable {
    let mut ciphertexts = ROWS.map(|(a, b)| {
        encrypt(
            &left.select(a),
            &right.select(b),
            gate.id,
            &output.select(gate.function.apply(a, b)),
        )
    });
    ciphertexts.shuffle(rng);
    GarbledTable { ciphertexts }
}

/// Garble a circuit with fresh wire keys from `rng`
///
/// # Returns
/// * `Ok(GarbledCircuit)` - Tables for every gate plus encoding and decoding info
/// * `Err(CircuitError)` - The circuit references undefined or later wires
pub fn garble_circuit<R: RngCore + CryptoRng + ?Sized>(
    circuit: &Circuit,
    rng: &mut R,
) -> Result<GarbledCircuit, CircuitError> {
    garble_circuit_with_progress(circuit, rng, &ProgressBar::hidden())
}

/// [`garble_circuit`] reporting per-gate progress on `pb`
pub fn garble_circuit_with_progress<R: RngCore + CryptoRng + ?Sized>(
    circuit: &Circuit,
    rng: &mut R,
    pb: &ProgressBar,
) -> Result<GarbledCircuit, CircuitError> {
    circuit.validate()?;

    let store = WireKeyStore::generate(circuit.num_wires(), rng);
    let mut tables = Vec::with_capacity(circuit.num_gates());

    for (index, gate) in circuit.gates().iter().enumerate() {
        let lookup = |wire| {
            store
                .pair(wire)
                .ok_or(CircuitError::UndefinedWire { gate: gate.id, wire })
        };
        let left = lookup(gate.left)?;
        let right = lookup(gate.right)?;
        let output = lookup(gate.id)?;

        tables.push(garble_gate(gate, left, right, output, rng));
        tracing::trace!(gate = gate.id, function = %gate.function, "garbled gate");

        if (index as u32 + 1).is_multiple_of(PROGRESS_UPDATE_INTERVAL) {
            pb.set_position(index as u64 + 1);
        }
    }
    pb.set_position(circuit.num_gates() as u64);
    pb.finish_with_message(format!("✓ Garbled {} gates", tables.len()));

    let encoding = EncodingInfo::new(
        circuit
            .input_wires()
            .map(|wire| {
                store
                    .pair(wire)
                    .copied()
                    .ok_or(CircuitError::UndefinedWire { gate: wire, wire })
            })
            .collect::<Result<_, _>>()?,
    );
    let decoding = DecodingInfo::new(
        circuit
            .output_wires()
            .map(|wire| {
                store
                    .pair(wire)
                    .map(|pair| OutputDecoding { wire, pair: *pair })
                    .ok_or(CircuitError::UndefinedWire { gate: wire, wire })
            })
            .collect::<Result<_, _>>()?,
    );

    tracing::info!(
        inputs = circuit.num_inputs(),
        gates = tables.len(),
        outputs = circuit.num_outputs(),
        "garbled circuit"
    );

    Ok(GarbledCircuit {
        tables,
        encoding,
        decoding,
    })
}

/// Garble with progress shown on the terminal
pub fn garble_circuit_verbose<R: RngCore + CryptoRng + ?Sized>(
    circuit: &Circuit,
    rng: &mut R,
) -> Result<GarbledCircuit, CircuitError> {
    let pb = gate_progress_bar(circuit.num_gates(), "Garbling circuit...");
    garble_circuit_with_progress(circuit, rng, &pb)
}
