//! Encoder and decoder: the boundary between plaintext bits and wire keys.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

use crate::circuit::WireId;
use crate::error::{DecodeError, EncodeError};
use crate::keys::{WireKey, WireKeyPair};

/// Check that every value is 0 or 1 and convert to bits
pub fn check_bits(bits: &[u8]) -> Result<Vec<bool>, EncodeError> {
    bits.iter()
        .enumerate()
        .map(|(position, &value)| match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(EncodeError::NonBinary { position, value }),
        })
        .collect()
}

/// Select, per position, the key of `pairs[i]` encoding `bits[i]`
pub fn encode(pairs: &[WireKeyPair], bits: &[u8]) -> Result<Vec<WireKey>, EncodeError> {
    if bits.len() != pairs.len() {
        return Err(EncodeError::LengthMismatch {
            expected: pairs.len(),
            found: bits.len(),
        });
    }
    let bits = check_bits(bits)?;
    Ok(pairs
        .iter()
        .zip(bits)
        .map(|(pair, bit)| pair.select(bit))
        .collect())
}

/// Key pairs of the input wires `1..=n`
///
/// Held by the garbler and never published in full: each party only ever
/// receives one key per input wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingInfo {
    pairs: Vec<WireKeyPair>,
}

impl EncodingInfo {
    /// Wrap the key pairs of input wires `1..=pairs.len()`
    pub fn new(pairs: Vec<WireKeyPair>) -> Self {
        EncodingInfo { pairs }
    }

    /// Number of input wires covered
    pub fn num_inputs(&self) -> usize {
        self.pairs.len()
    }

    /// All input key pairs, wire 1 first
    pub fn pairs(&self) -> &[WireKeyPair] {
        &self.pairs
    }

    /// Key pair of input wire `wire`
    pub fn pair(&self, wire: WireId) -> Option<&WireKeyPair> {
        (wire as usize)
            .checked_sub(1)
            .and_then(|index| self.pairs.get(index))
    }

    /// Key pairs for the 0-based input positions in `range`
    pub fn subset(&self, range: Range<usize>) -> Result<&[WireKeyPair], EncodeError> {
        self.pairs
            .get(range.clone())
            .ok_or(EncodeError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                available: self.pairs.len(),
            })
    }

    /// Encode a full input assignment
    pub fn encode(&self, bits: &[u8]) -> Result<Vec<WireKey>, EncodeError> {
        encode(&self.pairs, bits)
    }

    /// Encode the inputs at positions `range`
    pub fn encode_range(&self, range: Range<usize>, bits: &[u8]) -> Result<Vec<WireKey>, EncodeError> {
        encode(self.subset(range)?, bits)
    }

    /// Save encoding info as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load encoding info from JSON
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Key pair of one output wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDecoding {
    /// Output wire id
    pub wire: WireId,
    /// Keys for bit 0 and bit 1
    pub pair: WireKeyPair,
}

/// Key pairs of the output wires, in output order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodingInfo {
    outputs: Vec<OutputDecoding>,
}

impl DecodingInfo {
    /// Wrap the decoding pairs of the output wires
    pub fn new(outputs: Vec<OutputDecoding>) -> Self {
        DecodingInfo { outputs }
    }

    /// Decoding entries, in output order
    pub fn outputs(&self) -> &[OutputDecoding] {
        &self.outputs
    }

    /// Map each output key back to its bit
    ///
    /// A key that matches neither side of its pair means the garbled tables or
    /// the evaluation were corrupted; it is reported, never defaulted.
    pub fn decode(&self, keys: &[WireKey]) -> Result<Vec<bool>, DecodeError> {
        if keys.len() != self.outputs.len() {
            return Err(DecodeError::LengthMismatch {
                expected: self.outputs.len(),
                found: keys.len(),
            });
        }

        self.outputs
            .iter()
            .zip(keys)
            .map(|(output, key)| {
                output
                    .pair
                    .bit_of(key)
                    .ok_or(DecodeError::UnknownOutputKey { wire: output.wire })
            })
            .collect()
    }

    /// Decode output keys labelled with their wire ids
    ///
    /// The labels must name the output wires in output order, so keys that were
    /// reordered or attributed to the wrong wire are rejected.
    pub fn decode_wires(&self, wires: &[WireId], keys: &[WireKey]) -> Result<Vec<bool>, DecodeError> {
        if wires.len() != self.outputs.len() {
            return Err(DecodeError::LengthMismatch {
                expected: self.outputs.len(),
                found: wires.len(),
            });
        }
        for (position, (output, &wire)) in self.outputs.iter().zip(wires).enumerate() {
            if output.wire != wire {
                return Err(DecodeError::WireMismatch {
                    position,
                    expected: output.wire,
                    found: wire,
                });
            }
        }
        self.decode(keys)
    }

    /// Save decoding info as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load decoding info from JSON
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
