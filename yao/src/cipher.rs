//! Keystream generator and the special-correctness cipher used to build garbled tables.
//!
//! A ciphertext is `G(k1, k2, gate) XOR (m || 0^16)`. Decrypting under the wrong
//! key pair leaves the trailing half non-zero with overwhelming probability,
//! which is how the evaluator picks the right table entry.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::circuit::WireId;
use crate::constants::{CIPHERTEXT_SIZE, KEY_SIZE};
use crate::keys::WireKey;

/// One 32-byte entry of a garbled table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext([u8; CIPHERTEXT_SIZE]);

impl Ciphertext {
    /// Wrap raw ciphertext bytes
    pub fn new(bytes: [u8; CIPHERTEXT_SIZE]) -> Self {
        Ciphertext(bytes)
    }

    /// Get the raw bytes of this ciphertext
    pub fn as_bytes(&self) -> &[u8; CIPHERTEXT_SIZE] {
        &self.0
    }
}

/// Outcome of a trial decryption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decryption {
    /// The padding check held; carries the recovered key
    Matched(WireKey),
    /// The padding check failed; the key pair does not open this entry
    NoMatch,
}

impl Decryption {
    /// Recovered key, if any
    pub fn matched(self) -> Option<WireKey> {
        match self {
            Decryption::Matched(key) => Some(key),
            Decryption::NoMatch => None,
        }
    }
}

/// Keystream `G(key_a, key_b, gate_id)`: SHA-256 over both keys and the big-endian gate id
pub fn keystream(key_a: &WireKey, key_b: &WireKey, gate_id: WireId) -> [u8; CIPHERTEXT_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(key_a.as_bytes());
    hasher.update(key_b.as_bytes());
    hasher.update(gate_id.to_be_bytes());
    hasher.finalize().into()
}

/// Encrypt `message` under `(k1, k2, gate_id)`
pub fn encrypt(k1: &WireKey, k2: &WireKey, gate_id: WireId, message: &WireKey) -> Ciphertext {
    let mut block = keystream(k1, k2, gate_id);
    // The trailing half XORs with zero padding and stays as keystream.
    for (pad_byte, msg_byte) in block.iter_mut().zip(message.as_bytes()) {
        *pad_byte ^= msg_byte;
    }
    Ciphertext(block)
}

/// Trial-decrypt `ciphertext` under `(k1, k2, gate_id)`
pub fn decrypt(k1: &WireKey, k2: &WireKey, gate_id: WireId, ciphertext: &Ciphertext) -> Decryption {
    let mut block = keystream(k1, k2, gate_id);
    for (pad_byte, ct_byte) in block.iter_mut().zip(ciphertext.as_bytes()) {
        *pad_byte ^= ct_byte;
    }

    let (message, padding) = block.split_at(KEY_SIZE);
    if padding.iter().fold(0u8, |acc, byte| acc | byte) != 0 {
        return Decryption::NoMatch;
    }

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(message);
    Decryption::Matched(WireKey::new(key))
}
