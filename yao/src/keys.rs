use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::circuit::WireId;
use crate::constants::KEY_SIZE;

/// 128-bit secret key standing for one value of a wire
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireKey([u8; KEY_SIZE]);

impl WireKey {
    /// Create a wire key from raw bytes
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        WireKey(bytes)
    }

    /// Draw a fresh key from a cryptographically secure generator
    pub fn random<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rng.fill_bytes(&mut bytes);
        WireKey(bytes)
    }

    /// Get the raw bytes of this key
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

// Only a short prefix is printed so logs never carry a whole key.
impl fmt::Debug for WireKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WireKey({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// The two keys of a wire: `zero` encodes bit 0, `one` encodes bit 1
///
/// The keys differ; deserialization rejects a pair whose keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "KeyPairRecord")]
pub struct WireKeyPair {
    /// Key for plaintext bit 0
    pub zero: WireKey,
    /// Key for plaintext bit 1
    pub one: WireKey,
}

#[derive(Deserialize)]
struct KeyPairRecord {
    zero: WireKey,
    one: WireKey,
}

impl TryFrom<KeyPairRecord> for WireKeyPair {
    type Error = String;

    fn try_from(record: KeyPairRecord) -> Result<Self, Self::Error> {
        if record.zero == record.one {
            return Err("wire key pair has identical zero and one keys".to_string());
        }
        Ok(WireKeyPair {
            zero: record.zero,
            one: record.one,
        })
    }
}

impl WireKeyPair {
    /// Generate two independent keys, redrawing in the (negligible) event they collide
    pub fn random<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let zero = WireKey::random(rng);
        let mut one = WireKey::random(rng);
        while one == zero {
            one = WireKey::random(rng);
        }
        WireKeyPair { zero, one }
    }

    /// Key encoding `bit`
    pub fn select(&self, bit: bool) -> WireKey {
        if bit { self.one } else { self.zero }
    }

    /// Bit encoded by `key`, or `None` if the key belongs to neither side of the pair
    pub fn bit_of(&self, key: &WireKey) -> Option<bool> {
        if *key == self.zero {
            Some(false)
        } else if *key == self.one {
            Some(true)
        } else {
            None
        }
    }
}

/// Key pairs for every wire of a circuit, indexed by wire id (ids start at 1)
///
/// Created once per garbling run and never mutated afterwards.
#[derive(Debug)]
pub struct WireKeyStore {
    pairs: Vec<WireKeyPair>,
}

impl WireKeyStore {
    /// Generate `num_wires` independent key pairs for wires `1..=num_wires`
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(num_wires: usize, rng: &mut R) -> Self {
        let pairs = (0..num_wires).map(|_| WireKeyPair::random(rng)).collect();
        WireKeyStore { pairs }
    }

    /// Key pair of `wire`
    pub fn pair(&self, wire: WireId) -> Option<&WireKeyPair> {
        (wire as usize)
            .checked_sub(1)
            .and_then(|index| self.pairs.get(index))
    }

    /// Number of wires held in the store
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the store holds no wires
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
