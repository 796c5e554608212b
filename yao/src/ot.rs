//! Oblivious-transfer contract used to hand the evaluator its own input keys.
//!
//! The real OT protocol lives outside this crate. [`IdealOt`] stands in for it as
//! an in-process trusted functionality and offers none of its privacy guarantees.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;

use crate::constants::MAX_OT_CANDIDATES;
use crate::encoding::check_bits;
use crate::error::{EncodeError, OtError};
use crate::keys::{WireKey, WireKeyPair};

/// A 1-out-of-k oblivious transfer of wire keys
///
/// Implementations must hand back exactly `candidates[choice]`, must not reveal
/// `choice` to the sender, and must not reveal the other candidates to the receiver.
pub trait ObliviousTransfer {
    /// Run one transfer over at most [`MAX_OT_CANDIDATES`] candidates
    fn transfer(&mut self, candidates: &[WireKey], choice: usize) -> Result<WireKey, OtError>;
}

/// Check the candidate count and choice index of a transfer request
pub fn check_request(candidates: &[WireKey], choice: usize) -> Result<(), OtError> {
    if candidates.is_empty() || candidates.len() > MAX_OT_CANDIDATES {
        return Err(OtError::CandidateCount {
            found: candidates.len(),
            max: MAX_OT_CANDIDATES,
        });
    }
    if choice >= candidates.len() {
        return Err(OtError::ChoiceOutOfRange {
            choice,
            candidates: candidates.len(),
        });
    }
    Ok(())
}

/// Trusted in-process transfer, for simulation and tests
#[derive(Debug, Default)]
pub struct IdealOt {
    transfers: usize,
}

impl IdealOt {
    /// Create a fresh functionality
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transfers served so far
    pub fn transfers(&self) -> usize {
        self.transfers
    }
}

impl ObliviousTransfer for IdealOt {
    fn transfer(&mut self, candidates: &[WireKey], choice: usize) -> Result<WireKey, OtError> {
        check_request(candidates, choice)?;
        self.transfers += 1;
        Ok(candidates[choice])
    }
}

/// Obtain one key per wire through 1-out-of-2 transfers
///
/// All bits are checked before the first transfer so a bad input never leaks a
/// partial set of keys.
pub fn transfer_input_keys<O: ObliviousTransfer + ?Sized>(
    ot: &mut O,
    pairs: &[WireKeyPair],
    bits: &[u8],
) -> Result<Vec<WireKey>, OtError> {
    if bits.len() != pairs.len() {
        return Err(EncodeError::LengthMismatch {
            expected: pairs.len(),
            found: bits.len(),
        }
        .into());
    }
    let bits = check_bits(bits)?;

    let keys = pairs
        .iter()
        .zip(bits)
        .map(|(pair, bit)| ot.transfer(&[pair.zero, pair.one], bit as usize))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(wires = keys.len(), "received input keys by oblivious transfer");
    Ok(keys)
}

/// Pick random input bits from a seeded generator and fetch their keys by OT
///
/// # Returns
/// * `Ok((bits, keys))` - The chosen bits and the key selected for each
/// * `Err(OtError)` - The transfer failed
pub fn simulate_random_choices<O: ObliviousTransfer + ?Sized>(
    ot: &mut O,
    pairs: &[WireKeyPair],
    seed_data: &[u8; 32],
) -> Result<(Vec<u8>, Vec<WireKey>), OtError> {
    let mut rng = ChaCha12Rng::from_seed(*seed_data);
    let bits: Vec<u8> = pairs.iter().map(|_| (rng.next_u32() & 1) as u8).collect();
    let keys = transfer_input_keys(ot, pairs, &bits)?;
    Ok((bits, keys))
}
