//! Blood-type compatibility: a six-input circuit and its reference table.
//!
//! A blood type is three bits `(B antigen, A antigen, Rh)`. Wires 1-3 carry the
//! receiver's bits and wires 4-6 the donor's, most significant first. The
//! expected results come from the medical compatibility table, not from the
//! circuit's own logic.

use yao::circuit::{BooleanFunction, Circuit, CircuitBuilder};
use yao::error::CircuitError;

/// The eight blood types, indexed by their 3-bit encoding
pub const BLOOD_TYPES: [&str; 8] = ["O-", "O+", "A-", "A+", "B-", "B+", "AB-", "AB+"];

/// Encoding of a blood type name, if known
pub fn blood_type_bits(name: &str) -> Option<u8> {
    BLOOD_TYPES
        .iter()
        .position(|&t| t == name)
        .map(|index| index as u8)
}

/// Expand a 3-bit blood type into its wire values, most significant first
pub fn to_bits(blood_type: u8) -> [u8; 3] {
    [(blood_type >> 2) & 1, (blood_type >> 1) & 1, blood_type & 1]
}

/// Medical compatibility table: rows are receivers, columns donors, both in
/// [`BLOOD_TYPES`] order
pub const COMPATIBILITY_TABLE: [[u8; 8]; 8] = [
    [1, 0, 0, 0, 0, 0, 0, 0], // O-  receives from O-
    [1, 1, 0, 0, 0, 0, 0, 0], // O+  from O-, O+
    [1, 0, 1, 0, 0, 0, 0, 0], // A-  from O-, A-
    [1, 1, 1, 1, 0, 0, 0, 0], // A+  from O-, O+, A-, A+
    [1, 0, 0, 0, 1, 0, 0, 0], // B-  from O-, B-
    [1, 1, 0, 0, 1, 1, 0, 0], // B+  from O-, O+, B-, B+
    [1, 0, 1, 0, 1, 0, 1, 0], // AB- from O-, A-, B-, AB-
    [1, 1, 1, 1, 1, 1, 1, 1], // AB+ from all
];

/// Can `donor` give to `receiver`, read from [`COMPATIBILITY_TABLE`]
pub fn compatible(receiver: u8, donor: u8) -> bool {
    COMPATIBILITY_TABLE[receiver as usize][donor as usize] == 1
}

/// Per-antigen checks `x_i OR NOT y_i`, then an AND tree over the three results
pub fn blood_compatibility_circuit() -> Result<Circuit, CircuitError> {
    CircuitBuilder::new(6)
        .gate(7, 1, 4, BooleanFunction::A_OR_NOT_B)
        .gate(8, 2, 5, BooleanFunction::A_OR_NOT_B)
        .gate(9, 3, 6, BooleanFunction::A_OR_NOT_B)
        .gate(10, 7, 8, BooleanFunction::AND)
        .gate(11, 9, 10, BooleanFunction::AND)
        .build()
}
