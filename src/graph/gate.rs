use crate::data_structures::BitVector;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Enum representing the different types of gates in a circuit.
///
/// Gate types are written in upper case, parsing ignores case.
/// ```
/// # use circuitsim::GateType;
/// assert_eq!(GateType::from_name("xnor").unwrap(), GateType::Xnor);
/// assert_eq!(GateType::Nand.to_string(), "NAND");
/// assert!(GateType::from_name("MUX").is_err());
/// ```
#[repr(u8)]
#[derive(
    Clone, Debug, Copy, Eq, PartialEq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateType {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Xnor,
}
use GateType::*;
impl GateType {
    /// Returns the [GateType] called `name`.
    pub fn from_name(name: &str) -> Result<GateType, ConfigurationError> {
        GateType::from_str(name.trim())
            .map_err(|_| ConfigurationError::UnknownGateType(name.into()))
    }

    /// Calculates the state of a single output bit from the bits at the same index of both inputs.
    ///
    /// `b` is ignored by [Not].
    #[inline(always)]
    pub fn apply(&self, a: bool, b: bool) -> bool {
        match self {
            And => a & b,
            Or => a | b,
            Not => !a,
            Nand => !(a & b),
            Nor => !(a | b),
            Xor => a ^ b,
            Xnor => a == b,
        }
    }

    /// Returns the number of input slots a gate of this type has.
    pub fn input_count(&self) -> u8 {
        match self {
            Not => 1,
            And | Or | Nand | Nor | Xor | Xnor => 2,
        }
    }

    /// Returns true if `self` is [Not].
    pub fn is_not(&self) -> bool {
        matches!(self, Not)
    }
}

/// Computes the output of a `ty` gate of `width` bits with inputs `a` and `b`.
///
/// Bits are paired by index, most significant first, and an input shorter than `width`
/// reads as 0 past its end. The result is always exactly `width` bits wide.
///
/// # Example
/// ```
/// # use circuitsim::{evaluate, GateType};
/// # use circuitsim::data_structures::BitVector;
/// let a: BitVector = "1100".parse().unwrap();
/// let b: BitVector = "1010".parse().unwrap();
///
/// assert_eq!(evaluate(GateType::Xor, &a, &b, 4).to_string(), "0110");
/// assert_eq!(evaluate(GateType::Not, &a, &b, 6).to_string(), "001111");
/// ```
pub fn evaluate(ty: GateType, a: &BitVector, b: &BitVector, width: usize) -> BitVector {
    (0..width).map(|i| ty.apply(a.get(i), b.get(i))).collect()
}
