use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::Unit;

/// Refinement metadata for number columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumberInfo {
    pub unit: Unit,
    /// Minimum decimal places shown. Display only, ignored by type comparison.
    pub min_dp: u8,
}

impl NumberInfo {
    pub fn new(unit: Unit, min_dp: u8) -> NumberInfo {
        NumberInfo { unit, min_dp }
    }

    pub fn with_unit(unit: Unit) -> NumberInfo {
        NumberInfo { unit, min_dp: 0 }
    }

    /// Two numbers are the same type when their units are equal.
    pub fn same_type(&self, other: &NumberInfo) -> bool {
        self.unit == other.unit
    }
}

impl fmt::Display for NumberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_scalar() {
            f.write_str("Number")
        } else {
            write!(f, "Number{{{}}}", self.unit)
        }
    }
}
