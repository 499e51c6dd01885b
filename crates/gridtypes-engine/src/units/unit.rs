//! Concrete units of measure.
//!
//! A [`Unit`] is a product of named atomic units raised to non-zero integer
//! powers, e.g. `kg*m/s^2` is `{kg: 1, m: 1, s: -2}`. The empty product is the
//! scalar (dimensionless) unit and displays as `1`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{ExponentOverflow, collect_exponents, merge_exponents, scale_exponents};

/// A named atomic unit such as `m`, `s` or `USD`.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SingleUnit(String);

impl SingleUnit {
    pub fn new(name: &str) -> SingleUnit {
        SingleUnit(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SingleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete unit: atomic units with non-zero exponents. Zero entries are
/// never stored, so structural equality is unit equality.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    units: BTreeMap<SingleUnit, i32>,
}

impl Unit {
    pub fn scalar() -> Unit {
        Unit::default()
    }

    /// A single atomic unit to the power one.
    pub fn single(name: &str) -> Unit {
        Unit {
            units: BTreeMap::from([(SingleUnit::new(name), 1)]),
        }
    }

    pub fn from_exponents(
        exponents: impl IntoIterator<Item = (SingleUnit, i32)>,
    ) -> Result<Unit, ExponentOverflow> {
        Ok(Unit {
            units: collect_exponents(exponents)?,
        })
    }

    pub fn is_scalar(&self) -> bool {
        self.units.is_empty()
    }

    pub fn exponent_of(&self, name: &str) -> i32 {
        self.units
            .iter()
            .find(|(unit, _)| unit.name() == name)
            .map(|(_, power)| *power)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SingleUnit, i32)> {
        self.units.iter().map(|(unit, power)| (unit, *power))
    }

    pub fn times(&self, other: &Unit) -> Result<Unit, ExponentOverflow> {
        Ok(Unit {
            units: merge_exponents(&self.units, &other.units)?,
        })
    }

    pub fn reciprocal(&self) -> Result<Unit, ExponentOverflow> {
        self.raise_by(-1)
    }

    pub fn divide_by(&self, other: &Unit) -> Result<Unit, ExponentOverflow> {
        self.times(&other.reciprocal()?)
    }

    pub fn raise_by(&self, power: i32) -> Result<Unit, ExponentOverflow> {
        Ok(Unit {
            units: scale_exponents(&self.units, power)?,
        })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_product(f, self.units.iter().map(|(u, p)| (u.name().to_string(), *p)))
    }
}

/// Write `a*b^2/c` style text for a list of (name, exponent) pairs.
pub(crate) fn write_product(
    f: &mut fmt::Formatter<'_>,
    parts: impl Iterator<Item = (String, i32)>,
) -> fmt::Result {
    let (positive, negative): (Vec<_>, Vec<_>) = parts.partition(|(_, p)| *p > 0);
    if positive.is_empty() {
        f.write_str("1")?;
    }
    for (idx, (name, power)) in positive.iter().enumerate() {
        if idx > 0 {
            f.write_str("*")?;
        }
        write_power(f, name, *power)?;
    }
    for (name, power) in &negative {
        f.write_str("/")?;
        write_power(f, name, -power)?;
    }
    Ok(())
}

fn write_power(f: &mut fmt::Formatter<'_>, name: &str, power: i32) -> fmt::Result {
    if power == 1 {
        f.write_str(name)
    } else {
        write!(f, "{}^{}", name, power)
    }
}
