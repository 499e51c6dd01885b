//! Units of measure and unit inference.
//!
//! - [`Unit`] - a concrete unit (`kg*m/s^2`)
//! - [`UnitExp`] - a unit expression that may mention unit variables
//! - [`UnitVarTable`] - the arena of unit variables and the unifier that
//!   solves `a = b` for them (Kennedy's algorithm for abelian groups)

mod unit;
mod unit_exp;
mod vars;

pub use unit::{SingleUnit, Unit};
pub use unit_exp::{UnitAtom, UnitExp};
pub use vars::{NoSolution, UnitVarId, UnitVarTable};

use std::collections::BTreeMap;
use thiserror::Error;

/// A unit exponent left the `i32` range.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unit exponent out of range")]
pub struct ExponentOverflow;

/// Sum the exponents of repeated keys and drop the zeros.
pub(crate) fn collect_exponents<K: Ord>(
    exponents: impl IntoIterator<Item = (K, i32)>,
) -> Result<BTreeMap<K, i32>, ExponentOverflow> {
    let mut map = BTreeMap::new();
    for (key, power) in exponents {
        let slot = map.entry(key).or_insert(0i32);
        *slot = slot.checked_add(power).ok_or(ExponentOverflow)?;
    }
    map.retain(|_, power| *power != 0);
    Ok(map)
}

pub(crate) fn merge_exponents<K: Ord + Clone>(
    left: &BTreeMap<K, i32>,
    right: &BTreeMap<K, i32>,
) -> Result<BTreeMap<K, i32>, ExponentOverflow> {
    collect_exponents(left.iter().chain(right).map(|(key, power)| (key.clone(), *power)))
}

pub(crate) fn scale_exponents<K: Ord + Clone>(
    map: &BTreeMap<K, i32>,
    by: i32,
) -> Result<BTreeMap<K, i32>, ExponentOverflow> {
    if by == 0 {
        return Ok(BTreeMap::new());
    }
    map.iter()
        .map(|(key, power)| {
            power
                .checked_mul(by)
                .map(|scaled| (key.clone(), scaled))
                .ok_or(ExponentOverflow)
        })
        .collect()
}
