use std::collections::BTreeMap;
use std::fmt;

use super::unit::write_product;
use super::vars::UnitVarId;
use super::{ExponentOverflow, SingleUnit, Unit, collect_exponents, merge_exponents, scale_exponents};

/// One factor of a unit expression: a unit variable or a concrete atomic unit.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum UnitAtom {
    Var(UnitVarId),
    Concrete(SingleUnit),
}

/// A product of unit variables and atomic units with non-zero exponents.
/// The empty expression is the scalar unit.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct UnitExp {
    atoms: BTreeMap<UnitAtom, i32>,
}

impl UnitExp {
    pub fn scalar() -> UnitExp {
        UnitExp::default()
    }

    pub fn from_concrete(unit: &Unit) -> UnitExp {
        UnitExp {
            atoms: unit
                .iter()
                .map(|(single, power)| (UnitAtom::Concrete(single.clone()), power))
                .collect(),
        }
    }

    pub fn from_var(var: UnitVarId) -> UnitExp {
        UnitExp {
            atoms: BTreeMap::from([(UnitAtom::Var(var), 1)]),
        }
    }

    pub(crate) fn from_atoms(
        atoms: impl IntoIterator<Item = (UnitAtom, i32)>,
    ) -> Result<UnitExp, ExponentOverflow> {
        Ok(UnitExp {
            atoms: collect_exponents(atoms)?,
        })
    }

    pub fn is_scalar(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn times(&self, other: &UnitExp) -> Result<UnitExp, ExponentOverflow> {
        Ok(UnitExp {
            atoms: merge_exponents(&self.atoms, &other.atoms)?,
        })
    }

    pub fn reciprocal(&self) -> Result<UnitExp, ExponentOverflow> {
        self.raise_by(-1)
    }

    pub fn divide_by(&self, other: &UnitExp) -> Result<UnitExp, ExponentOverflow> {
        self.times(&other.reciprocal()?)
    }

    pub fn raise_by(&self, power: i32) -> Result<UnitExp, ExponentOverflow> {
        Ok(UnitExp {
            atoms: scale_exponents(&self.atoms, power)?,
        })
    }

    pub fn atoms(&self) -> impl Iterator<Item = (&UnitAtom, i32)> {
        self.atoms.iter().map(|(atom, power)| (atom, *power))
    }

    /// The unit variables this expression mentions, with their exponents.
    pub fn vars(&self) -> impl Iterator<Item = (UnitVarId, i32)> + '_ {
        self.atoms.iter().filter_map(|(atom, power)| match atom {
            UnitAtom::Var(var) => Some((*var, *power)),
            UnitAtom::Concrete(_) => None,
        })
    }

    pub fn has_vars(&self) -> bool {
        self.vars().next().is_some()
    }

    /// The concrete unit, if no variable remains. Callers normally resolve
    /// first, see [`UnitVarTable::to_concrete_unit`](super::UnitVarTable::to_concrete_unit).
    pub fn as_concrete(&self) -> Option<Unit> {
        let mut exponents = Vec::with_capacity(self.atoms.len());
        for (atom, power) in &self.atoms {
            match atom {
                UnitAtom::Concrete(single) => exponents.push((single.clone(), *power)),
                UnitAtom::Var(_) => return None,
            }
        }
        // Keys are distinct, so nothing is summed.
        Unit::from_exponents(exponents).ok()
    }
}

impl fmt::Display for UnitExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_product(
            f,
            self.atoms.iter().map(|(atom, power)| {
                let name = match atom {
                    UnitAtom::Var(var) => var.to_string(),
                    UnitAtom::Concrete(single) => single.name().to_string(),
                };
                (name, *power)
            }),
        )
    }
}
