//! Unit variables and unit unification.
//!
//! Unit variables live in an arena ([`UnitVarTable`]) and are referred to by
//! [`UnitVarId`]. Each slot is either unbound or holds the expression the
//! variable was solved to; a bound slot is never unbound again except by
//! rolling back a failed [`UnitVarTable::unify`]. Reading a variable follows
//! bindings transitively and writes the fully resolved expression back into
//! the slot (path compression).
//!
//! Unification solves `left = right` by reducing `left * right^-1` to the
//! scalar unit purely by binding variables:
//!
//! ```text
//! solve(u):
//!   u empty                       -> done
//!   u has no variables            -> no solution
//!   v = variable with least |p|   (p its exponent)
//!   p divides every exponent      -> v := prod(a^(-e_a / p))      done
//!   v is the only variable        -> no solution
//!   otherwise                     -> v := v' * prod(a^(-floor(e_a / p)))
//!                                    for a fresh v', then solve(u) again
//! ```
//!
//! The last step leaves every other exponent as its remainder modulo `|p|`, so
//! the least exponent strictly shrinks and the loop terminates. An exponent
//! that leaves the `i32` range at any step is reported as no solution.

use std::fmt;
use thiserror::Error;

use super::{ExponentOverflow, Unit, UnitAtom, UnitExp};

/// Handle to a unit variable in a [`UnitVarTable`].
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct UnitVarId(u32);

impl UnitVarId {
    pub fn from_raw(index: u32) -> UnitVarId {
        UnitVarId(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_u{}", self.0)
    }
}

/// Unification found no assignment of unit variables. Callers add context.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no solution")]
pub struct NoSolution;

impl From<ExponentOverflow> for NoSolution {
    fn from(err: ExponentOverflow) -> Self {
        log::debug!("unit unification gave up: {}", err);
        NoSolution
    }
}

#[derive(Debug, Default, Clone)]
pub struct UnitVarTable {
    bindings: Vec<Option<UnitExp>>,
    /// Previous slot contents, recorded only while a unification is running.
    trail: Vec<(UnitVarId, Option<UnitExp>)>,
    recording: bool,
}

impl UnitVarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh, unbound variable. Ids increase monotonically.
    pub fn fresh(&mut self) -> UnitVarId {
        let id = UnitVarId(self.bindings.len() as u32);
        self.bindings.push(None);
        id
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn binding(&self, var: UnitVarId) -> Option<&UnitExp> {
        self.bindings.get(var.index()).and_then(|slot| slot.as_ref())
    }

    pub fn is_resolved(&self, var: UnitVarId) -> bool {
        self.binding(var).is_some()
    }

    /// Substitute every bound variable in `exp`, transitively.
    pub fn resolve(&mut self, exp: &UnitExp) -> Result<UnitExp, ExponentOverflow> {
        let mut resolved = UnitExp::scalar();
        for (atom, power) in exp.atoms() {
            let factor = match atom {
                UnitAtom::Var(var) => self.find(*var)?,
                UnitAtom::Concrete(_) => UnitExp::from_atoms([(atom.clone(), 1)])?,
            };
            resolved = resolved.times(&factor.raise_by(power)?)?;
        }
        Ok(resolved)
    }

    /// The concrete unit `exp` denotes, or `None` if a variable is still free.
    pub fn to_concrete_unit(&mut self, exp: &UnitExp) -> Result<Option<Unit>, ExponentOverflow> {
        Ok(self.resolve(exp)?.as_concrete())
    }

    /// Solve `left = right`. On success the bindings are kept and the resolved
    /// common expression is returned; on failure every binding made during
    /// the attempt is undone.
    pub fn unify(&mut self, left: &UnitExp, right: &UnitExp) -> Result<UnitExp, NoSolution> {
        self.trail.clear();
        self.recording = true;
        let outcome = self.solve(left, right);
        self.recording = false;

        match outcome {
            Ok(unified) => {
                self.trail.clear();
                Ok(unified)
            }
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    fn solve(&mut self, left: &UnitExp, right: &UnitExp) -> Result<UnitExp, NoSolution> {
        let combined = self.resolve(&left.divide_by(right)?)?;
        self.unify_to_one(combined)?;
        Ok(self.resolve(left)?)
    }

    fn find(&mut self, var: UnitVarId) -> Result<UnitExp, ExponentOverflow> {
        let Some(bound) = self.bindings.get(var.index()).cloned().flatten() else {
            return Ok(UnitExp::from_var(var));
        };
        let resolved = self.resolve(&bound)?;
        if resolved != bound {
            self.set(var, Some(resolved.clone()));
        }
        Ok(resolved)
    }

    fn set(&mut self, var: UnitVarId, value: Option<UnitExp>) {
        let previous = std::mem::replace(&mut self.bindings[var.index()], value);
        if self.recording {
            self.trail.push((var, previous));
        }
    }

    fn bind(&mut self, var: UnitVarId, exp: UnitExp) {
        log::debug!("unit variable {} := {}", var, exp);
        self.set(var, Some(exp));
    }

    fn rollback(&mut self) {
        while let Some((var, previous)) = self.trail.pop() {
            self.bindings[var.index()] = previous;
        }
    }

    fn unify_to_one(&mut self, mut exp: UnitExp) -> Result<(), NoSolution> {
        loop {
            if exp.is_scalar() {
                return Ok(());
            }

            let Some((var, power)) = exp.vars().min_by_key(|(var, power)| (power.unsigned_abs(), *var))
            else {
                return Err(NoSolution);
            };

            let others: Vec<(UnitAtom, i32)> = exp
                .atoms()
                .filter(|(atom, _)| **atom != UnitAtom::Var(var))
                .map(|(atom, p)| (atom.clone(), p))
                .collect();

            let divisor = i64::from(power);
            if others.iter().all(|(_, p)| i64::from(*p) % divisor == 0) {
                let mut solution = Vec::with_capacity(others.len());
                for (atom, p) in others {
                    solution.push((atom, negated(i64::from(p) / divisor)?));
                }
                self.bind(var, UnitExp::from_atoms(solution)?);
                return Ok(());
            }

            if !others.iter().any(|(atom, _)| matches!(atom, UnitAtom::Var(_))) {
                return Err(NoSolution);
            }

            let fresh = self.fresh();
            let mut substitution = vec![(UnitAtom::Var(fresh), 1)];
            for (atom, p) in others {
                substitution.push((atom, negated(i64::from(p).div_euclid(divisor))?));
            }
            self.bind(var, UnitExp::from_atoms(substitution)?);
            exp = self.resolve(&exp)?;
        }
    }
}

/// Exponent arithmetic in the solver runs in `i64`; only results must fit.
fn negated(quotient: i64) -> Result<i32, ExponentOverflow> {
    i32::try_from(-quotient).map_err(|_| ExponentOverflow)
}

impl UnitExp {
    /// Unify `self` with `other`, then rewrite both with the bindings found.
    pub fn unify_with(&mut self, other: &mut UnitExp, vars: &mut UnitVarTable) -> Result<(), NoSolution> {
        vars.unify(self, other)?;
        let left = vars.resolve(self)?;
        let right = vars.resolve(other)?;
        *self = left;
        *other = right;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metre() -> Unit {
        Unit::single("m")
    }

    fn second() -> Unit {
        Unit::single("s")
    }

    fn var_unit(vars: &mut UnitVarTable, var: UnitVarId) -> Option<Unit> {
        vars.to_concrete_unit(&UnitExp::from_var(var)).unwrap()
    }

    #[test]
    fn test_scalar_unifies_with_scalar() {
        let mut vars = UnitVarTable::new();
        let result = vars.unify(&UnitExp::scalar(), &UnitExp::scalar());
        assert_eq!(result, Ok(UnitExp::scalar()));
        assert!(vars.is_empty());
    }

    #[test]
    fn test_concrete_mismatch_has_no_solution() {
        let mut vars = UnitVarTable::new();
        let m = UnitExp::from_concrete(&metre());
        let s = UnitExp::from_concrete(&second());
        assert_eq!(vars.unify(&m, &s), Err(NoSolution));
        assert!(vars.unify(&m, &m).is_ok());
    }

    #[test]
    fn test_fresh_var_unifies_with_metre() {
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let mut left = UnitExp::from_var(v);
        let mut right = UnitExp::from_concrete(&metre());

        left.unify_with(&mut right, &mut vars).unwrap();

        assert!(vars.is_resolved(v));
        assert_eq!(var_unit(&mut vars, v), Some(metre()));
        assert_eq!(left, UnitExp::from_concrete(&metre()));
    }

    #[test]
    fn test_squared_var_against_metre_fails_and_leaves_var_free() {
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let squared = UnitExp::from_var(v).raise_by(2).unwrap();
        assert_eq!(vars.unify(&squared, &UnitExp::from_concrete(&metre())), Err(NoSolution));
        assert!(!vars.is_resolved(v));
        assert_eq!(var_unit(&mut vars, v), None);
    }

    #[test]
    fn test_squared_var_against_area() {
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let area = UnitExp::from_concrete(&metre().raise_by(2).unwrap());
        vars.unify(&UnitExp::from_var(v).raise_by(2).unwrap(), &area).unwrap();
        assert_eq!(var_unit(&mut vars, v), Some(metre()));
    }

    #[test]
    fn test_speed_times_var_is_distance() {
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let speed = UnitExp::from_concrete(&metre().divide_by(&second()).unwrap());
        let distance = UnitExp::from_concrete(&metre());
        vars.unify(&speed.times(&UnitExp::from_var(v)).unwrap(), &distance).unwrap();
        assert_eq!(var_unit(&mut vars, v), Some(second()));
    }

    #[test]
    fn test_two_vars_with_coprime_exponents() {
        // v^2 * w^3 = 1 has the family v = t^3, w = t^-2.
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let w = vars.fresh();
        let exp = UnitExp::from_var(v)
            .raise_by(2)
            .unwrap()
            .times(&UnitExp::from_var(w).raise_by(3).unwrap())
            .unwrap();
        vars.unify(&exp, &UnitExp::scalar()).unwrap();

        let resolved = vars.resolve(&exp).unwrap();
        assert!(resolved.is_scalar());
        assert_eq!(vars.resolve(&UnitExp::from_var(v)).unwrap().vars().count(), 1);
    }

    #[test]
    fn test_two_vars_bound_to_each_other() {
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let w = vars.fresh();
        vars.unify(&UnitExp::from_var(v), &UnitExp::from_var(w)).unwrap();
        vars.unify(&UnitExp::from_var(w), &UnitExp::from_concrete(&second()))
            .unwrap();
        assert_eq!(var_unit(&mut vars, v), Some(second()));
    }

    #[test]
    fn test_failed_multi_var_attempt_rolls_back() {
        // v^2 * w^2 = m has no integer solution, but the solver binds v
        // before discovering that.
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let w = vars.fresh();
        let exp = UnitExp::from_var(v)
            .raise_by(2)
            .unwrap()
            .times(&UnitExp::from_var(w).raise_by(2).unwrap())
            .unwrap();
        assert_eq!(vars.unify(&exp, &UnitExp::from_concrete(&metre())), Err(NoSolution));
        assert!(!vars.is_resolved(v));
        assert!(!vars.is_resolved(w));
    }

    #[test]
    fn test_unify_with_rewrites_both_sides() {
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let mut left = UnitExp::from_concrete(&metre()).times(&UnitExp::from_var(v)).unwrap();
        let mut right = UnitExp::from_concrete(&metre().times(&second()).unwrap());
        left.unify_with(&mut right, &mut vars).unwrap();
        assert_eq!(left, right);
        assert!(!left.has_vars());
    }

    #[test]
    fn test_exponent_overflow_has_no_solution() {
        let mut vars = UnitVarTable::new();
        let huge = UnitExp::from_concrete(&metre().raise_by(i32::MAX).unwrap());
        let inverse = UnitExp::from_concrete(&metre().reciprocal().unwrap());
        assert_eq!(vars.unify(&huge, &inverse), Err(NoSolution));

        // v = m^2, then v^(2^30) = s needs m^(2^31).
        let v = vars.fresh();
        let area = UnitExp::from_concrete(&metre().raise_by(2).unwrap());
        vars.unify(&UnitExp::from_var(v), &area).unwrap();
        let big_power = UnitExp::from_var(v).raise_by(1 << 30).unwrap();
        let s = UnitExp::from_concrete(&second());
        assert_eq!(vars.unify(&big_power, &s), Err(NoSolution));
        assert_eq!(var_unit(&mut vars, v), Some(metre().raise_by(2).unwrap()));
        assert!(vars.resolve(&big_power).is_err());
    }

    #[test]
    fn test_min_exponent_does_not_panic() {
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let w = vars.fresh();
        let left = UnitExp::from_var(v).raise_by(i32::MIN).unwrap();
        assert_eq!(vars.unify(&left, &UnitExp::from_var(w)), Ok(left.clone()));
        assert_eq!(vars.resolve(&UnitExp::from_var(w)), Ok(left.clone()));

        // w^-1 would need the exponent 2^31.
        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let w = vars.fresh();
        let inverse = left.times(&UnitExp::from_var(w).raise_by(-1).unwrap()).unwrap();
        assert_eq!(vars.unify(&inverse, &UnitExp::scalar()), Err(NoSolution));
        assert!(!vars.is_resolved(v));
        assert!(!vars.is_resolved(w));

        let mut vars = UnitVarTable::new();
        let v = vars.fresh();
        let lone = UnitExp::from_var(v).raise_by(i32::MIN).unwrap();
        let m = UnitExp::from_concrete(&metre());
        assert_eq!(vars.unify(&lone, &m), Err(NoSolution));
        assert!(!vars.is_resolved(v));
    }
}
