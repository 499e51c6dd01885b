//! Declared (possibly generic) tagged types.
//!
//! A declaration body is written in terms of [`TypeExpr`]: the same shapes as
//! [`DataType`] plus references to other tagged types by name and to the
//! declaration's own type and unit variables. [`TaggedTypeDefinition::instantiate`]
//! substitutes concrete arguments and produces the concrete `DataType`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use gridtypes_engine::error::InternalError;
use gridtypes_engine::types::{DataType, DateTimeType, NumberInfo, TagType, TypeArg, TypeId};
use gridtypes_engine::units::{ExponentOverflow, SingleUnit, Unit, UnitExp, UnitVarId, UnitVarTable};

use super::TypeManager;
use crate::error::{GridtypesError, Result};

/// One factor of a [`UnitExpr`].
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum UnitTerm {
    Named(SingleUnit),
    Var(String),
}

/// A unit that may mention unit variables by name, e.g. `m/@UNITVAR u`.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct UnitExpr {
    terms: BTreeMap<UnitTerm, i32>,
}

impl UnitExpr {
    pub fn scalar() -> UnitExpr {
        UnitExpr::default()
    }

    /// Sum the powers of repeated terms, e.g. `m*m` is `m^2`.
    pub fn from_terms(
        terms: impl IntoIterator<Item = (UnitTerm, i32)>,
    ) -> std::result::Result<UnitExpr, ExponentOverflow> {
        let mut map = BTreeMap::new();
        for (term, power) in terms {
            let slot = map.entry(term).or_insert(0i32);
            *slot = slot.checked_add(power).ok_or(ExponentOverflow)?;
        }
        map.retain(|_, power| *power != 0);
        Ok(UnitExpr { terms: map })
    }

    pub fn from_unit(unit: &Unit) -> UnitExpr {
        UnitExpr {
            terms: unit
                .iter()
                .map(|(u, p)| (UnitTerm::Named(u.clone()), p))
                .collect(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&UnitTerm, i32)> {
        self.terms.iter().map(|(term, power)| (term, *power))
    }

    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().filter_map(|term| match term {
            UnitTerm::Var(name) => Some(name.as_str()),
            UnitTerm::Named(_) => None,
        })
    }

    /// Replace every variable with its unit. Unbound variables are an error.
    pub fn substitute(&self, units: &HashMap<String, Unit>) -> Result<Unit> {
        let mut unit = Unit::scalar();
        for (term, power) in &self.terms {
            let factor = match term {
                UnitTerm::Named(single) => Unit::single(single.name()),
                UnitTerm::Var(name) => units
                    .get(name)
                    .cloned()
                    .ok_or_else(|| GridtypesError::UnknownTypeVariable(format!("@UNITVAR {}", name)))?,
            };
            unit = unit.times(&factor.raise_by(*power)?)?;
        }
        Ok(unit)
    }

    pub fn to_unit(&self) -> Result<Unit> {
        self.substitute(&HashMap::new())
    }

    /// Build a [`UnitExp`] for inference, allocating one unit variable per
    /// distinct variable name (reusing entries already in `names`).
    pub fn to_unit_exp(
        &self,
        names: &mut BTreeMap<String, UnitVarId>,
        table: &mut UnitVarTable,
    ) -> std::result::Result<UnitExp, ExponentOverflow> {
        let mut exp = UnitExp::scalar();
        for (term, power) in &self.terms {
            let factor = match term {
                UnitTerm::Named(single) => UnitExp::from_concrete(&Unit::single(single.name())),
                UnitTerm::Var(name) => {
                    let var = *names.entry(name.clone()).or_insert_with(|| table.fresh());
                    UnitExp::from_var(var)
                }
            };
            exp = exp.times(&factor.raise_by(*power)?)?;
        }
        Ok(exp)
    }
}

impl fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |term: &UnitTerm| match term {
            UnitTerm::Named(single) => single.name().to_string(),
            UnitTerm::Var(var) => format!("@UNITVAR {}", var),
        };
        let (positive, negative): (Vec<_>, Vec<_>) = self.terms.iter().partition(|(_, p)| **p > 0);
        if positive.is_empty() {
            f.write_str("1")?;
        }
        for (idx, (term, power)) in positive.iter().enumerate() {
            if idx > 0 {
                f.write_str("*")?;
            }
            write_power(f, &name(*term), **power)?;
        }
        for (term, power) in &negative {
            f.write_str("/")?;
            write_power(f, &name(*term), -**power)?;
        }
        Ok(())
    }
}

fn write_power(f: &mut fmt::Formatter<'_>, name: &str, power: i32) -> fmt::Result {
    if power == 1 {
        f.write_str(name)
    } else {
        write!(f, "{}^{}", name, power)
    }
}

/// A type and unit variable declared by a generic tagged type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TypeVarDecl {
    Type(String),
    Unit(String),
}

impl TypeVarDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeVarDecl::Type(name) | TypeVarDecl::Unit(name) => name,
        }
    }
}

impl fmt::Display for TypeVarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeVarDecl::Type(name) => write!(f, "@TYPEVAR {}", name),
            TypeVarDecl::Unit(name) => write!(f, "@UNITVAR {}", name),
        }
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TypeArgExpr {
    Unit(UnitExpr),
    Type(TypeExpr),
}

/// A type as written in a declaration.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TypeExpr {
    Number { unit: UnitExpr, min_dp: u8 },
    Text,
    DateTime(DateTimeType),
    Boolean,
    Tagged { name: TypeId, args: Vec<TypeArgExpr> },
    Tuple(Vec<TypeExpr>),
    Array(Option<Box<TypeExpr>>),
    Function(Box<TypeExpr>, Box<TypeExpr>),
    Var(String),
}

/// Concrete values for a definition's variables.
#[derive(Default)]
pub(crate) struct Substitution {
    types: HashMap<String, DataType>,
    units: HashMap<String, Unit>,
}

impl TypeExpr {
    /// The expression that resolves back to `data_type`.
    pub fn from_data_type(data_type: &DataType) -> TypeExpr {
        match data_type {
            DataType::Number(info) => TypeExpr::Number {
                unit: UnitExpr::from_unit(&info.unit),
                min_dp: info.min_dp,
            },
            DataType::Text => TypeExpr::Text,
            DataType::DateTime(info) => TypeExpr::DateTime(info.granularity),
            DataType::Boolean => TypeExpr::Boolean,
            DataType::Tagged(tagged) => TypeExpr::Tagged {
                name: tagged.name.clone(),
                args: tagged
                    .type_args
                    .iter()
                    .map(|arg| match arg {
                        TypeArg::Unit(unit) => TypeArgExpr::Unit(UnitExpr::from_unit(unit)),
                        TypeArg::Type(ty) => TypeArgExpr::Type(TypeExpr::from_data_type(ty)),
                    })
                    .collect(),
            },
            DataType::Tuple(members) => TypeExpr::Tuple(members.iter().map(TypeExpr::from_data_type).collect()),
            DataType::Array(element) => {
                TypeExpr::Array(element.as_deref().map(|e| Box::new(TypeExpr::from_data_type(e))))
            }
            DataType::Function(arg, result) => TypeExpr::Function(
                Box::new(TypeExpr::from_data_type(arg)),
                Box::new(TypeExpr::from_data_type(result)),
            ),
        }
    }

    /// Resolve a closed expression (one without variables) to a concrete type.
    pub fn resolve(&self, manager: &TypeManager) -> Result<DataType> {
        self.resolve_with(&Substitution::default(), manager)
    }

    pub(crate) fn resolve_with(&self, subst: &Substitution, manager: &TypeManager) -> Result<DataType> {
        Ok(match self {
            TypeExpr::Number { unit, min_dp } => {
                DataType::number_with(NumberInfo::new(unit.substitute(&subst.units)?, *min_dp))
            }
            TypeExpr::Text => DataType::text(),
            TypeExpr::DateTime(granularity) => DataType::date(*granularity),
            TypeExpr::Boolean => DataType::boolean(),
            TypeExpr::Tagged { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| match arg {
                        TypeArgExpr::Unit(unit) => unit.substitute(&subst.units).map(TypeArg::Unit),
                        TypeArgExpr::Type(ty) => ty.resolve_with(subst, manager).map(TypeArg::Type),
                    })
                    .collect::<Result<Vec<_>>>()?;
                manager.lookup_type(name.as_str(), &args)?
            }
            TypeExpr::Tuple(members) => DataType::tuple(
                members
                    .iter()
                    .map(|m| m.resolve_with(subst, manager))
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypeExpr::Array(None) => DataType::empty_array(),
            TypeExpr::Array(Some(element)) => DataType::array_of(element.resolve_with(subst, manager)?),
            TypeExpr::Function(arg, result) => DataType::function(
                arg.resolve_with(subst, manager)?,
                result.resolve_with(subst, manager)?,
            ),
            TypeExpr::Var(name) => subst
                .types
                .get(name)
                .cloned()
                .ok_or_else(|| GridtypesError::UnknownTypeVariable(format!("@TYPEVAR {}", name)))?,
        })
    }

    /// Names of tagged types this expression mentions, at any depth.
    pub fn referenced_types(&self, out: &mut BTreeSet<TypeId>) {
        match self {
            TypeExpr::Tagged { name, args } => {
                out.insert(name.clone());
                for arg in args {
                    if let TypeArgExpr::Type(ty) = arg {
                        ty.referenced_types(out);
                    }
                }
            }
            TypeExpr::Tuple(members) => members.iter().for_each(|m| m.referenced_types(out)),
            TypeExpr::Array(Some(element)) => element.referenced_types(out),
            TypeExpr::Function(arg, result) => {
                arg.referenced_types(out);
                result.referenced_types(out);
            }
            TypeExpr::Number { .. }
            | TypeExpr::Text
            | TypeExpr::DateTime(_)
            | TypeExpr::Boolean
            | TypeExpr::Array(None)
            | TypeExpr::Var(_) => {}
        }
    }

    /// Every variable the expression uses, in order of first use.
    pub fn free_vars(&self, out: &mut Vec<TypeVarDecl>) {
        let push = |decl: TypeVarDecl, out: &mut Vec<TypeVarDecl>| {
            if !out.contains(&decl) {
                out.push(decl);
            }
        };
        match self {
            TypeExpr::Number { unit, .. } => {
                for name in unit.var_names() {
                    push(TypeVarDecl::Unit(name.to_string()), out);
                }
            }
            TypeExpr::Tagged { args, .. } => {
                for arg in args {
                    match arg {
                        TypeArgExpr::Unit(unit) => {
                            for name in unit.var_names() {
                                push(TypeVarDecl::Unit(name.to_string()), out);
                            }
                        }
                        TypeArgExpr::Type(ty) => ty.free_vars(out),
                    }
                }
            }
            TypeExpr::Tuple(members) => members.iter().for_each(|m| m.free_vars(out)),
            TypeExpr::Array(Some(element)) => element.free_vars(out),
            TypeExpr::Function(arg, result) => {
                arg.free_vars(out);
                result.free_vars(out);
            }
            TypeExpr::Var(name) => push(TypeVarDecl::Type(name.clone()), out),
            TypeExpr::Text | TypeExpr::DateTime(_) | TypeExpr::Boolean | TypeExpr::Array(None) => {}
        }
    }

    /// Point references at renamed types.
    pub fn rename_types(&mut self, renames: &HashMap<TypeId, TypeId>) {
        match self {
            TypeExpr::Tagged { name, args } => {
                if let Some(renamed) = renames.get(name) {
                    *name = renamed.clone();
                }
                for arg in args {
                    if let TypeArgExpr::Type(ty) = arg {
                        ty.rename_types(renames);
                    }
                }
            }
            TypeExpr::Tuple(members) => members.iter_mut().for_each(|m| m.rename_types(renames)),
            TypeExpr::Array(Some(element)) => element.rename_types(renames),
            TypeExpr::Function(arg, result) => {
                arg.rename_types(renames);
                result.rename_types(renames);
            }
            _ => {}
        }
    }
}

/// Name of the builtin optional type.
pub const OPTIONAL: &str = "Optional";

/// A declared tagged type: name, variables and tag bodies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedTypeDefinition {
    name: TypeId,
    type_vars: Vec<TypeVarDecl>,
    tags: Vec<TagType<TypeExpr>>,
}

impl TaggedTypeDefinition {
    /// Validate and build a definition. Needs at least one tag, distinct tag
    /// and variable names, and every variable used in a body declared.
    pub fn new(name: TypeId, type_vars: Vec<TypeVarDecl>, tags: Vec<TagType<TypeExpr>>) -> Result<Self> {
        if tags.is_empty() {
            return Err(InternalError::NoTags(name.to_string()).raise().into());
        }

        let mut seen_tags = BTreeSet::new();
        for tag in &tags {
            if !seen_tags.insert(tag.name.as_str()) {
                return Err(GridtypesError::DuplicateTag {
                    type_name: name.to_string(),
                    tag: tag.name.clone(),
                });
            }
        }

        let mut seen_vars = BTreeSet::new();
        for var in &type_vars {
            if !seen_vars.insert(var.name()) {
                return Err(GridtypesError::TypeArgumentMismatch {
                    name: name.to_string(),
                    expected: "distinct variable names".to_string(),
                    found: format!("{} twice", var.name()),
                });
            }
        }

        let mut used = Vec::new();
        for tag in &tags {
            if let Some(inner) = &tag.inner {
                inner.free_vars(&mut used);
            }
        }
        if let Some(undeclared) = used.iter().find(|var| !type_vars.contains(var)) {
            return Err(GridtypesError::UnknownTypeVariable(undeclared.to_string()));
        }

        Ok(TaggedTypeDefinition { name, type_vars, tags })
    }

    pub fn name(&self) -> &TypeId {
        &self.name
    }

    pub fn type_vars(&self) -> &[TypeVarDecl] {
        &self.type_vars
    }

    pub fn tags(&self) -> &[TagType<TypeExpr>] {
        &self.tags
    }

    pub fn is_generic(&self) -> bool {
        !self.type_vars.is_empty()
    }

    /// The builtin `Optional(@TYPEVAR t) TAGGED None | Is(@TYPEVAR t)`.
    pub(crate) fn optional() -> TaggedTypeDefinition {
        TaggedTypeDefinition {
            name: TypeId::new(OPTIONAL),
            type_vars: vec![TypeVarDecl::Type("t".to_string())],
            tags: vec![
                TagType::new("None", None),
                TagType::new("Is", Some(TypeExpr::Var("t".to_string()))),
            ],
        }
    }

    pub(crate) fn rename_references(&mut self, renames: &HashMap<TypeId, TypeId>) {
        for tag in &mut self.tags {
            if let Some(inner) = &mut tag.inner {
                inner.rename_types(renames);
            }
        }
    }

    pub(crate) fn with_name(&self, name: TypeId) -> TaggedTypeDefinition {
        TaggedTypeDefinition {
            name,
            type_vars: self.type_vars.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Tagged types mentioned by any tag body.
    pub fn referenced_types(&self) -> BTreeSet<TypeId> {
        let mut out = BTreeSet::new();
        for tag in &self.tags {
            if let Some(inner) = &tag.inner {
                inner.referenced_types(&mut out);
            }
        }
        out
    }

    /// Substitute `args` for the declared variables, in order.
    pub fn instantiate(&self, args: &[TypeArg], manager: &TypeManager) -> Result<DataType> {
        if args.len() != self.type_vars.len() {
            return Err(GridtypesError::TypeArgumentMismatch {
                name: self.name.to_string(),
                expected: format!("{} type arguments", self.type_vars.len()),
                found: args.len().to_string(),
            });
        }

        let mut subst = Substitution::default();
        for (var, arg) in self.type_vars.iter().zip(args) {
            match (var, arg) {
                (TypeVarDecl::Type(name), TypeArg::Type(ty)) => {
                    subst.types.insert(name.clone(), ty.clone());
                }
                (TypeVarDecl::Unit(name), TypeArg::Unit(unit)) => {
                    subst.units.insert(name.clone(), unit.clone());
                }
                _ => {
                    return Err(GridtypesError::TypeArgumentMismatch {
                        name: self.name.to_string(),
                        expected: format!("an argument for {}", var),
                        found: arg.to_string(),
                    });
                }
            }
        }

        let tags = self
            .tags
            .iter()
            .map(|tag| tag.try_map(|inner| inner.resolve_with(&subst, manager)))
            .collect::<Result<Vec<_>>>()?;
        Ok(DataType::tagged(self.name.clone(), args.to_vec(), tags)?)
    }
}
