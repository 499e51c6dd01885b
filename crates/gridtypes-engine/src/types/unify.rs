//! Structural comparison of two column types.
//!
//! [`check_same`] decides whether two types describe the same column shape and
//! returns the unified type. It never fails with an error: each mismatch is
//! handed to the caller's `on_error` callback and `None` is returned, so the
//! caller can collect, display or ignore the report.
//!
//! Rules:
//! - numbers need equal units, date/times equal granularity
//! - tagged types need the same name and pairwise-equal type arguments; tag
//!   bodies are never compared because a name fixes its tags
//! - tuples need equal arity and element-wise agreement
//! - the empty array agrees with any array
//! - different kinds never agree

use std::fmt;

use super::{DataType, TypeArg};

/// How mismatch messages are phrased.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeRelation {
    /// Neither side is authoritative: "Types differ: A and B".
    Symmetric,
    /// The first type is what was expected: "Expected A but found B".
    ExpectedA,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MismatchReason {
    KindDiffers,
    UnitDiffers,
    GranularityDiffers,
    TaggedNameDiffers,
    TypeArgumentDiffers,
    TupleArity { left: usize, right: usize },
}

/// A user-facing report of two types that do not agree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeMismatch {
    pub reason: MismatchReason,
    pub message: String,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Unify `a` and `b`. Returns the unified type (keeping `a`'s metadata, such as
/// decimal places) or `None` after reporting the first mismatch to `on_error`.
pub fn check_same(
    a: &DataType,
    b: &DataType,
    relation: TypeRelation,
    on_error: &mut dyn FnMut(TypeMismatch),
) -> Option<DataType> {
    match (a, b) {
        (DataType::Number(x), DataType::Number(y)) => {
            if x.same_type(y) {
                Some(a.clone())
            } else {
                report(relation, a, b, MismatchReason::UnitDiffers, on_error)
            }
        }
        (DataType::Text, DataType::Text) | (DataType::Boolean, DataType::Boolean) => Some(a.clone()),
        (DataType::DateTime(x), DataType::DateTime(y)) => {
            if x.same_type(y) {
                Some(a.clone())
            } else {
                report(relation, a, b, MismatchReason::GranularityDiffers, on_error)
            }
        }
        (DataType::Tagged(x), DataType::Tagged(y)) => {
            if x.name != y.name {
                return report(relation, a, b, MismatchReason::TaggedNameDiffers, on_error);
            }
            if x.type_args.len() != y.type_args.len() {
                return report(relation, a, b, MismatchReason::TypeArgumentDiffers, on_error);
            }
            for (left, right) in x.type_args.iter().zip(&y.type_args) {
                match (left, right) {
                    (TypeArg::Unit(l), TypeArg::Unit(r)) if l == r => {}
                    (TypeArg::Type(l), TypeArg::Type(r)) => {
                        check_same(l, r, relation, on_error)?;
                    }
                    _ => return report(relation, a, b, MismatchReason::TypeArgumentDiffers, on_error),
                }
            }
            Some(a.clone())
        }
        (DataType::Tuple(xs), DataType::Tuple(ys)) => {
            if xs.len() != ys.len() {
                let reason = MismatchReason::TupleArity {
                    left: xs.len(),
                    right: ys.len(),
                };
                return report(relation, a, b, reason, on_error);
            }
            let mut unified = Vec::with_capacity(xs.len());
            for (x, y) in xs.iter().zip(ys) {
                unified.push(check_same(x, y, relation, on_error)?);
            }
            Some(DataType::Tuple(unified))
        }
        (DataType::Array(x), DataType::Array(y)) => match (x, y) {
            (None, _) => Some(b.clone()),
            (_, None) => Some(a.clone()),
            (Some(x), Some(y)) => check_same(x, y, relation, on_error).map(DataType::array_of),
        },
        (DataType::Function(a_arg, a_res), DataType::Function(b_arg, b_res)) => {
            let arg = check_same(a_arg, b_arg, relation, on_error)?;
            let result = check_same(a_res, b_res, relation, on_error)?;
            Some(DataType::function(arg, result))
        }
        _ => report(relation, a, b, MismatchReason::KindDiffers, on_error),
    }
}

fn report(
    relation: TypeRelation,
    a: &DataType,
    b: &DataType,
    reason: MismatchReason,
    on_error: &mut dyn FnMut(TypeMismatch),
) -> Option<DataType> {
    let mut message = match relation {
        TypeRelation::Symmetric => format!("Types differ: {} and {}", a, b),
        TypeRelation::ExpectedA => format!("Expected {} but found {}", a, b),
    };
    if let MismatchReason::TupleArity { left, right } = &reason {
        message.push_str(&format!(" (tuple sizes {} and {})", left, right));
    }
    on_error(TypeMismatch { reason, message });
    None
}

impl DataType {
    /// Method form of [`check_same`].
    pub fn check_same(
        &self,
        other: &DataType,
        relation: TypeRelation,
        on_error: &mut dyn FnMut(TypeMismatch),
    ) -> Option<DataType> {
        check_same(self, other, relation, on_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateTimeType, NumberInfo, TagType, TypeId};
    use crate::units::Unit;

    fn collect(a: &DataType, b: &DataType, relation: TypeRelation) -> (Option<DataType>, Vec<TypeMismatch>) {
        let mut errors = Vec::new();
        let result = check_same(a, b, relation, &mut |e| errors.push(e));
        (result, errors)
    }

    fn metres() -> DataType {
        DataType::number_with(NumberInfo::new(Unit::single("m"), 2))
    }

    fn tagged(name: &str, args: Vec<TypeArg>) -> DataType {
        DataType::tagged(
            TypeId::new(name),
            args,
            vec![TagType::new("A", None), TagType::new("B", Some(DataType::text()))],
        )
        .unwrap()
    }

    fn every_kind() -> Vec<DataType> {
        vec![
            metres(),
            DataType::text(),
            DataType::date(DateTimeType::DateTimeZoned),
            DataType::boolean(),
            tagged("Opt", vec![TypeArg::Type(DataType::number()), TypeArg::Unit(Unit::single("s"))]),
            DataType::tuple(vec![DataType::number(), DataType::text()]),
            DataType::array_of(DataType::boolean()),
            DataType::empty_array(),
            DataType::function(DataType::number(), DataType::text()),
        ]
    }

    #[test]
    fn test_reflexive_without_errors() {
        for ty in every_kind() {
            let (result, errors) = collect(&ty, &ty, TypeRelation::Symmetric);
            assert_eq!(result, Some(ty.clone()));
            assert!(errors.is_empty());
        }
    }

    #[test]
    fn test_success_is_symmetric() {
        let kinds = every_kind();
        for a in &kinds {
            for b in &kinds {
                let (ab, _) = collect(a, b, TypeRelation::Symmetric);
                let (ba, _) = collect(b, a, TypeRelation::Symmetric);
                assert_eq!(ab.is_some(), ba.is_some(), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_result_keeps_first_metadata() {
        let other = DataType::number_with(NumberInfo::new(Unit::single("m"), 0));
        let (result, _) = collect(&metres(), &other, TypeRelation::Symmetric);
        match result {
            Some(DataType::Number(info)) => assert_eq!(info.min_dp, 2),
            other => panic!("Expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_array_unifies_with_any_array() {
        let full = DataType::array_of(DataType::text());
        let empty = DataType::empty_array();

        assert_eq!(collect(&empty, &full, TypeRelation::Symmetric).0, Some(full.clone()));
        assert_eq!(collect(&full, &empty, TypeRelation::Symmetric).0, Some(full.clone()));
        assert_eq!(collect(&empty, &empty, TypeRelation::Symmetric).0, Some(empty.clone()));
    }

    #[test]
    fn test_tuple_arity_mismatch() {
        let one = DataType::tuple(vec![DataType::number()]);
        let two = DataType::tuple(vec![DataType::number(), DataType::text()]);
        let (result, errors) = collect(&one, &two, TypeRelation::Symmetric);
        assert!(result.is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reason, MismatchReason::TupleArity { left: 1, right: 2 });
    }

    #[test]
    fn test_tuple_element_mismatch_fails_whole_tuple() {
        let a = DataType::tuple(vec![DataType::number(), DataType::text()]);
        let b = DataType::tuple(vec![DataType::number(), DataType::boolean()]);
        let (result, errors) = collect(&a, &b, TypeRelation::Symmetric);
        assert!(result.is_none());
        assert_eq!(errors[0].reason, MismatchReason::KindDiffers);
    }

    #[test]
    fn test_messages_follow_relation() {
        let seconds = DataType::number_with(NumberInfo::with_unit(Unit::single("s")));
        let (_, symmetric) = collect(&metres(), &seconds, TypeRelation::Symmetric);
        assert_eq!(symmetric[0].message, "Types differ: Number{m} and Number{s}");
        assert_eq!(symmetric[0].reason, MismatchReason::UnitDiffers);

        let (_, expected) = collect(&metres(), &DataType::text(), TypeRelation::ExpectedA);
        assert_eq!(expected[0].message, "Expected Number{m} but found Text");
    }

    #[test]
    fn test_granularity_mismatch() {
        let (result, errors) = collect(
            &DataType::date(DateTimeType::YearMonthDay),
            &DataType::date(DateTimeType::YearMonth),
            TypeRelation::Symmetric,
        );
        assert!(result.is_none());
        assert_eq!(errors[0].reason, MismatchReason::GranularityDiffers);
    }

    #[test]
    fn test_tagged_compares_name_and_args_only() {
        let a = tagged("T", vec![TypeArg::Type(DataType::number())]);
        let same_name_other_tags = DataType::tagged(
            TypeId::new("T"),
            vec![TypeArg::Type(DataType::number())],
            vec![TagType::new("Z", None)],
        )
        .unwrap();
        assert!(collect(&a, &same_name_other_tags, TypeRelation::Symmetric).0.is_some());

        let renamed = tagged("U", vec![TypeArg::Type(DataType::number())]);
        let (_, errors) = collect(&a, &renamed, TypeRelation::Symmetric);
        assert_eq!(errors[0].reason, MismatchReason::TaggedNameDiffers);

        let other_arg = tagged("T", vec![TypeArg::Type(DataType::text())]);
        let (_, errors) = collect(&a, &other_arg, TypeRelation::Symmetric);
        assert_eq!(errors[0].reason, MismatchReason::KindDiffers);

        let unit_arg = tagged("T", vec![TypeArg::Unit(Unit::single("m"))]);
        let (_, errors) = collect(&a, &unit_arg, TypeRelation::Symmetric);
        assert_eq!(errors[0].reason, MismatchReason::TypeArgumentDiffers);
    }

    #[test]
    fn test_nested_array_unification() {
        let a = DataType::array_of(DataType::tuple(vec![DataType::empty_array(), DataType::text()]));
        let b = DataType::array_of(DataType::tuple(vec![
            DataType::array_of(DataType::number()),
            DataType::text(),
        ]));
        assert_eq!(collect(&a, &b, TypeRelation::Symmetric).0, Some(b.clone()));
    }
}
