//! Column types.
//!
//! - [`DataType`]: the closed union of column types
//! - [`NumberInfo`] / [`DateTimeInfo`]: per-kind refinements
//! - [`check_same`]: structural unification with user-facing mismatch reports
//! - [`DateTimeFormats`]: strict and flexible date/time patterns

mod data_type;
mod datetime;
mod number;
mod type_id;
mod unify;

pub use data_type::{DataType, TagType, TaggedType, TypeArg, TypeKind};
pub use datetime::{
    Candidate, DateTimeFormats, DateTimeInfo, DateTimeType, FlexibleParse, FormatAlternative,
    GranularityFormats, TemporalValue, YearMonth,
};
pub use number::NumberInfo;
pub use type_id::TypeId;
pub use unify::{MismatchReason, TypeMismatch, TypeRelation, check_same};
