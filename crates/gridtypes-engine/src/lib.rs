//! gridtypes_engine - Column type model, unit inference and value accessors.
//!
//! - [`types`]: the closed [`DataType`](types::DataType) union and `check_same`
//! - [`units`]: units of measure and unit-variable unification
//! - [`value`]: cell values and [`DataTypeValue`](value::DataTypeValue)
//! - [`error`]: internal and row-access errors

pub mod error;
pub mod types;
pub mod units;
pub mod value;
