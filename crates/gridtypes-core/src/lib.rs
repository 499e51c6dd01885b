//! gridtypes-core - Tagged type registry, declaration storage and memory columns.

pub mod error;
pub mod registry;
pub mod storage;

pub use error::{GridtypesError, Result};
pub use registry::TypeManager;

pub use gridtypes_engine::types::DataType;
