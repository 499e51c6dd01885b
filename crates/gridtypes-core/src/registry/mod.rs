//! Tagged type registry.
//!
//! - [`TaggedTypeDefinition`]: a declared, possibly generic, tagged type
//! - [`TypeExpr`] / [`UnitExpr`]: declaration bodies before instantiation
//! - [`TypeManager`]: name-keyed registry with dedup, renaming and save/load

mod definition;
mod manager;
mod order;

pub use definition::{
    OPTIONAL, TaggedTypeDefinition, TypeArgExpr, TypeExpr, TypeVarDecl, UnitExpr, UnitTerm,
};
pub use manager::{TypeManager, increase_number};
