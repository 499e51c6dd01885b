//! Error types for gridtypes core.

use thiserror::Error;

use gridtypes_engine::error::InternalError;
use gridtypes_engine::units::ExponentOverflow;

/// Errors raised while declaring, loading or saving types and literals.
#[derive(Error, Debug)]
pub enum GridtypesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown type variable: {0}")]
    UnknownTypeVariable(String),

    #[error("Type {name} expects {expected} but was given {found}")]
    TypeArgumentMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Duplicate tag {tag} in type {type_name}")]
    DuplicateTag { type_name: String, tag: String },

    #[error("Recursive types cannot be saved: {}", .0.join(", "))]
    RecursiveTypes(Vec<String>),

    #[error("Invalid literal: {0}")]
    Literal(String),

    #[error("Invalid unit: {0}")]
    Unit(#[from] ExponentOverflow),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

pub type Result<T> = std::result::Result<T, GridtypesError>;
