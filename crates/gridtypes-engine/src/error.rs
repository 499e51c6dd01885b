//! Error types for the gridtypes engine.
//!
//! Two tiers:
//! - [`InternalError`] marks a defect in the type model or its callers (asking a
//!   tuple for its tags, a tagged type with no tags, a remapped view whose
//!   source has a different shape). These are logged when raised and always
//!   propagated.
//! - [`ValueError`] covers failures reading or writing a row through a
//!   column accessor.

use thiserror::Error;

/// A defect in the engine or in the code driving it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("Expected a {expected} but found {found}")]
    WrongKind { expected: String, found: String },

    #[error("Tagged type {0} has no tags")]
    NoTags(String),

    #[error("Tag index {index} out of range for {type_name} ({tag_count} tags)")]
    TagOutOfRange {
        type_name: String,
        index: usize,
        tag_count: usize,
    },

    #[error("Value shape does not match type {0}")]
    ShapeMismatch(String),

    #[error("Function types cannot back a column")]
    FunctionColumn,

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl InternalError {
    /// Log and return the error. Every internal error is raised through here.
    pub fn raise(self) -> Self {
        log::error!("internal error: {}", self);
        self
    }

    pub fn wrong_kind(expected: impl Into<String>, found: impl Into<String>) -> Self {
        InternalError::WrongKind {
            expected: expected.into(),
            found: found.into(),
        }
        .raise()
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        InternalError::Invariant(message.into()).raise()
    }
}

/// Errors raised while reading or writing rows through a column accessor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Column is not editable")]
    NotEditable,

    #[error("No value at row {0}")]
    MissingRow(usize),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

pub type ValueResult<T> = std::result::Result<T, ValueError>;
