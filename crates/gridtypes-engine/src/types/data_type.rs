//! The closed union of column types.
//!
//! A [`DataType`] is exactly one of number, text, date/time, boolean, tagged
//! union, tuple, array or function, with the payload for that kind and no
//! other. Code that needs per-kind behaviour matches on it directly; the
//! compiler checks the match is exhaustive.
//!
//! Equality is "same type": numbers compare by unit (decimal places are
//! display metadata), date/times by granularity, and compound types
//! structurally.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::{DateTimeInfo, DateTimeType, NumberInfo, TypeId};
use crate::error::InternalError;
use crate::units::Unit;

/// Which variant of [`DataType`] a value is.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum TypeKind {
    Number,
    Text,
    DateTime,
    Boolean,
    Tagged,
    Tuple,
    Array,
    Function,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeKind::Number => "number",
            TypeKind::Text => "text",
            TypeKind::DateTime => "date/time",
            TypeKind::Boolean => "boolean",
            TypeKind::Tagged => "tagged type",
            TypeKind::Tuple => "tuple",
            TypeKind::Array => "array",
            TypeKind::Function => "function",
        })
    }
}

/// One variant of a tagged type: a name and an optional payload.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct TagType<T> {
    pub name: String,
    pub inner: Option<T>,
}

impl<T> TagType<T> {
    pub fn new(name: &str, inner: Option<T>) -> TagType<T> {
        TagType {
            name: name.to_string(),
            inner,
        }
    }

    pub fn try_map<U, E>(&self, f: impl FnOnce(&T) -> Result<U, E>) -> Result<TagType<U>, E> {
        Ok(TagType {
            name: self.name.clone(),
            inner: self.inner.as_ref().map(f).transpose()?,
        })
    }
}

/// The substitution for one type variable of a tagged type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TypeArg {
    Unit(Unit),
    Type(DataType),
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArg::Unit(unit) => write!(f, "{{{}}}", unit),
            TypeArg::Type(ty) => write!(f, "{}", ty),
        }
    }
}

/// Payload of a tagged type: its name, the type arguments it was
/// instantiated with and its (non-empty) tag list.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct TaggedType {
    pub name: TypeId,
    pub type_args: Vec<TypeArg>,
    pub tags: Arc<Vec<TagType<DataType>>>,
}

#[derive(Clone, Debug)]
pub enum DataType {
    Number(NumberInfo),
    Text,
    DateTime(DateTimeInfo),
    Boolean,
    Tagged(TaggedType),
    Tuple(Vec<DataType>),
    /// `None` is the empty array, whose element type is not yet known.
    Array(Option<Box<DataType>>),
    Function(Box<DataType>, Box<DataType>),
}

impl DataType {
    pub fn number() -> DataType {
        DataType::Number(NumberInfo::default())
    }

    pub fn number_with(info: NumberInfo) -> DataType {
        DataType::Number(info)
    }

    pub fn text() -> DataType {
        DataType::Text
    }

    pub fn boolean() -> DataType {
        DataType::Boolean
    }

    pub fn date(granularity: DateTimeType) -> DataType {
        DataType::DateTime(DateTimeInfo::new(granularity))
    }

    /// Build a tagged type. A tagged type must have at least one tag.
    pub fn tagged(
        name: TypeId,
        type_args: Vec<TypeArg>,
        tags: Vec<TagType<DataType>>,
    ) -> Result<DataType, InternalError> {
        if tags.is_empty() {
            return Err(InternalError::NoTags(name.to_string()).raise());
        }
        Ok(DataType::Tagged(TaggedType {
            name,
            type_args,
            tags: Arc::new(tags),
        }))
    }

    pub fn tuple(members: Vec<DataType>) -> DataType {
        DataType::Tuple(members)
    }

    pub fn array_of(element: DataType) -> DataType {
        DataType::Array(Some(Box::new(element)))
    }

    pub fn empty_array() -> DataType {
        DataType::Array(None)
    }

    pub fn function(arg: DataType, result: DataType) -> DataType {
        DataType::Function(Box::new(arg), Box::new(result))
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            DataType::Number(_) => TypeKind::Number,
            DataType::Text => TypeKind::Text,
            DataType::DateTime(_) => TypeKind::DateTime,
            DataType::Boolean => TypeKind::Boolean,
            DataType::Tagged(_) => TypeKind::Tagged,
            DataType::Tuple(_) => TypeKind::Tuple,
            DataType::Array(_) => TypeKind::Array,
            DataType::Function(_, _) => TypeKind::Function,
        }
    }

    pub fn number_info(&self) -> Result<&NumberInfo, InternalError> {
        match self {
            DataType::Number(info) => Ok(info),
            other => Err(other.wrong_kind(TypeKind::Number)),
        }
    }

    pub fn date_time_info(&self) -> Result<&DateTimeInfo, InternalError> {
        match self {
            DataType::DateTime(info) => Ok(info),
            other => Err(other.wrong_kind(TypeKind::DateTime)),
        }
    }

    pub fn tagged_type(&self) -> Result<&TaggedType, InternalError> {
        match self {
            DataType::Tagged(tagged) => Ok(tagged),
            other => Err(other.wrong_kind(TypeKind::Tagged)),
        }
    }

    pub fn tags(&self) -> Result<&[TagType<DataType>], InternalError> {
        Ok(self.tagged_type()?.tags.as_slice())
    }

    pub fn members(&self) -> Result<&[DataType], InternalError> {
        match self {
            DataType::Tuple(members) => Ok(members),
            other => Err(other.wrong_kind(TypeKind::Tuple)),
        }
    }

    /// The element type of an array; `None` for the empty array.
    pub fn array_element(&self) -> Result<Option<&DataType>, InternalError> {
        match self {
            DataType::Array(element) => Ok(element.as_deref()),
            other => Err(other.wrong_kind(TypeKind::Array)),
        }
    }

    fn wrong_kind(&self, expected: TypeKind) -> InternalError {
        InternalError::wrong_kind(expected.to_string(), self.to_display(false))
    }

    /// Display form. With `drill_into_tagged`, a tagged type also lists its tags:
    /// `Shape <Circle:Number|Square:Number|Point>`.
    pub fn to_display(&self, drill_into_tagged: bool) -> String {
        match self {
            DataType::Number(info) => info.to_string(),
            DataType::Text => "Text".to_string(),
            DataType::DateTime(info) => info.to_string(),
            DataType::Boolean => "Boolean".to_string(),
            DataType::Tagged(tagged) => {
                let mut out = tagged.name.to_string();
                if !tagged.type_args.is_empty() {
                    let args: Vec<String> = tagged.type_args.iter().map(|a| a.to_string()).collect();
                    out.push_str(&format!("({})", args.join(", ")));
                }
                if drill_into_tagged {
                    let tags: Vec<String> = tagged
                        .tags
                        .iter()
                        .map(|tag| match &tag.inner {
                            Some(inner) => format!("{}:{}", tag.name, inner.to_display(false)),
                            None => tag.name.clone(),
                        })
                        .collect();
                    out.push_str(&format!(" <{}>", tags.join("|")));
                }
                out
            }
            DataType::Tuple(members) => {
                let members: Vec<String> = members.iter().map(|m| m.to_display(drill_into_tagged)).collect();
                format!("({})", members.join(", "))
            }
            DataType::Array(None) => "[]".to_string(),
            DataType::Array(Some(element)) => format!("[{}]", element.to_display(drill_into_tagged)),
            DataType::Function(arg, result) => format!(
                "({} -> {})",
                arg.to_display(drill_into_tagged),
                result.to_display(drill_into_tagged)
            ),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display(false))
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DataType::Number(a), DataType::Number(b)) => a.same_type(b),
            (DataType::Text, DataType::Text) => true,
            (DataType::DateTime(a), DataType::DateTime(b)) => a.same_type(b),
            (DataType::Boolean, DataType::Boolean) => true,
            (DataType::Tagged(a), DataType::Tagged(b)) => a == b,
            (DataType::Tuple(a), DataType::Tuple(b)) => a == b,
            (DataType::Array(a), DataType::Array(b)) => a == b,
            (DataType::Function(a_arg, a_res), DataType::Function(b_arg, b_res)) => {
                a_arg == b_arg && a_res == b_res
            }
            _ => false,
        }
    }
}

impl Eq for DataType {}

impl Hash for DataType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            DataType::Number(info) => info.unit.hash(state),
            DataType::Text | DataType::Boolean => {}
            DataType::DateTime(info) => info.granularity.hash(state),
            DataType::Tagged(tagged) => tagged.hash(state),
            DataType::Tuple(members) => members.hash(state),
            DataType::Array(element) => element.hash(state),
            DataType::Function(arg, result) => {
                arg.hash(state);
                result.hash(state);
            }
        }
    }
}
