use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The name of a tagged type. Cheap to clone; compared by content.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TypeId(Arc<str>);

impl TypeId {
    pub fn new(name: &str) -> TypeId {
        TypeId(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeId {
    fn from(name: &str) -> Self {
        TypeId::new(name)
    }
}

impl From<String> for TypeId {
    fn from(name: String) -> Self {
        TypeId(Arc::from(name))
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
