//! Textual storage for type declarations and literals, plus in-memory columns

mod column;
mod lexer;
mod parser;
mod writer;

pub use column::{MemoryColumn, memory_value};
pub use parser::{parse_declarations, parse_type, parse_unit, parse_value};
pub use writer::{OutputBuilder, write_declaration, write_type, write_type_expr, write_value};
