//! Cell values and the column accessor layer.

mod access;
mod cell_value;
mod data_type_value;

pub use access::{ColumnAccess, IndexMapper, ProgressListener};
pub(crate) use access::MappedColumn;
pub use cell_value::{CellValue, NumberValue};
pub use data_type_value::{CollapsedSetter, DataTypeValue, ValueAccess};
