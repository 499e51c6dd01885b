//! In-memory columns.
//!
//! [`MemoryColumn`] is a sparse, editable row store. [`memory_value`] builds a
//! complete [`DataTypeValue`] tree over fresh memory columns for any type that
//! can be stored in a column.

use std::sync::Arc;

use dashmap::DashMap;
use gridtypes_engine::error::{InternalError, ValueError, ValueResult};
use gridtypes_engine::types::DataType;
use gridtypes_engine::value::{ColumnAccess, DataTypeValue, ProgressListener};

/// Rows keyed by index. Rows never written read as [`ValueError::MissingRow`].
#[derive(Debug)]
pub struct MemoryColumn<T> {
    rows: DashMap<usize, T>,
}

impl<T> MemoryColumn<T> {
    pub fn new() -> Self {
        MemoryColumn { rows: DashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T> Default for MemoryColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> ColumnAccess<T> for MemoryColumn<T> {
    fn get_with_progress(&self, index: usize, progress: &mut dyn ProgressListener) -> ValueResult<T> {
        let value = self
            .rows
            .get(&index)
            .map(|row| row.value().clone())
            .ok_or(ValueError::MissingRow(index))?;
        progress.progress(1.0);
        Ok(value)
    }

    fn set(&self, index: usize, value: T) -> ValueResult<()> {
        self.rows.insert(index, value);
        Ok(())
    }

    fn is_editable(&self) -> bool {
        true
    }
}

/// An editable value of `data_type` backed by empty memory columns.
pub fn memory_value(data_type: &DataType) -> Result<DataTypeValue, InternalError> {
    Ok(match data_type {
        DataType::Number(info) => DataTypeValue::number(info.clone(), Arc::new(MemoryColumn::new())),
        DataType::Text => DataTypeValue::text(Arc::new(MemoryColumn::new())),
        DataType::DateTime(info) => DataTypeValue::date(*info, Arc::new(MemoryColumn::new())),
        DataType::Boolean => DataTypeValue::boolean(Arc::new(MemoryColumn::new())),
        DataType::Tagged(_) => {
            let inner = data_type
                .tags()?
                .iter()
                .map(|tag| tag.inner.as_ref().map(memory_value).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            DataTypeValue::tagged(data_type.clone(), Arc::new(MemoryColumn::new()), inner)?
        }
        DataType::Tuple(members) => {
            DataTypeValue::tuple(members.iter().map(memory_value).collect::<Result<Vec<_>, _>>()?)
        }
        DataType::Array(_) => DataTypeValue::array(data_type.clone(), Arc::new(MemoryColumn::new()))?,
        DataType::Function(_, _) => return Err(InternalError::FunctionColumn.raise()),
    })
}
