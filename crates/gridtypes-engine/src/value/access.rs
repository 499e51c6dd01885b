use std::sync::Arc;

use crate::error::{InternalError, ValueError, ValueResult};

/// Receives a fraction in `0.0..=1.0` while a slow row fetch runs.
pub trait ProgressListener {
    fn progress(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressListener for F {
    fn progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Row access for one leaf column. Storage backends implement this; the
/// accessor layer only ever reads and writes through it.
pub trait ColumnAccess<T>: Send + Sync {
    fn get_with_progress(&self, index: usize, progress: &mut dyn ProgressListener) -> ValueResult<T>;

    fn get(&self, index: usize) -> ValueResult<T> {
        self.get_with_progress(index, &mut |_: f64| {})
    }

    fn set(&self, _index: usize, _value: T) -> ValueResult<()> {
        Err(ValueError::NotEditable)
    }

    fn is_editable(&self) -> bool {
        false
    }
}

/// Picks the source and source row that supply a destination row.
pub type IndexMapper = Arc<dyn Fn(usize) -> ValueResult<(usize, usize)> + Send + Sync>;

/// A read-only view whose rows come from other columns of the same kind.
pub(crate) struct MappedColumn<T> {
    sources: Vec<Arc<dyn ColumnAccess<T>>>,
    mapper: IndexMapper,
}

impl<T> MappedColumn<T> {
    pub(crate) fn new(sources: Vec<Arc<dyn ColumnAccess<T>>>, mapper: IndexMapper) -> Self {
        MappedColumn { sources, mapper }
    }
}

impl<T> ColumnAccess<T> for MappedColumn<T> {
    fn get_with_progress(&self, index: usize, progress: &mut dyn ProgressListener) -> ValueResult<T> {
        let (source, row) = (self.mapper)(index)?;
        let Some(column) = self.sources.get(source) else {
            return Err(InternalError::invariant(format!(
                "row {} mapped to source {} of {}",
                index,
                source,
                self.sources.len()
            ))
            .into());
        };
        column.get_with_progress(row, progress)
    }
}
