//! A column type bound to the storage that holds its rows.
//!
//! [`DataTypeValue`] pairs a [`DataType`] with the accessor for that kind and
//! nothing else: a number type always carries a number column, a tuple one
//! value per member, a tagged type a tag-index column plus one inner value per
//! tag that has a payload. The pairing is checked once at construction.
//!
//! Derived views never copy rows. [`DataTypeValue::copy_several`] rebinds every
//! leaf accessor to read through an index mapper, and
//! [`DataTypeValue::with_set`] redirects writes.

use std::fmt;
use std::sync::Arc;

use super::{CellValue, ColumnAccess, IndexMapper, MappedColumn, NumberValue, ProgressListener};
use crate::error::{InternalError, ValueError, ValueResult};
use crate::types::{DataType, DateTimeInfo, NumberInfo, TemporalValue};

/// Replacement setter installed by [`DataTypeValue::with_set`].
pub type CollapsedSetter = Arc<dyn Fn(usize, CellValue) -> ValueResult<()> + Send + Sync>;

/// The accessor matching a [`DataType`]'s kind.
#[derive(Clone)]
pub enum ValueAccess {
    Number(Arc<dyn ColumnAccess<NumberValue>>),
    Text(Arc<dyn ColumnAccess<String>>),
    DateTime(Arc<dyn ColumnAccess<TemporalValue>>),
    Boolean(Arc<dyn ColumnAccess<bool>>),
    Tagged {
        tags: Arc<dyn ColumnAccess<usize>>,
        /// One entry per tag; `Some` exactly for tags with a payload.
        inner: Vec<Option<DataTypeValue>>,
    },
    Tuple(Vec<DataTypeValue>),
    Array(Arc<dyn ColumnAccess<Vec<CellValue>>>),
}

#[derive(Clone)]
pub struct DataTypeValue {
    data_type: DataType,
    access: ValueAccess,
    setter: Option<CollapsedSetter>,
}

impl fmt::Debug for DataTypeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTypeValue")
            .field("data_type", &self.data_type)
            .field("editable", &self.is_editable())
            .finish()
    }
}

impl DataTypeValue {
    fn leaf(data_type: DataType, access: ValueAccess) -> DataTypeValue {
        DataTypeValue {
            data_type,
            access,
            setter: None,
        }
    }

    pub fn number(info: NumberInfo, column: Arc<dyn ColumnAccess<NumberValue>>) -> DataTypeValue {
        Self::leaf(DataType::Number(info), ValueAccess::Number(column))
    }

    pub fn text(column: Arc<dyn ColumnAccess<String>>) -> DataTypeValue {
        Self::leaf(DataType::Text, ValueAccess::Text(column))
    }

    pub fn date(info: DateTimeInfo, column: Arc<dyn ColumnAccess<TemporalValue>>) -> DataTypeValue {
        Self::leaf(DataType::DateTime(info), ValueAccess::DateTime(column))
    }

    pub fn boolean(column: Arc<dyn ColumnAccess<bool>>) -> DataTypeValue {
        Self::leaf(DataType::Boolean, ValueAccess::Boolean(column))
    }

    /// Bind a tagged type. `inner` must hold one entry per tag, present exactly
    /// where the tag has a payload and of the payload's type.
    pub fn tagged(
        data_type: DataType,
        tags: Arc<dyn ColumnAccess<usize>>,
        inner: Vec<Option<DataTypeValue>>,
    ) -> Result<DataTypeValue, InternalError> {
        let declared = data_type.tags()?;
        if declared.len() != inner.len() {
            return Err(InternalError::ShapeMismatch(data_type.to_string()).raise());
        }
        for (tag, value) in declared.iter().zip(&inner) {
            let fits = match (&tag.inner, value) {
                (None, None) => true,
                (Some(ty), Some(value)) => *ty == value.data_type,
                _ => false,
            };
            if !fits {
                return Err(InternalError::ShapeMismatch(data_type.to_display(true)).raise());
            }
        }
        Ok(Self::leaf(data_type, ValueAccess::Tagged { tags, inner }))
    }

    pub fn tuple(members: Vec<DataTypeValue>) -> DataTypeValue {
        let data_type = DataType::Tuple(members.iter().map(|m| m.data_type.clone()).collect());
        Self::leaf(data_type, ValueAccess::Tuple(members))
    }

    pub fn array(
        data_type: DataType,
        column: Arc<dyn ColumnAccess<Vec<CellValue>>>,
    ) -> Result<DataTypeValue, InternalError> {
        data_type.array_element()?;
        Ok(Self::leaf(data_type, ValueAccess::Array(column)))
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn access(&self) -> &ValueAccess {
        &self.access
    }

    pub fn is_editable(&self) -> bool {
        if self.setter.is_some() {
            return true;
        }
        match &self.access {
            ValueAccess::Number(c) => c.is_editable(),
            ValueAccess::Text(c) => c.is_editable(),
            ValueAccess::DateTime(c) => c.is_editable(),
            ValueAccess::Boolean(c) => c.is_editable(),
            ValueAccess::Tagged { tags, inner } => {
                tags.is_editable() && inner.iter().flatten().all(|v| v.is_editable())
            }
            ValueAccess::Tuple(members) => members.iter().all(|m| m.is_editable()),
            ValueAccess::Array(c) => c.is_editable(),
        }
    }

    pub fn get_collapsed(&self, index: usize) -> ValueResult<CellValue> {
        self.get_collapsed_with_progress(index, &mut |_: f64| {})
    }

    /// Read row `index` as a single [`CellValue`], descending into tags and
    /// tuple members.
    pub fn get_collapsed_with_progress(
        &self,
        index: usize,
        progress: &mut dyn ProgressListener,
    ) -> ValueResult<CellValue> {
        Ok(match &self.access {
            ValueAccess::Number(c) => CellValue::Number(c.get_with_progress(index, progress)?),
            ValueAccess::Text(c) => CellValue::Text(c.get_with_progress(index, progress)?),
            ValueAccess::DateTime(c) => CellValue::Temporal(c.get_with_progress(index, progress)?),
            ValueAccess::Boolean(c) => CellValue::Boolean(c.get_with_progress(index, progress)?),
            ValueAccess::Tagged { tags, inner } => {
                let tag = tags.get_with_progress(index, progress)?;
                let slot = self.tag_slot(inner, tag)?;
                let inner = match slot {
                    Some(value) => Some(Box::new(value.get_collapsed_with_progress(index, progress)?)),
                    None => None,
                };
                CellValue::Tagged { tag, inner }
            }
            ValueAccess::Tuple(members) => CellValue::Tuple(
                members
                    .iter()
                    .map(|m| m.get_collapsed_with_progress(index, &mut *progress))
                    .collect::<ValueResult<Vec<_>>>()?,
            ),
            ValueAccess::Array(c) => CellValue::Array(c.get_with_progress(index, progress)?),
        })
    }

    /// Write row `index`. Fails with [`ValueError::NotEditable`] when any
    /// column the write touches is read-only. Shape and editability are
    /// checked for the whole value before the first column is written, so a
    /// rejected write leaves the row as it was.
    pub fn set_collapsed(&self, index: usize, value: CellValue) -> ValueResult<()> {
        if let Some(setter) = &self.setter {
            return setter(index, value);
        }
        self.check_settable(&value)?;
        self.store(index, value)
    }

    /// Columns behind an installed setter are not inspected; the setter decides.
    fn check_settable(&self, value: &CellValue) -> ValueResult<()> {
        if self.setter.is_some() {
            return Ok(());
        }
        let editable = match (&self.access, value) {
            (ValueAccess::Number(c), CellValue::Number(_)) => c.is_editable(),
            (ValueAccess::Text(c), CellValue::Text(_)) => c.is_editable(),
            (ValueAccess::DateTime(c), CellValue::Temporal(t)) => {
                let expected = self.data_type.date_time_info()?.granularity;
                if t.granularity() != expected {
                    return Err(self.shape_mismatch());
                }
                c.is_editable()
            }
            (ValueAccess::Boolean(c), CellValue::Boolean(_)) => c.is_editable(),
            (ValueAccess::Tagged { tags, inner }, CellValue::Tagged { tag, inner: payload }) => {
                match (self.tag_slot(inner, *tag)?, payload) {
                    (Some(target), Some(payload)) => target.check_settable(payload)?,
                    (None, None) => {}
                    _ => return Err(self.shape_mismatch()),
                }
                tags.is_editable()
            }
            (ValueAccess::Tuple(members), CellValue::Tuple(values)) => {
                if members.len() != values.len() {
                    return Err(self.shape_mismatch());
                }
                for (member, value) in members.iter().zip(values) {
                    member.check_settable(value)?;
                }
                true
            }
            (ValueAccess::Array(c), CellValue::Array(_)) => c.is_editable(),
            (_, other) => {
                log::debug!("cannot store {} in {}", other.kind_name(), self.data_type);
                return Err(self.shape_mismatch());
            }
        };
        if editable {
            Ok(())
        } else {
            Err(ValueError::NotEditable)
        }
    }

    /// Write a value that already passed [`Self::check_settable`].
    fn store(&self, index: usize, value: CellValue) -> ValueResult<()> {
        if let Some(setter) = &self.setter {
            return setter(index, value);
        }
        match (&self.access, value) {
            (ValueAccess::Number(c), CellValue::Number(n)) => c.set(index, n),
            (ValueAccess::Text(c), CellValue::Text(s)) => c.set(index, s),
            (ValueAccess::DateTime(c), CellValue::Temporal(t)) => c.set(index, t),
            (ValueAccess::Boolean(c), CellValue::Boolean(b)) => c.set(index, b),
            (ValueAccess::Tagged { tags, inner }, CellValue::Tagged { tag, inner: payload }) => {
                let slot = self.tag_slot(inner, tag)?;
                tags.set(index, tag)?;
                match (slot, payload) {
                    (Some(target), Some(payload)) => target.store(index, *payload),
                    (None, None) => Ok(()),
                    _ => Err(self.shape_mismatch()),
                }
            }
            (ValueAccess::Tuple(members), CellValue::Tuple(values)) => {
                for (member, value) in members.iter().zip(values) {
                    member.store(index, value)?;
                }
                Ok(())
            }
            (ValueAccess::Array(c), CellValue::Array(items)) => c.set(index, items),
            _ => Err(self.shape_mismatch()),
        }
    }

    /// Same type and getters, with every write routed to `setter`.
    pub fn with_set(&self, setter: CollapsedSetter) -> DataTypeValue {
        DataTypeValue {
            data_type: self.data_type.clone(),
            access: self.access.clone(),
            setter: Some(setter),
        }
    }

    /// Build a read-only view of `data_type` whose row `i` is row `r` of
    /// `sources[s]`, where `(s, r) = mapper(i)`. Every source must have the
    /// given type. Nested tags and tuple members are remapped the same way.
    pub fn copy_several(
        data_type: &DataType,
        sources: &[DataTypeValue],
        mapper: IndexMapper,
    ) -> ValueResult<DataTypeValue> {
        if let Some(bad) = sources.iter().find(|s| s.data_type != *data_type) {
            return Err(InternalError::wrong_kind(data_type.to_string(), bad.data_type.to_string()).into());
        }
        Ok(remap(data_type, sources, &mapper)?)
    }

    fn tag_slot<'a>(
        &self,
        inner: &'a [Option<DataTypeValue>],
        tag: usize,
    ) -> Result<Option<&'a DataTypeValue>, InternalError> {
        match inner.get(tag) {
            Some(slot) => Ok(slot.as_ref()),
            None => Err(InternalError::TagOutOfRange {
                type_name: self.data_type.to_string(),
                index: tag,
                tag_count: inner.len(),
            }
            .raise()),
        }
    }

    fn shape_mismatch(&self) -> ValueError {
        InternalError::ShapeMismatch(self.data_type.to_string()).raise().into()
    }
}

fn remap(
    data_type: &DataType,
    sources: &[DataTypeValue],
    mapper: &IndexMapper,
) -> Result<DataTypeValue, InternalError> {
    let access = match data_type {
        DataType::Number(_) => ValueAccess::Number(mapped(data_type, sources, mapper, |a| match a {
            ValueAccess::Number(c) => Some(c),
            _ => None,
        })?),
        DataType::Text => ValueAccess::Text(mapped(data_type, sources, mapper, |a| match a {
            ValueAccess::Text(c) => Some(c),
            _ => None,
        })?),
        DataType::DateTime(_) => ValueAccess::DateTime(mapped(data_type, sources, mapper, |a| match a {
            ValueAccess::DateTime(c) => Some(c),
            _ => None,
        })?),
        DataType::Boolean => ValueAccess::Boolean(mapped(data_type, sources, mapper, |a| match a {
            ValueAccess::Boolean(c) => Some(c),
            _ => None,
        })?),
        DataType::Array(_) => ValueAccess::Array(mapped(data_type, sources, mapper, |a| match a {
            ValueAccess::Array(c) => Some(c),
            _ => None,
        })?),
        DataType::Tagged(_) => {
            let tags = mapped(data_type, sources, mapper, |a| match a {
                ValueAccess::Tagged { tags, .. } => Some(tags),
                _ => None,
            })?;
            let mut inner = Vec::new();
            for (index, tag) in data_type.tags()?.iter().enumerate() {
                let Some(inner_type) = &tag.inner else {
                    inner.push(None);
                    continue;
                };
                let projected = sources
                    .iter()
                    .map(|s| match &s.access {
                        ValueAccess::Tagged { inner, .. } => inner.get(index).cloned().flatten(),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| InternalError::ShapeMismatch(data_type.to_string()).raise())?;
                inner.push(Some(remap(inner_type, &projected, mapper)?));
            }
            ValueAccess::Tagged { tags, inner }
        }
        DataType::Tuple(members) => {
            let mut remapped = Vec::with_capacity(members.len());
            for (slot, member) in members.iter().enumerate() {
                let projected = sources
                    .iter()
                    .map(|s| match &s.access {
                        ValueAccess::Tuple(values) => values.get(slot).cloned(),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| InternalError::ShapeMismatch(data_type.to_string()).raise())?;
                remapped.push(remap(member, &projected, mapper)?);
            }
            ValueAccess::Tuple(remapped)
        }
        DataType::Function(_, _) => return Err(InternalError::FunctionColumn.raise()),
    };
    Ok(DataTypeValue::leaf(data_type.clone(), access))
}

fn mapped<T: 'static>(
    data_type: &DataType,
    sources: &[DataTypeValue],
    mapper: &IndexMapper,
    column: impl Fn(&ValueAccess) -> Option<&Arc<dyn ColumnAccess<T>>>,
) -> Result<Arc<dyn ColumnAccess<T>>, InternalError> {
    let columns = sources
        .iter()
        .map(|s| column(&s.access).cloned())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| InternalError::ShapeMismatch(data_type.to_string()).raise())?;
    Ok(Arc::new(MappedColumn::new(columns, mapper.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateTimeType, TagType, TypeId};
    use crate::units::Unit;
    use chrono::NaiveDate;
    use std::sync::RwLock;

    struct VecColumn<T> {
        rows: RwLock<Vec<T>>,
        editable: bool,
    }

    impl<T: Clone + Send + Sync> VecColumn<T> {
        fn new(rows: Vec<T>) -> Arc<Self> {
            Arc::new(VecColumn {
                rows: RwLock::new(rows),
                editable: true,
            })
        }

        fn read_only(rows: Vec<T>) -> Arc<Self> {
            Arc::new(VecColumn {
                rows: RwLock::new(rows),
                editable: false,
            })
        }
    }

    impl<T: Clone + Send + Sync> ColumnAccess<T> for VecColumn<T> {
        fn get_with_progress(&self, index: usize, progress: &mut dyn ProgressListener) -> ValueResult<T> {
            progress.progress(1.0);
            let rows = self.rows.read().unwrap();
            rows.get(index).cloned().ok_or(ValueError::MissingRow(index))
        }

        fn set(&self, index: usize, value: T) -> ValueResult<()> {
            if !self.editable {
                return Err(ValueError::NotEditable);
            }
            let mut rows = self.rows.write().unwrap();
            if index >= rows.len() {
                return Err(ValueError::MissingRow(index));
            }
            rows[index] = value;
            Ok(())
        }

        fn is_editable(&self) -> bool {
            self.editable
        }
    }

    fn numbers(values: &[i64]) -> DataTypeValue {
        DataTypeValue::number(
            NumberInfo::default(),
            VecColumn::new(values.iter().map(|n| NumberValue::Integer(*n)).collect()),
        )
    }

    fn texts(values: &[&str]) -> DataTypeValue {
        DataTypeValue::text(VecColumn::new(values.iter().map(|s| s.to_string()).collect()))
    }

    fn shape_type() -> DataType {
        DataType::tagged(
            TypeId::new("Shape"),
            vec![],
            vec![
                TagType::new("Circle", Some(DataType::number())),
                TagType::new("Point", None),
            ],
        )
        .unwrap()
    }

    fn shapes(tags: Vec<usize>, radii: &[i64]) -> DataTypeValue {
        DataTypeValue::tagged(shape_type(), VecColumn::new(tags), vec![Some(numbers(radii)), None]).unwrap()
    }

    fn num(n: i64) -> CellValue {
        CellValue::Number(NumberValue::Integer(n))
    }

    #[test]
    fn test_get_collapsed_leaf_and_tuple() {
        let value = DataTypeValue::tuple(vec![numbers(&[1, 2]), texts(&["a", "b"])]);
        assert_eq!(
            value.data_type(),
            &DataType::tuple(vec![DataType::number(), DataType::text()])
        );
        assert_eq!(
            value.get_collapsed(1).unwrap(),
            CellValue::Tuple(vec![num(2), CellValue::Text("b".to_string())])
        );
        assert_eq!(value.get_collapsed(5), Err(ValueError::MissingRow(5)));
    }

    #[test]
    fn test_get_collapsed_tagged() {
        let value = shapes(vec![0, 1], &[10, 0]);
        assert_eq!(value.get_collapsed(0).unwrap(), CellValue::tagged(0, Some(num(10))));
        assert_eq!(value.get_collapsed(1).unwrap(), CellValue::tagged(1, None));
    }

    #[test]
    fn test_tag_index_out_of_range_is_internal() {
        let value = shapes(vec![7], &[0]);
        assert!(matches!(
            value.get_collapsed(0),
            Err(ValueError::Internal(InternalError::TagOutOfRange { index: 7, tag_count: 2, .. }))
        ));
    }

    #[test]
    fn test_tagged_constructor_checks_inner_shape() {
        let wrong = DataTypeValue::tagged(shape_type(), VecColumn::new(vec![0usize]), vec![None, None]);
        assert!(matches!(wrong, Err(InternalError::ShapeMismatch(_))));

        let not_tagged = DataTypeValue::tagged(DataType::text(), VecColumn::new(vec![0usize]), vec![]);
        assert!(matches!(not_tagged, Err(InternalError::WrongKind { .. })));
    }

    #[test]
    fn test_set_collapsed_writes_through() {
        let value = shapes(vec![1, 1], &[0, 0]);
        value.set_collapsed(1, CellValue::tagged(0, Some(num(4)))).unwrap();
        assert_eq!(value.get_collapsed(1).unwrap(), CellValue::tagged(0, Some(num(4))));

        let err = value.set_collapsed(0, CellValue::tagged(0, None));
        assert!(matches!(err, Err(ValueError::Internal(InternalError::ShapeMismatch(_)))));
    }

    #[test]
    fn test_set_collapsed_on_read_only_column() {
        let value = DataTypeValue::boolean(VecColumn::read_only(vec![true]));
        assert!(!value.is_editable());
        assert_eq!(
            value.set_collapsed(0, CellValue::Boolean(false)),
            Err(ValueError::NotEditable)
        );
    }

    #[test]
    fn test_rejected_tuple_write_leaves_row_unchanged() {
        let value = DataTypeValue::tuple(vec![
            numbers(&[1]),
            DataTypeValue::text(VecColumn::read_only(vec!["a".to_string()])),
        ]);
        let before = value.get_collapsed(0).unwrap();
        assert_eq!(before, CellValue::Tuple(vec![num(1), CellValue::Text("a".to_string())]));

        let row = CellValue::Tuple(vec![num(99), CellValue::Text("b".to_string())]);
        assert_eq!(value.set_collapsed(0, row), Err(ValueError::NotEditable));
        assert_eq!(value.get_collapsed(0).unwrap(), before);

        // A shape error in a later member is also caught before any write.
        let row = CellValue::Tuple(vec![num(99), CellValue::Boolean(true)]);
        assert!(matches!(
            value.set_collapsed(0, row),
            Err(ValueError::Internal(InternalError::ShapeMismatch(_)))
        ));
        assert_eq!(value.get_collapsed(0).unwrap(), before);
    }

    #[test]
    fn test_rejected_tagged_write_keeps_tag() {
        let radii = DataTypeValue::number(
            NumberInfo::default(),
            VecColumn::read_only(vec![NumberValue::Integer(0)]),
        );
        let value =
            DataTypeValue::tagged(shape_type(), VecColumn::new(vec![1usize]), vec![Some(radii), None]).unwrap();

        assert_eq!(
            value.set_collapsed(0, CellValue::tagged(0, Some(num(4)))),
            Err(ValueError::NotEditable)
        );
        assert_eq!(value.get_collapsed(0).unwrap(), CellValue::tagged(1, None));

        // Tags without a payload only touch the tag column.
        value.set_collapsed(0, CellValue::tagged(1, None)).unwrap();

        let err = value.set_collapsed(0, CellValue::tagged(0, Some(CellValue::Text("big".to_string()))));
        assert!(matches!(err, Err(ValueError::Internal(InternalError::ShapeMismatch(_)))));
        assert_eq!(value.get_collapsed(0).unwrap(), CellValue::tagged(1, None));
    }

    #[test]
    fn test_set_collapsed_rejects_wrong_granularity() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let value = DataTypeValue::date(
            DateTimeInfo::new(DateTimeType::YearMonthDay),
            VecColumn::new(vec![TemporalValue::YearMonthDay(date)]),
        );
        let time = TemporalValue::TimeOfDay(chrono::NaiveTime::from_hms_opt(1, 2, 3).unwrap());
        assert!(value.set_collapsed(0, CellValue::Temporal(time)).is_err());
        assert!(value.set_collapsed(0, CellValue::Temporal(TemporalValue::YearMonthDay(date))).is_ok());
    }

    #[test]
    fn test_with_set_redirects_writes() {
        let written = Arc::new(RwLock::new(Vec::new()));
        let sink = written.clone();
        let base = DataTypeValue::number(
            NumberInfo::with_unit(Unit::single("m")),
            VecColumn::read_only(vec![NumberValue::Integer(1)]),
        );
        let value = base.with_set(Arc::new(move |index: usize, value: CellValue| -> ValueResult<()> {
            sink.write().unwrap().push((index, value));
            Ok(())
        }));

        assert!(value.is_editable());
        value.set_collapsed(3, num(9)).unwrap();
        assert_eq!(value.get_collapsed(0).unwrap(), num(1));
        assert_eq!(*written.read().unwrap(), vec![(3, num(9))]);
    }

    #[test]
    fn test_copy_several_interleaves_sources() {
        let first = DataTypeValue::tuple(vec![numbers(&[1, 2]), shapes(vec![0, 1], &[5, 0])]);
        let second = DataTypeValue::tuple(vec![numbers(&[30]), shapes(vec![0], &[7])]);
        let data_type = first.data_type().clone();

        // Rows: first[0], second[0], first[1]
        let mapper: IndexMapper = Arc::new(|row: usize| -> ValueResult<(usize, usize)> {
            match row {
                0 => Ok((0, 0)),
                1 => Ok((1, 0)),
                2 => Ok((0, 1)),
                other => Err(ValueError::MissingRow(other)),
            }
        });
        let view = DataTypeValue::copy_several(&data_type, &[first, second], mapper).unwrap();

        assert!(!view.is_editable());
        assert_eq!(
            view.get_collapsed(1).unwrap(),
            CellValue::Tuple(vec![num(30), CellValue::tagged(0, Some(num(7)))])
        );
        assert_eq!(
            view.get_collapsed(2).unwrap(),
            CellValue::Tuple(vec![num(2), CellValue::tagged(1, None)])
        );
        assert_eq!(view.get_collapsed(3), Err(ValueError::MissingRow(3)));
        let row = CellValue::Tuple(vec![num(0), CellValue::tagged(1, None)]);
        assert_eq!(view.set_collapsed(0, row), Err(ValueError::NotEditable));
    }

    #[test]
    fn test_copy_several_rejects_mismatched_source() {
        let mapper: IndexMapper = Arc::new(|row: usize| -> ValueResult<(usize, usize)> { Ok((0, row)) });
        let result = DataTypeValue::copy_several(&DataType::number(), &[texts(&["x"])], mapper);
        assert!(matches!(result, Err(ValueError::Internal(InternalError::WrongKind { .. }))));
    }

    #[test]
    fn test_copy_several_rejects_function_type() {
        let mapper: IndexMapper = Arc::new(|row: usize| -> ValueResult<(usize, usize)> { Ok((0, row)) });
        let function = DataType::function(DataType::number(), DataType::number());
        let result = DataTypeValue::copy_several(&function, &[], mapper);
        assert_eq!(result.unwrap_err(), ValueError::Internal(InternalError::FunctionColumn));
    }

    #[test]
    fn test_progress_reaches_listener() {
        let value = numbers(&[1]);
        let mut seen = Vec::new();
        value
            .get_collapsed_with_progress(0, &mut |fraction: f64| seen.push(fraction))
            .unwrap();
        assert_eq!(seen, vec![1.0]);
    }
}
