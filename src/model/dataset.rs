//! The column store: named, equal-length, typed columns

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{Result, StoreError};

use super::column::{coerce_cell, parse_cell, Column, ColumnData, ColumnElement};
use super::schema::{DataKind, Field, TypeTag};
use super::value::CellValue;

/// Text treated as a missing value by `add_row`
const NULL_TEXT: &str = "NULL";

/// An ordered set of named columns sharing one row count.
///
/// Every column holds exactly `len()` values once a mutating call returns, except while a caller
/// is part-way through [`Dataset::append_column_data`] on several columns (see [`Dataset::is_balanced`]).
/// Reads fail with `LengthMismatch` in that state; [`Dataset::append_columns`] appends a whole
/// batch without passing through it.
///
/// Equality compares columns, row count and row identity, so a filtered subset is not equal to a
/// freshly built dataset holding the same values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Columns in insertion order, keyed by name
    columns: IndexMap<String, Column>,
    row_count: usize,
    /// Row identity inherited from the dataset these rows were selected from
    row_ids: Option<Vec<usize>>,
}

impl Dataset {
    /// Create an empty dataset with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// A dataset with the same columns and types but no rows
    pub fn empty_like(&self) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), Column::new(name.clone(), ColumnData::empty(col.tag()))))
            .collect();
        Self {
            columns,
            row_count: 0,
            row_ids: Some(Vec::new()),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_type(&self, name: &str) -> Option<TypeTag> {
        self.columns.get(name).map(Column::tag)
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Name and type of each column
    pub fn fields(&self) -> Vec<Field> {
        self.columns
            .values()
            .map(|c| Field::new(c.name(), c.tag()))
            .collect()
    }

    /// Identity of a row: its index in the root dataset it was selected from
    pub fn row_id(&self, row: usize) -> Option<usize> {
        if row >= self.row_count {
            return None;
        }
        match &self.row_ids {
            Some(ids) => ids.get(row).copied(),
            None => Some(row),
        }
    }

    /// Number rows from `offset`, for chunks cut from a larger source
    pub(crate) fn set_row_offset(&mut self, offset: usize) {
        self.row_ids = Some((offset..offset + self.row_count).collect());
    }

    fn row_id_vec(&self) -> Vec<usize> {
        match &self.row_ids {
            Some(ids) => ids.clone(),
            None => (0..self.row_count).collect(),
        }
    }

    /// True when every column holds exactly `len()` values
    pub fn is_balanced(&self) -> bool {
        self.columns.values().all(|c| c.len() == self.row_count)
    }

    pub(crate) fn ensure_balanced(&self) -> Result<()> {
        match self.columns.values().find(|c| c.len() != self.row_count) {
            Some(col) => Err(StoreError::LengthMismatch {
                expected: self.row_count,
                actual: col.len(),
            }),
            None => Ok(()),
        }
    }

    fn column_or_err(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| StoreError::ColumnNotFound(name.to_string()))
    }

    /// Add a column of values.
    ///
    /// The first column sets the row count; later columns must match it.
    pub fn add_column(&mut self, name: impl Into<String>, data: impl Into<ColumnData>) -> Result<()> {
        let name = name.into();
        let data = data.into();
        self.ensure_balanced()?;
        if self.columns.contains_key(&name) {
            return Err(StoreError::DuplicateColumn(name));
        }
        if self.columns.is_empty() {
            self.row_count = data.len();
            self.row_ids = None;
        } else if data.len() != self.row_count {
            return Err(StoreError::LengthMismatch {
                expected: self.row_count,
                actual: data.len(),
            });
        }
        debug!(column = %name, tag = %data.tag(), rows = data.len(), "add column");
        self.columns.insert(name.clone(), Column::new(name, data));
        Ok(())
    }

    /// Declare a column by type before any data exists
    pub fn add_column_with_type(&mut self, name: impl Into<String>, tag: TypeTag) -> Result<()> {
        let name = name.into();
        self.ensure_balanced()?;
        if self.columns.contains_key(&name) {
            return Err(StoreError::DuplicateColumn(name));
        }
        if self.row_count > 0 {
            return Err(StoreError::LengthMismatch {
                expected: self.row_count,
                actual: 0,
            });
        }
        self.columns.insert(name.clone(), Column::placeholder(name, tag));
        Ok(())
    }

    /// Remove a column and return it; removing the last column resets the row count
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let col = self
            .columns
            .shift_remove(name)
            .ok_or_else(|| StoreError::ColumnNotFound(name.to_string()))?;
        if self.columns.is_empty() {
            self.row_count = 0;
            self.row_ids = None;
        }
        Ok(col)
    }

    /// Typed read-only view of a column
    pub fn get_column<T: ColumnElement>(&self, name: &str) -> Result<&[T]> {
        let values = self.column_or_err(name)?.as_slice::<T>()?;
        self.ensure_balanced()?;
        Ok(values)
    }

    /// Typed single-cell read
    pub fn get_column_value<T: ColumnElement>(&self, row: usize, name: &str) -> Result<T> {
        let values = self.get_column::<T>(name)?;
        if row >= self.row_count {
            return Err(StoreError::InvalidIndex {
                index: row,
                len: self.row_count,
            });
        }
        values.get(row).cloned().ok_or(StoreError::InvalidIndex {
            index: row,
            len: values.len(),
        })
    }

    /// Dynamic single-cell read
    pub fn value(&self, row: usize, name: &str) -> Result<CellValue> {
        let col = self.column_or_err(name)?;
        self.ensure_balanced()?;
        if row >= self.row_count {
            return Err(StoreError::InvalidIndex {
                index: row,
                len: self.row_count,
            });
        }
        col.get(row).ok_or(StoreError::InvalidIndex {
            index: row,
            len: col.len(),
        })
    }

    /// All cells of one row in column order
    pub fn row(&self, row: usize) -> Result<Vec<CellValue>> {
        self.ensure_balanced()?;
        if row >= self.row_count {
            return Err(StoreError::InvalidIndex {
                index: row,
                len: self.row_count,
            });
        }
        self.columns
            .values()
            .map(|c| {
                c.get(row).ok_or(StoreError::InvalidIndex {
                    index: row,
                    len: c.len(),
                })
            })
            .collect()
    }

    /// Append one row given one text value per column, in column order.
    ///
    /// The first row of a dataset declared only by type re-types each column from its text.
    /// Later rows must parse into the fixed column types; a failure leaves the dataset unchanged.
    pub fn add_row<S: AsRef<str>>(&mut self, values: &[S]) -> Result<()> {
        self.ensure_balanced()?;
        if self.columns.is_empty() || values.len() != self.columns.len() {
            return Err(StoreError::LengthMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        let infer = self.row_count == 0 && self.columns.values().all(Column::is_placeholder);
        let mut staged = Vec::with_capacity(values.len());
        for (col, text) in self.columns.values().zip(values) {
            let text = text.as_ref();
            let declared = col.tag();
            let null = text.is_empty() || text == NULL_TEXT;
            if infer {
                let tag = if null {
                    declared.to_nullable()
                } else {
                    TypeTag::new(infer_single(text), declared.is_nullable())
                };
                let value = parse_cell(tag, (!null).then_some(text)).ok_or_else(|| {
                    StoreError::Parse {
                        column: col.name().to_string(),
                        value: text.to_string(),
                        expected: tag,
                    }
                })?;
                staged.push((Some(tag), value));
            } else {
                let is_null = null && declared.is_nullable();
                let value = parse_cell(declared, (!is_null).then_some(text)).ok_or_else(|| {
                    StoreError::Parse {
                        column: col.name().to_string(),
                        value: text.to_string(),
                        expected: declared,
                    }
                })?;
                staged.push((None, value));
            }
        }

        for (col, (retype, value)) in self.columns.values_mut().zip(staged) {
            if let Some(tag) = retype {
                trace!(column = col.name(), %tag, "first row inferred type");
                col.set_data(ColumnData::with_capacity(tag, 1));
            }
            col.data_mut().push(value)?;
        }
        self.row_count += 1;
        self.row_ids = None;
        Ok(())
    }

    /// Bulk-append values to one column, coercing them toward the column's type.
    ///
    /// The row count advances once every column has reached the same length, so a full row batch
    /// is appended by calling this once per column.
    pub fn append_column_data(&mut self, name: &str, data: impl Into<ColumnData>) -> Result<()> {
        let data = data.into();
        let col = self
            .columns
            .get_mut(name)
            .ok_or_else(|| StoreError::ColumnNotFound(name.to_string()))?;
        let tag = col.tag();
        let staged = (0..data.len())
            .filter_map(|i| data.get(i))
            .map(|v| coerce_cell(v, tag))
            .collect::<Result<Vec<_>>>()?;
        let target = col.data_mut();
        for value in staged {
            target.push(value)?;
        }

        let first_len = self.columns.values().next().map_or(0, Column::len);
        if self.columns.values().all(|c| c.len() == first_len) {
            self.row_count = first_len;
            self.row_ids = None;
        }
        Ok(())
    }

    /// Append a batch of rows given as one buffer per column, all or nothing.
    ///
    /// Every column must appear exactly once and all buffers must have the same length; values
    /// are coerced as in [`Dataset::append_column_data`].
    pub fn append_columns<N, D>(&mut self, batch: impl IntoIterator<Item = (N, D)>) -> Result<()>
    where
        N: AsRef<str>,
        D: Into<ColumnData>,
    {
        self.ensure_balanced()?;
        let mut staged: IndexMap<&str, Vec<CellValue>> = IndexMap::new();
        let mut added = None;
        for (name, data) in batch {
            let name = name.as_ref();
            let (key, col) = self
                .columns
                .get_key_value(name)
                .ok_or_else(|| StoreError::ColumnNotFound(name.to_string()))?;
            if staged.contains_key(name) {
                return Err(StoreError::DuplicateColumn(name.to_string()));
            }
            let data = data.into();
            let len = *added.get_or_insert(data.len());
            if data.len() != len {
                return Err(StoreError::LengthMismatch {
                    expected: len,
                    actual: data.len(),
                });
            }
            let tag = col.tag();
            let values = (0..data.len())
                .filter_map(|i| data.get(i))
                .map(|v| coerce_cell(v, tag))
                .collect::<Result<Vec<_>>>()?;
            staged.insert(key.as_str(), values);
        }
        if staged.len() != self.columns.len() {
            return Err(StoreError::LengthMismatch {
                expected: self.columns.len(),
                actual: staged.len(),
            });
        }

        let staged: Vec<(String, Vec<CellValue>)> = staged
            .into_iter()
            .map(|(name, values)| (name.to_string(), values))
            .collect();
        let added = added.unwrap_or(0);
        for (name, values) in staged {
            if let Some(col) = self.columns.get_mut(&name) {
                let target = col.data_mut();
                for value in values {
                    target.push(value)?;
                }
            }
        }
        self.row_count += added;
        self.row_ids = None;
        debug!(rows = added, total = self.row_count, "append columns");
        Ok(())
    }

    /// Append every row of a dataset with the same schema.
    ///
    /// An empty dataset without columns adopts the other dataset's schema.
    pub fn append_dataset(&mut self, other: &Dataset) -> Result<()> {
        self.ensure_balanced()?;
        other.ensure_balanced()?;
        if self.columns.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        if self.columns.len() != other.columns.len() {
            return Err(StoreError::LengthMismatch {
                expected: self.columns.len(),
                actual: other.columns.len(),
            });
        }
        for (name, col) in &self.columns {
            let theirs = other.column_or_err(name)?;
            if theirs.tag() != col.tag() {
                return Err(StoreError::type_mismatch(col.tag(), theirs.tag()));
            }
        }

        let row_ids = match (&self.row_ids, &other.row_ids) {
            (Some(ours), Some(theirs)) => Some(ours.iter().chain(theirs).copied().collect()),
            (_, theirs) if self.row_count == 0 => theirs.clone(),
            _ => None,
        };
        for (name, col) in self.columns.iter_mut() {
            if let Some(theirs) = other.columns.get(name) {
                col.data_mut().extend_from(theirs.data())?;
            }
        }
        self.row_count += other.row_count;
        self.row_ids = row_ids;
        Ok(())
    }

    /// Copy rows `[start, end)` of one column into `target`.
    ///
    /// The column is created in `target` when absent; an existing column of the same type is
    /// overwritten.
    pub fn copy_column_to(&self, target: &mut Dataset, name: &str, start: usize, end: usize) -> Result<()> {
        self.ensure_balanced()?;
        let col = self.column_or_err(name)?;
        if start >= end {
            return Err(StoreError::InvalidIndex {
                index: start,
                len: self.row_count,
            });
        }
        if end > self.row_count {
            return Err(StoreError::InvalidIndex {
                index: end,
                len: self.row_count,
            });
        }
        let data = col.data().slice(start, end);

        if !target.has_column(name) {
            return target.add_column(name, data);
        }
        let alone = target.columns.len() == 1;
        if !alone && data.len() != target.row_count {
            return Err(StoreError::LengthMismatch {
                expected: target.row_count,
                actual: data.len(),
            });
        }
        if let Some(existing) = target.columns.get_mut(name) {
            if existing.tag() != data.tag() {
                return Err(StoreError::type_mismatch(existing.tag(), data.tag()));
            }
            existing.set_data(data);
        }
        if alone {
            target.row_count = end - start;
            target.row_ids = None;
        }
        Ok(())
    }

    /// Rows `[start, end)` as a new dataset carrying this dataset's row identity
    pub fn slice(&self, start: usize, end: usize) -> Result<Dataset> {
        self.ensure_balanced()?;
        if start > end || end > self.row_count {
            return Err(StoreError::InvalidIndex {
                index: end.max(start),
                len: self.row_count,
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), Column::new(name.clone(), col.data().slice(start, end))))
            .collect();
        let ids = self.row_id_vec();
        Ok(Dataset {
            columns,
            row_count: end - start,
            row_ids: Some(ids[start..end].to_vec()),
        })
    }

    /// Rows whose mask entry is true, as a new dataset with the same schema
    pub fn select_rows(&self, mask: &[bool]) -> Result<Dataset> {
        self.ensure_balanced()?;
        if mask.len() != self.row_count {
            return Err(StoreError::LengthMismatch {
                expected: self.row_count,
                actual: mask.len(),
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), Column::new(name.clone(), col.data().select(mask))))
            .collect();
        let ids: Vec<usize> = self
            .row_id_vec()
            .into_iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(id, _)| id)
            .collect();
        Ok(Dataset {
            columns,
            row_count: ids.len(),
            row_ids: Some(ids),
        })
    }
}

/// Type of a single non-null text value: integer, then float, then boolean, else string
fn infer_single(text: &str) -> DataKind {
    if text.trim().parse::<i32>().is_ok() {
        DataKind::Int
    } else if text.trim().parse::<f32>().is_ok() {
        DataKind::Float
    } else if text == "true" || text == "false" {
        DataKind::Bool
    } else {
        DataKind::String
    }
}
