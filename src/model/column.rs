//! Typed column buffers

use crate::error::{Result, StoreError};

use super::schema::{DataKind, TypeTag};
use super::value::CellValue;

/// Owned values of one column, one variant per [`TypeTag`]
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int32(Vec<i32>),
    Float32(Vec<f32>),
    Utf8(Vec<String>),
    Char(Vec<u8>),
    Bool(Vec<bool>),
    NullableInt32(Vec<Option<i32>>),
    NullableFloat32(Vec<Option<f32>>),
    NullableUtf8(Vec<Option<String>>),
    NullableChar(Vec<Option<u8>>),
    NullableBool(Vec<Option<bool>>),
}

/// Evaluate an expression against the inner `Vec` whatever its element type
macro_rules! each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::Int32($v) => $body,
            ColumnData::Float32($v) => $body,
            ColumnData::Utf8($v) => $body,
            ColumnData::Char($v) => $body,
            ColumnData::Bool($v) => $body,
            ColumnData::NullableInt32($v) => $body,
            ColumnData::NullableFloat32($v) => $body,
            ColumnData::NullableUtf8($v) => $body,
            ColumnData::NullableChar($v) => $body,
            ColumnData::NullableBool($v) => $body,
        }
    };
}

/// Like `each_variant!`, but wraps the produced `Vec` back into the same variant
macro_rules! map_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::Int32($v) => ColumnData::Int32($body),
            ColumnData::Float32($v) => ColumnData::Float32($body),
            ColumnData::Utf8($v) => ColumnData::Utf8($body),
            ColumnData::Char($v) => ColumnData::Char($body),
            ColumnData::Bool($v) => ColumnData::Bool($body),
            ColumnData::NullableInt32($v) => ColumnData::NullableInt32($body),
            ColumnData::NullableFloat32($v) => ColumnData::NullableFloat32($body),
            ColumnData::NullableUtf8($v) => ColumnData::NullableUtf8($body),
            ColumnData::NullableChar($v) => ColumnData::NullableChar($body),
            ColumnData::NullableBool($v) => ColumnData::NullableBool($body),
        }
    };
}

impl ColumnData {
    /// An empty buffer for the given tag
    pub fn empty(tag: TypeTag) -> Self {
        Self::with_capacity(tag, 0)
    }

    pub fn with_capacity(tag: TypeTag, capacity: usize) -> Self {
        match tag {
            TypeTag::Int32 => ColumnData::Int32(Vec::with_capacity(capacity)),
            TypeTag::Float32 => ColumnData::Float32(Vec::with_capacity(capacity)),
            TypeTag::Utf8 => ColumnData::Utf8(Vec::with_capacity(capacity)),
            TypeTag::Char => ColumnData::Char(Vec::with_capacity(capacity)),
            TypeTag::Bool => ColumnData::Bool(Vec::with_capacity(capacity)),
            TypeTag::NullableInt32 => ColumnData::NullableInt32(Vec::with_capacity(capacity)),
            TypeTag::NullableFloat32 => ColumnData::NullableFloat32(Vec::with_capacity(capacity)),
            TypeTag::NullableUtf8 => ColumnData::NullableUtf8(Vec::with_capacity(capacity)),
            TypeTag::NullableChar => ColumnData::NullableChar(Vec::with_capacity(capacity)),
            TypeTag::NullableBool => ColumnData::NullableBool(Vec::with_capacity(capacity)),
        }
    }

    /// Build a non-nullable string column from borrowed text
    pub fn from_strs(values: &[&str]) -> Self {
        ColumnData::Utf8(values.iter().map(|s| s.to_string()).collect())
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            ColumnData::Int32(_) => TypeTag::Int32,
            ColumnData::Float32(_) => TypeTag::Float32,
            ColumnData::Utf8(_) => TypeTag::Utf8,
            ColumnData::Char(_) => TypeTag::Char,
            ColumnData::Bool(_) => TypeTag::Bool,
            ColumnData::NullableInt32(_) => TypeTag::NullableInt32,
            ColumnData::NullableFloat32(_) => TypeTag::NullableFloat32,
            ColumnData::NullableUtf8(_) => TypeTag::NullableUtf8,
            ColumnData::NullableChar(_) => TypeTag::NullableChar,
            ColumnData::NullableBool(_) => TypeTag::NullableBool,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one cell as a dynamic value
    pub fn get(&self, index: usize) -> Option<CellValue> {
        if index >= self.len() {
            return None;
        }
        let value = match self {
            ColumnData::Int32(v) => CellValue::Int(Some(v[index])),
            ColumnData::Float32(v) => CellValue::Float(Some(v[index])),
            ColumnData::Utf8(v) => CellValue::Str(Some(v[index].clone())),
            ColumnData::Char(v) => CellValue::Char(Some(v[index])),
            ColumnData::Bool(v) => CellValue::Bool(Some(v[index])),
            ColumnData::NullableInt32(v) => CellValue::Int(v[index]),
            ColumnData::NullableFloat32(v) => CellValue::Float(v[index]),
            ColumnData::NullableUtf8(v) => CellValue::Str(v[index].clone()),
            ColumnData::NullableChar(v) => CellValue::Char(v[index]),
            ColumnData::NullableBool(v) => CellValue::Bool(v[index]),
        };
        Some(value)
    }

    /// Whether the cell at `index` is null; always false for non-nullable buffers
    pub fn is_null_at(&self, index: usize) -> bool {
        match self {
            ColumnData::NullableInt32(v) => v.get(index).is_some_and(|x| x.is_none()),
            ColumnData::NullableFloat32(v) => v.get(index).is_some_and(|x| x.is_none()),
            ColumnData::NullableUtf8(v) => v.get(index).is_some_and(|x| x.is_none()),
            ColumnData::NullableChar(v) => v.get(index).is_some_and(|x| x.is_none()),
            ColumnData::NullableBool(v) => v.get(index).is_some_and(|x| x.is_none()),
            _ => false,
        }
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_null_at(i)).count()
    }

    /// Copy the rows whose mask entry is true
    pub fn select(&self, mask: &[bool]) -> ColumnData {
        map_variant!(self, v => v
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(x, _)| x.clone())
            .collect())
    }

    /// Copy the half-open row range `[start, end)`; callers check bounds
    pub fn slice(&self, start: usize, end: usize) -> ColumnData {
        map_variant!(self, v => v[start..end].to_vec())
    }

    /// Append another buffer of exactly the same tag
    pub fn extend_from(&mut self, other: &ColumnData) -> Result<()> {
        match (self, other) {
            (ColumnData::Int32(a), ColumnData::Int32(b)) => a.extend_from_slice(b),
            (ColumnData::Float32(a), ColumnData::Float32(b)) => a.extend_from_slice(b),
            (ColumnData::Utf8(a), ColumnData::Utf8(b)) => a.extend_from_slice(b),
            (ColumnData::Char(a), ColumnData::Char(b)) => a.extend_from_slice(b),
            (ColumnData::Bool(a), ColumnData::Bool(b)) => a.extend_from_slice(b),
            (ColumnData::NullableInt32(a), ColumnData::NullableInt32(b)) => a.extend_from_slice(b),
            (ColumnData::NullableFloat32(a), ColumnData::NullableFloat32(b)) => {
                a.extend_from_slice(b)
            }
            (ColumnData::NullableUtf8(a), ColumnData::NullableUtf8(b)) => a.extend_from_slice(b),
            (ColumnData::NullableChar(a), ColumnData::NullableChar(b)) => a.extend_from_slice(b),
            (ColumnData::NullableBool(a), ColumnData::NullableBool(b)) => a.extend_from_slice(b),
            (a, b) => return Err(StoreError::type_mismatch(a.tag(), b.tag())),
        }
        Ok(())
    }

    /// Push one value of this buffer's kind; nulls only into nullable buffers
    pub fn push(&mut self, value: CellValue) -> Result<()> {
        let tag = self.tag();
        match (self, value) {
            (ColumnData::Int32(v), CellValue::Int(Some(x))) => v.push(x),
            (ColumnData::Float32(v), CellValue::Float(Some(x))) => v.push(x),
            (ColumnData::Utf8(v), CellValue::Str(Some(x))) => v.push(x),
            (ColumnData::Char(v), CellValue::Char(Some(x))) => v.push(x),
            (ColumnData::Bool(v), CellValue::Bool(Some(x))) => v.push(x),
            (ColumnData::NullableInt32(v), CellValue::Int(x)) => v.push(x),
            (ColumnData::NullableFloat32(v), CellValue::Float(x)) => v.push(x),
            (ColumnData::NullableUtf8(v), CellValue::Str(x)) => v.push(x),
            (ColumnData::NullableChar(v), CellValue::Char(x)) => v.push(x),
            (ColumnData::NullableBool(v), CellValue::Bool(x)) => v.push(x),
            (_, value) => {
                let actual = if value.is_null() {
                    format!("null {}", value.kind())
                } else {
                    value.kind().to_string()
                };
                return Err(StoreError::type_mismatch(tag, actual));
            }
        }
        Ok(())
    }

    /// Same values re-wrapped as the nullable counterpart
    pub fn into_nullable(self) -> ColumnData {
        match self {
            ColumnData::Int32(v) => ColumnData::NullableInt32(v.into_iter().map(Some).collect()),
            ColumnData::Float32(v) => {
                ColumnData::NullableFloat32(v.into_iter().map(Some).collect())
            }
            ColumnData::Utf8(v) => ColumnData::NullableUtf8(v.into_iter().map(Some).collect()),
            ColumnData::Char(v) => ColumnData::NullableChar(v.into_iter().map(Some).collect()),
            ColumnData::Bool(v) => ColumnData::NullableBool(v.into_iter().map(Some).collect()),
            nullable => nullable,
        }
    }
}

/// Parse one text cell into `tag`. `None` text is a null; returns `None` when the text does not
/// parse or a null is offered to a non-nullable tag.
pub(crate) fn parse_cell(tag: TypeTag, text: Option<&str>) -> Option<CellValue> {
    let Some(text) = text else {
        return tag.is_nullable().then(|| CellValue::null(tag.kind()));
    };
    match tag.kind() {
        DataKind::Int => text.trim().parse::<i32>().ok().map(CellValue::from),
        DataKind::Float => text.trim().parse::<f32>().ok().map(CellValue::from),
        DataKind::String => Some(CellValue::Str(Some(text.to_string()))),
        DataKind::Char => match text.as_bytes() {
            [c] => Some(CellValue::char(*c)),
            _ => None,
        },
        DataKind::Bool => match text {
            "true" => Some(CellValue::Bool(Some(true))),
            "false" => Some(CellValue::Bool(Some(false))),
            _ => None,
        },
    }
}

/// Truncate a float toward zero, or `None` when the result is not a representable `i32`
pub(crate) fn float_to_i32(f: f32) -> Option<i32> {
    let t = f.trunc();
    // i32::MAX as f32 rounds up to 2^31, so the upper bound is exclusive
    (t >= i32::MIN as f32 && t < i32::MAX as f32).then_some(t as i32)
}

/// The value a best-effort parse falls back to when text does not fit the kind
pub(crate) fn zero_value(kind: DataKind) -> CellValue {
    match kind {
        DataKind::Int => CellValue::Int(Some(0)),
        DataKind::Float => CellValue::Float(Some(0.0)),
        DataKind::String => CellValue::Str(Some(String::new())),
        DataKind::Char => CellValue::Char(Some(0)),
        DataKind::Bool => CellValue::Bool(Some(false)),
    }
}

/// Convert a value toward `target`, used by bulk appends across types.
///
/// Numbers convert between int and float (float to int truncates toward zero), anything
/// renders into a string column (floats with six decimals), one-byte strings become chars.
pub(crate) fn coerce_cell(value: CellValue, target: TypeTag) -> Result<CellValue> {
    if value.is_null() {
        return if target.is_nullable() {
            Ok(CellValue::null(target.kind()))
        } else {
            Err(StoreError::type_mismatch(target, "null"))
        };
    }
    let source = value.kind();
    let coerced = match (target.kind(), value) {
        (DataKind::Int, v @ CellValue::Int(_)) => v,
        (DataKind::Int, CellValue::Float(Some(f))) => match float_to_i32(f) {
            Some(i) => CellValue::Int(Some(i)),
            None => return Err(StoreError::unsupported(format!("append {} {}", source, f), target)),
        },
        (DataKind::Float, v @ CellValue::Float(_)) => v,
        (DataKind::Float, CellValue::Int(Some(i))) => CellValue::Float(Some(i as f32)),
        (DataKind::String, CellValue::Float(Some(f))) => CellValue::Str(Some(format!("{:.6}", f))),
        (DataKind::String, v) => CellValue::Str(Some(v.display().into_owned())),
        (DataKind::Char, v @ CellValue::Char(_)) => v,
        (DataKind::Char, CellValue::Str(Some(s))) if s.len() == 1 => {
            CellValue::char(s.as_bytes()[0])
        }
        (DataKind::Bool, v @ CellValue::Bool(_)) => v,
        _ => return Err(StoreError::unsupported(format!("append {}", source), target)),
    };
    Ok(coerced)
}

mod sealed {
    pub trait Sealed {}
}

/// Rust element types that map one-to-one onto a [`TypeTag`].
///
/// Typed reads check the stored tag against `TAG` before handing out a slice.
pub trait ColumnElement: Sized + Clone + sealed::Sealed {
    const TAG: TypeTag;

    fn slice(data: &ColumnData) -> Option<&[Self]>;

    fn into_data(values: Vec<Self>) -> ColumnData;
}

macro_rules! column_element {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}

        impl ColumnElement for $ty {
            const TAG: TypeTag = TypeTag::$variant;

            fn slice(data: &ColumnData) -> Option<&[Self]> {
                match data {
                    ColumnData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_data(values: Vec<Self>) -> ColumnData {
                ColumnData::$variant(values)
            }
        }
    };
}

column_element!(i32, Int32);
column_element!(f32, Float32);
column_element!(String, Utf8);
column_element!(u8, Char);
column_element!(bool, Bool);
column_element!(Option<i32>, NullableInt32);
column_element!(Option<f32>, NullableFloat32);
column_element!(Option<String>, NullableUtf8);
column_element!(Option<u8>, NullableChar);
column_element!(Option<bool>, NullableBool);

impl<T: ColumnElement> From<Vec<T>> for ColumnData {
    fn from(values: Vec<T>) -> Self {
        T::into_data(values)
    }
}

/// A named, homogeneously typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
    /// Declared by type only; re-typed by the first inferred row
    placeholder: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            placeholder: false,
        }
    }

    pub(crate) fn placeholder(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::empty(tag),
            placeholder: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> TypeTag {
        self.data.tag()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut ColumnData {
        self.placeholder = false;
        &mut self.data
    }

    pub(crate) fn set_data(&mut self, data: ColumnData) {
        self.data = data;
        self.placeholder = false;
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<CellValue> {
        self.data.get(index)
    }

    pub fn null_count(&self) -> usize {
        self.data.null_count()
    }

    /// Typed read-only view; fails unless the stored tag is exactly `T::TAG`
    pub fn as_slice<T: ColumnElement>(&self) -> Result<&[T]> {
        T::slice(&self.data).ok_or_else(|| StoreError::type_mismatch(T::TAG, self.tag()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_view_checks_tag() {
        let col = Column::new("age", vec![25, 30]);
        assert_eq!(col.as_slice::<i32>().unwrap(), &[25, 30]);
        assert!(matches!(
            col.as_slice::<Option<i32>>(),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert!(col.as_slice::<f32>().is_err());
    }

    #[test]
    fn test_select_and_nulls() {
        let data = ColumnData::from(vec![Some(1), None, Some(3)]);
        assert_eq!(data.null_count(), 1);
        assert!(data.is_null_at(1));
        let picked = data.select(&[true, false, true]);
        assert_eq!(picked, ColumnData::NullableInt32(vec![Some(1), Some(3)]));
    }

    #[test]
    fn test_push_rejects_null_into_non_nullable() {
        let mut data = ColumnData::empty(TypeTag::Int32);
        assert!(data.push(CellValue::Int(None)).is_err());
        data.push(CellValue::from(7)).unwrap();
        assert_eq!(data, ColumnData::Int32(vec![7]));
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell(TypeTag::Int32, Some("42")), Some(CellValue::from(42)));
        assert_eq!(parse_cell(TypeTag::Int32, Some("4.2")), None);
        assert_eq!(parse_cell(TypeTag::Int32, None), None);
        assert_eq!(
            parse_cell(TypeTag::NullableBool, None),
            Some(CellValue::Bool(None))
        );
        assert_eq!(parse_cell(TypeTag::Char, Some("xy")), None);
    }

    #[test]
    fn test_coerce_cell() {
        assert_eq!(
            coerce_cell(CellValue::from(3.9_f32), TypeTag::Int32).unwrap(),
            CellValue::from(3)
        );
        assert_eq!(
            coerce_cell(CellValue::from(1.5_f32), TypeTag::Utf8).unwrap(),
            CellValue::from("1.500000")
        );
        assert!(coerce_cell(CellValue::from("x"), TypeTag::Bool).is_err());
    }

    #[test]
    fn test_coerce_unrepresentable_float_to_int() {
        for f in [f32::NAN, f32::INFINITY, 3.0e9, -3.0e9, 2_147_483_648.0] {
            assert!(matches!(
                coerce_cell(CellValue::from(f), TypeTag::Int32),
                Err(StoreError::UnsupportedType { .. })
            ));
        }
        assert_eq!(float_to_i32(-2_147_483_648.0), Some(i32::MIN));
        assert_eq!(float_to_i32(-0.9), Some(0));
    }
}
