//! Column type inference for untyped CSV text

use crate::error::Result;
use crate::model::{parse_cell, zero_value, ColumnData, DataKind, TypeTag};

/// Running evidence about one column's text values.
///
/// Every non-null value narrows the candidate kinds; the column resolves to the first kind that
/// still holds, in the order integer, float, boolean, single character, string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInference {
    all_int: bool,
    all_float: bool,
    all_bool: bool,
    all_char: bool,
    saw_null: bool,
    saw_value: bool,
}

impl Default for TypeInference {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInference {
    pub fn new() -> Self {
        Self {
            all_int: true,
            all_float: true,
            all_bool: true,
            all_char: true,
            saw_null: false,
            saw_value: false,
        }
    }

    /// Record one field; `None` is a missing value
    pub fn observe(&mut self, field: Option<&str>) {
        let Some(text) = field else {
            self.saw_null = true;
            return;
        };
        self.saw_value = true;
        if self.all_int && text.trim().parse::<i32>().is_err() {
            self.all_int = false;
        }
        if self.all_float && text.trim().parse::<f32>().is_err() {
            self.all_float = false;
        }
        if self.all_bool && text != "true" && text != "false" {
            self.all_bool = false;
        }
        if self.all_char && text.len() != 1 {
            self.all_char = false;
        }
    }

    /// The tag chosen from the evidence so far.
    ///
    /// A column with no non-null values is a string column.
    pub fn resolve(&self) -> TypeTag {
        let kind = if !self.saw_value {
            DataKind::String
        } else if self.all_int {
            DataKind::Int
        } else if self.all_float {
            DataKind::Float
        } else if self.all_bool {
            DataKind::Bool
        } else if self.all_char {
            DataKind::Char
        } else {
            DataKind::String
        };
        TypeTag::new(kind, self.saw_null)
    }
}

/// Infer the tag of a column from its fields
pub fn infer_type<'a, I>(fields: I) -> TypeTag
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut inference = TypeInference::new();
    for field in fields {
        inference.observe(field);
    }
    inference.resolve()
}

/// Build a typed buffer from text fields.
///
/// Text that does not parse as `tag` becomes the kind's zero value; returns the buffer and how
/// many fields fell back that way. A missing value for a non-nullable tag also falls back.
pub(crate) fn build_column<'a, I>(tag: TypeTag, fields: I) -> Result<(ColumnData, usize)>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let fields = fields.into_iter();
    let mut data = ColumnData::with_capacity(tag, fields.size_hint().0);
    let mut fallbacks = 0;
    for field in fields {
        let value = match parse_cell(tag, field) {
            Some(value) => value,
            None => {
                fallbacks += 1;
                zero_value(tag.kind())
            }
        };
        data.push(value)?;
    }
    Ok((data, fallbacks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(values: &[&str]) -> TypeTag {
        infer_type(
            values
                .iter()
                .map(|v| if v.is_empty() || *v == "NULL" { None } else { Some(*v) }),
        )
    }

    #[test]
    fn test_priority() {
        assert_eq!(infer(&["1", "2", "-3"]), TypeTag::Int32);
        assert_eq!(infer(&["1", "2.5"]), TypeTag::Float32);
        assert_eq!(infer(&["true", "false"]), TypeTag::Bool);
        assert_eq!(infer(&["a", "b"]), TypeTag::Char);
        assert_eq!(infer(&["a", "bc"]), TypeTag::Utf8);
        assert_eq!(infer(&["1", "x"]), TypeTag::Char);
        assert_eq!(infer(&["10", "x"]), TypeTag::Utf8);
    }

    #[test]
    fn test_nulls_make_nullable() {
        assert_eq!(infer(&["1", "", "3"]), TypeTag::NullableInt32);
        assert_eq!(infer(&["1.5", "NULL"]), TypeTag::NullableFloat32);
        assert_eq!(infer(&["", ""]), TypeTag::NullableUtf8);
        assert_eq!(infer(&[]), TypeTag::Utf8);
    }

    #[test]
    fn test_build_column_zero_fills() {
        let (data, fallbacks) = build_column(TypeTag::Int32, [Some("1"), Some("x"), None]).unwrap();
        assert_eq!(data, ColumnData::Int32(vec![1, 0, 0]));
        assert_eq!(fallbacks, 2);

        let (data, fallbacks) = build_column(TypeTag::NullableFloat32, [Some("1.5"), None]).unwrap();
        assert_eq!(data, ColumnData::NullableFloat32(vec![Some(1.5), None]));
        assert_eq!(fallbacks, 0);
    }

    #[test]
    fn test_build_column_keeps_every_row() {
        let fields = [Some("7"), None, Some("not a value"), Some("")];
        for tag in TypeTag::ALL {
            let (data, _) = build_column(tag, fields).unwrap();
            assert_eq!(data.len(), fields.len(), "{tag}");
            assert_eq!(data.tag(), tag);
        }
    }
}
