//! Per-type comparison and value coercion behind comparison filters

use std::cmp::Ordering;

use crate::error::{Result, StoreError};
use crate::model::{float_to_i32, CellValue, ColumnData, DataKind, TypeTag};

use super::FilterOp;

/// Compute one boolean per row of `data` for `op value`.
///
/// The operator is checked against the column type and the value's kind is checked against the
/// column's kind once, up front. After that, values that cannot be coerced simply never match.
pub(crate) fn build_mask(data: &ColumnData, op: FilterOp, value: &CellValue) -> Result<Vec<bool>> {
    let tag = data.tag();
    check_operator(tag, op)?;
    if !op.is_null_test() {
        check_value(tag, value)?;
    }

    let mask = match data {
        ColumnData::Int32(v) => {
            let target = int_target(value);
            evaluate(v.iter().map(Some), op, |x| matches_int(op, *x, target))
        }
        ColumnData::NullableInt32(v) => {
            let target = int_target(value);
            evaluate(v.iter().map(Option::as_ref), op, |x| matches_int(op, *x, target))
        }
        ColumnData::Float32(v) => {
            let target = float_target(value);
            evaluate(v.iter().map(Some), op, |x| matches_float(op, *x, target))
        }
        ColumnData::NullableFloat32(v) => {
            let target = float_target(value);
            evaluate(v.iter().map(Option::as_ref), op, |x| matches_float(op, *x, target))
        }
        ColumnData::Utf8(v) => {
            let target = text_target(value);
            evaluate(v.iter().map(Some), op, |x| matches_text(op, x, target.as_deref()))
        }
        ColumnData::NullableUtf8(v) => {
            let target = text_target(value);
            evaluate(v.iter().map(Option::as_ref), op, |x| {
                matches_text(op, x, target.as_deref())
            })
        }
        ColumnData::Char(v) => {
            let target = char_target(value);
            evaluate(v.iter().map(Some), op, |x| matches_ordered(op, target.map(|t| x.cmp(&t))))
        }
        ColumnData::NullableChar(v) => {
            let target = char_target(value);
            evaluate(v.iter().map(Option::as_ref), op, |x| {
                matches_ordered(op, target.map(|t| x.cmp(&t)))
            })
        }
        ColumnData::Bool(v) => {
            let target = bool_target(value);
            evaluate(v.iter().map(Some), op, |x| matches_bool(op, *x, target))
        }
        ColumnData::NullableBool(v) => {
            let target = bool_target(value);
            evaluate(v.iter().map(Option::as_ref), op, |x| matches_bool(op, *x, target))
        }
    };
    Ok(mask)
}

/// Reject operators that have no meaning for the column type
fn check_operator(tag: TypeTag, op: FilterOp) -> Result<()> {
    let supported = match tag.kind() {
        DataKind::Int | DataKind::Float | DataKind::Char => !op.is_text_match(),
        DataKind::String => !op.is_ordering(),
        DataKind::Bool => matches!(op, FilterOp::Equal | FilterOp::NotEqual),
    };
    if supported {
        Ok(())
    } else {
        Err(StoreError::unsupported(op, tag))
    }
}

/// Reject comparison values of a categorically different kind
fn check_value(tag: TypeTag, value: &CellValue) -> Result<()> {
    let compatible = match (tag.kind(), value.kind()) {
        (DataKind::Int | DataKind::Float, DataKind::Int | DataKind::Float) => true,
        (DataKind::String | DataKind::Char, DataKind::String | DataKind::Char) => true,
        (DataKind::Bool, DataKind::Bool) => true,
        _ => false,
    };
    if compatible {
        Ok(())
    } else {
        Err(StoreError::type_mismatch(tag, value.kind()))
    }
}

fn evaluate<'a, T: 'a>(
    cells: impl Iterator<Item = Option<&'a T>>,
    op: FilterOp,
    matches: impl Fn(&T) -> bool,
) -> Vec<bool> {
    cells
        .map(|cell| match (op, cell) {
            (FilterOp::IsNull, cell) => cell.is_none(),
            (FilterOp::IsNotNull, cell) => cell.is_some(),
            (_, None) => false,
            (_, Some(x)) => matches(x),
        })
        .collect()
}

fn int_target(value: &CellValue) -> Option<i32> {
    match value {
        CellValue::Int(v) => *v,
        CellValue::Float(v) => v.and_then(float_to_i32),
        _ => None,
    }
}

fn float_target(value: &CellValue) -> Option<f32> {
    match value {
        CellValue::Float(v) => *v,
        CellValue::Int(v) => v.map(|i| i as f32),
        _ => None,
    }
}

fn text_target(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Str(Some(s)) => Some(strip_quotes(s).to_string()),
        CellValue::Char(Some(c)) => Some(char::from(*c).to_string()),
        _ => None,
    }
}

fn char_target(value: &CellValue) -> Option<u8> {
    match value {
        CellValue::Char(v) => *v,
        CellValue::Str(Some(s)) if s.len() == 1 => Some(s.as_bytes()[0]),
        _ => None,
    }
}

fn bool_target(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Bool(v) => *v,
        _ => None,
    }
}

fn matches_ordered(op: FilterOp, ord: Option<Ordering>) -> bool {
    match op {
        FilterOp::Equal => ord == Some(Ordering::Equal),
        FilterOp::NotEqual => ord.is_some_and(|o| o != Ordering::Equal),
        FilterOp::GreaterThan => ord == Some(Ordering::Greater),
        FilterOp::GreaterThanOrEqual => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::LessThan => ord == Some(Ordering::Less),
        FilterOp::LessThanOrEqual => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        _ => false,
    }
}

fn matches_int(op: FilterOp, cell: i32, target: Option<i32>) -> bool {
    matches_ordered(op, target.map(|t| cell.cmp(&t)))
}

fn matches_float(op: FilterOp, cell: f32, target: Option<f32>) -> bool {
    match target {
        // NaN is unequal to everything
        Some(t) if op == FilterOp::NotEqual => cell != t,
        Some(t) => matches_ordered(op, cell.partial_cmp(&t)),
        None => false,
    }
}

fn matches_text(op: FilterOp, cell: &str, target: Option<&str>) -> bool {
    let Some(target) = target else {
        return false;
    };
    let cell = strip_quotes(cell);
    match op {
        FilterOp::Equal => cell == target,
        FilterOp::NotEqual => cell != target,
        FilterOp::Contains => cell.contains(target),
        FilterOp::StartsWith => cell.starts_with(target),
        FilterOp::EndsWith => cell.ends_with(target),
        _ => false,
    }
}

fn matches_bool(op: FilterOp, cell: bool, target: Option<bool>) -> bool {
    match (op, target) {
        (FilterOp::Equal, Some(t)) => cell == t,
        (FilterOp::NotEqual, Some(t)) => cell != t,
        _ => false,
    }
}

/// Drop one layer of surrounding double quotes left over from CSV text
pub(crate) fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"a,b\""), "a,b");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("plain"), "plain");
    }

    #[test]
    fn test_null_value_never_matches() {
        let data = ColumnData::Int32(vec![1, 2]);
        let mask = build_mask(&data, FilterOp::NotEqual, &CellValue::Int(None)).unwrap();
        assert_eq!(mask, vec![false, false]);
    }

    #[test]
    fn test_char_column() {
        let data = ColumnData::NullableChar(vec![Some(b'a'), None, Some(b'c')]);
        let mask = build_mask(&data, FilterOp::GreaterThan, &CellValue::from("b")).unwrap();
        assert_eq!(mask, vec![false, false, true]);
        assert!(build_mask(&data, FilterOp::Contains, &CellValue::from("a")).is_err());
    }

    #[test]
    fn test_float_truncation_toward_zero() {
        let data = ColumnData::Int32(vec![-3, -2, 2, 3]);
        let mask = build_mask(&data, FilterOp::Equal, &CellValue::from(-2.7_f32)).unwrap();
        assert_eq!(mask, vec![false, true, false, false]);
    }

    #[test]
    fn test_unrepresentable_float_never_matches_int() {
        let data = ColumnData::Int32(vec![0, 5, 7]);
        for op in [FilterOp::Equal, FilterOp::NotEqual, FilterOp::GreaterThan] {
            let mask = build_mask(&data, op, &CellValue::from(f32::NAN)).unwrap();
            assert_eq!(mask, vec![false, false, false]);
        }

        let data = ColumnData::NullableInt32(vec![Some(i32::MAX), Some(1), Some(i32::MIN)]);
        for value in [3.0e9_f32, -3.0e9, f32::INFINITY, f32::NEG_INFINITY] {
            let mask = build_mask(&data, FilterOp::Equal, &CellValue::from(value)).unwrap();
            assert_eq!(mask, vec![false, false, false]);
        }
        let mask = build_mask(&data, FilterOp::Equal, &CellValue::from(-2_147_483_648.0_f32)).unwrap();
        assert_eq!(mask, vec![false, false, true]);
    }
}
