//! Row filtering: comparison masks, predicate masks and combinators

mod combine;
mod compare;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::model::{CellValue, Dataset};

pub use combine::{logical_and, logical_or, union_rows};

/// Comparison operators understood by [`filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

impl FilterOp {
    /// Null tests ignore the comparison value
    pub fn is_null_test(self) -> bool {
        matches!(self, FilterOp::IsNull | FilterOp::IsNotNull)
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            FilterOp::GreaterThan
                | FilterOp::GreaterThanOrEqual
                | FilterOp::LessThan
                | FilterOp::LessThanOrEqual
        )
    }

    pub fn is_text_match(self) -> bool {
        matches!(
            self,
            FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith
        )
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FilterOp::Equal => "==",
            FilterOp::NotEqual => "!=",
            FilterOp::GreaterThan => ">",
            FilterOp::GreaterThanOrEqual => ">=",
            FilterOp::LessThan => "<",
            FilterOp::LessThanOrEqual => "<=",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "starts_with",
            FilterOp::EndsWith => "ends_with",
            FilterOp::IsNull => "is_null",
            FilterOp::IsNotNull => "is_not_null",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FilterOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "==" | "=" | "eq" => Ok(FilterOp::Equal),
            "!=" | "<>" | "ne" => Ok(FilterOp::NotEqual),
            ">" | "gt" => Ok(FilterOp::GreaterThan),
            ">=" | "ge" | "gte" => Ok(FilterOp::GreaterThanOrEqual),
            "<" | "lt" => Ok(FilterOp::LessThan),
            "<=" | "le" | "lte" => Ok(FilterOp::LessThanOrEqual),
            "contains" => Ok(FilterOp::Contains),
            "starts_with" | "startswith" => Ok(FilterOp::StartsWith),
            "ends_with" | "endswith" => Ok(FilterOp::EndsWith),
            "is_null" | "isnull" => Ok(FilterOp::IsNull),
            "is_not_null" | "isnotnull" => Ok(FilterOp::IsNotNull),
            _ => Err(format!("Unknown filter operator: {}", s)),
        }
    }
}

/// A reusable `column op value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: FilterOp,
    pub value: CellValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<CellValue>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Row mask of this condition over a dataset
    pub fn mask(&self, dataset: &Dataset) -> Result<Vec<bool>> {
        let col = dataset
            .column(&self.column)
            .ok_or_else(|| StoreError::ColumnNotFound(self.column.clone()))?;
        compare::build_mask(col.data(), self.op, &self.value)
    }

    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        let mask = self.mask(dataset)?;
        materialize(dataset, &mask)
    }
}

/// Keep the rows where `column op value` holds.
///
/// The value is coerced toward the column's type; an empty result keeps the full schema.
pub fn filter(
    dataset: &Dataset,
    column: &str,
    op: FilterOp,
    value: impl Into<CellValue>,
) -> Result<Dataset> {
    Condition::new(column, op, value).apply(dataset)
}

/// Keep the rows for which `predicate(row, dataset)` returns true.
///
/// Predicates cannot fail; any internal problem must be reported as `false`.
pub fn filter_with_predicate<F>(dataset: &Dataset, mut predicate: F) -> Result<Dataset>
where
    F: FnMut(usize, &Dataset) -> bool,
{
    let mask: Vec<bool> = (0..dataset.len()).map(|row| predicate(row, dataset)).collect();
    materialize(dataset, &mask)
}

/// Build the filtered dataset from a mask
fn materialize(dataset: &Dataset, mask: &[bool]) -> Result<Dataset> {
    let matches = mask.iter().filter(|m| **m).count();
    debug!(rows = dataset.len(), matches, "filter mask built");
    if matches == 0 {
        dataset.ensure_balanced()?;
        return Ok(dataset.empty_like());
    }
    dataset.select_rows(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnData, TypeTag};

    fn people() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_column("id", vec![1, 2, 3, 4, 5]).unwrap();
        ds.add_column("age", vec![25, 30, 22, 40, 35]).unwrap();
        ds.add_column("name", ColumnData::from_strs(&["Alice", "Bob", "Charlie", "David", "Eve"]))
            .unwrap();
        ds.add_column("score", vec![88.5_f32, 92.0, 79.5, 95.0, 85.0]).unwrap();
        ds.add_column("active", vec![true, false, true, true, false]).unwrap();
        ds
    }

    #[test]
    fn test_greater_than() {
        let ds = people();
        let out = filter(&ds, "age", FilterOp::GreaterThan, 30).unwrap();
        assert_eq!(out.get_column::<i32>("id").unwrap(), &[4, 5]);
        assert_eq!(out.get_column::<i32>("age").unwrap(), &[40, 35]);
        assert_eq!(out.column_count(), ds.column_count());
    }

    #[test]
    fn test_starts_with() {
        let ds = people();
        let out = filter(&ds, "name", FilterOp::StartsWith, "A").unwrap();
        assert_eq!(out.get_column::<String>("name").unwrap(), &["Alice".to_string()]);
    }

    #[test]
    fn test_is_not_null_keeps_order() {
        let mut ds = Dataset::new();
        ds.add_column("age", vec![Some(25), None, Some(22), Some(40), None])
            .unwrap();
        let out = filter(&ds, "age", FilterOp::IsNotNull, CellValue::Int(None)).unwrap();
        assert_eq!(
            out.get_column::<Option<i32>>("age").unwrap(),
            &[Some(25), Some(22), Some(40)]
        );
        let nulls = filter(&ds, "age", FilterOp::IsNull, CellValue::Int(None)).unwrap();
        assert_eq!(nulls.len(), 2);
    }

    #[test]
    fn test_null_tests_on_non_nullable_column() {
        let ds = people();
        assert_eq!(filter(&ds, "age", FilterOp::IsNull, 0).unwrap().len(), 0);
        assert_eq!(filter(&ds, "age", FilterOp::IsNotNull, 0).unwrap().len(), 5);
    }

    #[test]
    fn test_empty_result_keeps_schema() {
        let ds = people();
        let out = filter(&ds, "age", FilterOp::GreaterThan, 100).unwrap();
        assert_eq!(out.len(), 0);
        assert_eq!(out.column_names(), ds.column_names());
        assert_eq!(out.column_type("score"), Some(TypeTag::Float32));
    }

    #[test]
    fn test_value_coercion() {
        let ds = people();
        let out = filter(&ds, "age", FilterOp::GreaterThanOrEqual, 35.9_f32).unwrap();
        assert_eq!(out.get_column::<i32>("age").unwrap(), &[40, 35]);
        let out = filter(&ds, "score", FilterOp::LessThan, 86).unwrap();
        assert_eq!(out.get_column::<i32>("id").unwrap(), &[3, 5]);
    }

    #[test]
    fn test_unsupported_and_mismatched() {
        let ds = people();
        assert!(matches!(
            filter(&ds, "name", FilterOp::GreaterThan, "A"),
            Err(StoreError::UnsupportedType { .. })
        ));
        assert!(matches!(
            filter(&ds, "age", FilterOp::Contains, 3),
            Err(StoreError::UnsupportedType { .. })
        ));
        assert!(matches!(
            filter(&ds, "active", FilterOp::LessThan, true),
            Err(StoreError::UnsupportedType { .. })
        ));
        assert!(matches!(
            filter(&ds, "name", FilterOp::Equal, true),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert!(matches!(
            filter(&ds, "missing", FilterOp::Equal, 1),
            Err(StoreError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_bool_equality() {
        let ds = people();
        let out = filter(&ds, "active", FilterOp::NotEqual, true).unwrap();
        assert_eq!(out.get_column::<i32>("id").unwrap(), &[2, 5]);
    }

    #[test]
    fn test_quoted_strings_compare_unquoted() {
        let mut ds = Dataset::new();
        ds.add_column("city", ColumnData::from_strs(&["\"Paris, FR\"", "Oslo"]))
            .unwrap();
        let out = filter(&ds, "city", FilterOp::EndsWith, "FR").unwrap();
        assert_eq!(out.len(), 1);
        let out = filter(&ds, "city", FilterOp::Equal, "Paris, FR").unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_predicate_and_idempotence() {
        let ds = people();
        let pred = |row: usize, d: &Dataset| {
            d.get_column_value::<f32>(row, "score")
                .map(|s| s > 86.0)
                .unwrap_or(false)
        };
        let once = filter_with_predicate(&ds, pred).unwrap();
        let twice = filter_with_predicate(&once, pred).unwrap();
        assert_eq!(once.get_column::<i32>("id").unwrap(), &[1, 2, 4]);
        assert_eq!(
            once.get_column::<i32>("id").unwrap(),
            twice.get_column::<i32>("id").unwrap()
        );
    }

    #[test]
    fn test_op_from_str() {
        assert_eq!(">=".parse::<FilterOp>().unwrap(), FilterOp::GreaterThanOrEqual);
        assert_eq!("starts_with".parse::<FilterOp>().unwrap(), FilterOp::StartsWith);
        assert!("~".parse::<FilterOp>().is_err());
    }
}
