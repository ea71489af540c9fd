//! Column statistics

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::model::{CellValue, Column, Dataset, TypeTag};

/// Summary of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub tag: TypeTag,
    /// Non-null values
    pub count: usize,
    pub nulls: usize,
    /// Numeric columns only
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub mode: Option<CellValue>,
}

fn column<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column> {
    dataset
        .column(name)
        .ok_or_else(|| StoreError::ColumnNotFound(name.to_string()))
}

/// Non-null values of a numeric column, widened to `f64`
fn numeric_values(dataset: &Dataset, name: &str, op: &str) -> Result<Vec<f64>> {
    let col = column(dataset, name)?;
    if !col.tag().is_numeric() {
        return Err(StoreError::unsupported(op, col.tag()));
    }
    Ok((0..col.len())
        .filter_map(|row| col.get(row).and_then(|v| v.as_f64()))
        .collect())
}

/// Most frequent non-null value; ties go to the value seen first.
///
/// Returns `None` for an empty or all-null column.
pub fn mode(dataset: &Dataset, name: &str) -> Result<Option<CellValue>> {
    let col = column(dataset, name)?;
    let mut counts: IndexMap<String, (CellValue, usize)> = IndexMap::new();
    for row in 0..col.len() {
        let Some(value) = col.get(row).filter(|v| !v.is_null()) else {
            continue;
        };
        match counts.entry(value.display().into_owned()) {
            Entry::Occupied(mut e) => e.get_mut().1 += 1,
            Entry::Vacant(e) => {
                e.insert((value, 1));
            }
        }
    }

    let mut best: Option<(CellValue, usize)> = None;
    for (value, count) in counts.into_values() {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((value, count));
        }
    }
    Ok(best.map(|(value, _)| value))
}

pub fn min(dataset: &Dataset, name: &str) -> Result<Option<f64>> {
    Ok(numeric_values(dataset, name, "min")?
        .into_iter()
        .reduce(f64::min))
}

pub fn max(dataset: &Dataset, name: &str) -> Result<Option<f64>> {
    Ok(numeric_values(dataset, name, "max")?
        .into_iter()
        .reduce(f64::max))
}

/// Sum of the non-null values; zero for an empty column
pub fn sum(dataset: &Dataset, name: &str) -> Result<f64> {
    Ok(numeric_values(dataset, name, "sum")?.iter().sum())
}

/// Arithmetic mean of the non-null values
pub fn mean(dataset: &Dataset, name: &str) -> Result<Option<f64>> {
    let values = numeric_values(dataset, name, "mean")?;
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
}

pub fn null_count(dataset: &Dataset, name: &str) -> Result<usize> {
    Ok(column(dataset, name)?.null_count())
}

/// Count, nulls and mode for any column, plus min/max/mean for numeric ones
pub fn describe(dataset: &Dataset, name: &str) -> Result<ColumnStats> {
    let col = column(dataset, name)?;
    let tag = col.tag();
    let nulls = col.null_count();
    let (min, max, mean) = if tag.is_numeric() {
        (min(dataset, name)?, max(dataset, name)?, mean(dataset, name)?)
    } else {
        (None, None, None)
    };
    Ok(ColumnStats {
        column: name.to_string(),
        tag,
        count: col.len() - nulls,
        nulls,
        min,
        max,
        mean,
        mode: mode(dataset, name)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnData;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_column("age", vec![25, 25, 35]).unwrap();
        ds.add_column("score", vec![Some(1.5_f32), None, Some(2.5)])
            .unwrap();
        ds.add_column("city", ColumnData::from_strs(&["Oslo", "Rome", "Rome"]))
            .unwrap();
        ds
    }

    #[test]
    fn test_mode() {
        let ds = sample();
        assert_eq!(mode(&ds, "age").unwrap(), Some(CellValue::Int(Some(25))));
        assert_eq!(mode(&ds, "city").unwrap(), Some(CellValue::from("Rome")));
        // tie between 1.5 and 2.5 goes to the first seen
        assert_eq!(mode(&ds, "score").unwrap(), Some(CellValue::Float(Some(1.5))));
        assert_eq!(mode(&ds, "age").unwrap(), mode(&ds, "age").unwrap());
    }

    #[test]
    fn test_mode_empty_and_all_null() {
        let mut ds = Dataset::new();
        ds.add_column("n", Vec::<i32>::new()).unwrap();
        assert_eq!(mode(&ds, "n").unwrap(), None);

        let mut ds = Dataset::new();
        ds.add_column("n", vec![None::<i32>, None]).unwrap();
        assert_eq!(mode(&ds, "n").unwrap(), None);
    }

    #[test]
    fn test_numeric_stats() {
        let ds = sample();
        assert_eq!(min(&ds, "age").unwrap(), Some(25.0));
        assert_eq!(max(&ds, "age").unwrap(), Some(35.0));
        assert_eq!(sum(&ds, "age").unwrap(), 85.0);
        assert_eq!(mean(&ds, "score").unwrap(), Some(2.0));
        assert_eq!(null_count(&ds, "score").unwrap(), 1);
        assert!(matches!(min(&ds, "city"), Err(StoreError::UnsupportedType { .. })));
        assert!(matches!(sum(&ds, "nope"), Err(StoreError::ColumnNotFound(_))));
    }

    #[test]
    fn test_describe() {
        let ds = sample();
        let stats = describe(&ds, "score").unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.nulls, 1);
        assert_eq!(stats.max, Some(2.5));

        let city = describe(&ds, "city").unwrap();
        assert_eq!(city.mean, None);
        assert_eq!(city.mode, Some(CellValue::from("Rome")));
    }
}
