//! Combining filter results

use rustc_hash::FxHashSet;

use crate::error::{Result, StoreError};
use crate::model::Dataset;

fn row_ids(dataset: &Dataset) -> FxHashSet<usize> {
    (0..dataset.len()).filter_map(|i| dataset.row_id(i)).collect()
}

/// Rows present in both `a` and `b`, matched by row identity.
///
/// Both inputs are expected to be filtered from the same parent dataset. The result keeps `a`'s
/// schema and row order.
pub fn logical_and(a: &Dataset, b: &Dataset) -> Result<Dataset> {
    let in_b = row_ids(b);
    let mask: Vec<bool> = (0..a.len())
        .map(|i| a.row_id(i).is_some_and(|id| in_b.contains(&id)))
        .collect();
    if mask.iter().any(|m| *m) {
        a.select_rows(&mask)
    } else {
        a.ensure_balanced()?;
        Ok(a.empty_like())
    }
}

/// Every row of `a`, plus the columns of `b` that `a` lacks.
///
/// This is a union of columns, not rows; both inputs must have the same row count.
pub fn logical_or(a: &Dataset, b: &Dataset) -> Result<Dataset> {
    a.ensure_balanced()?;
    b.ensure_balanced()?;
    if a.len() != b.len() {
        return Err(StoreError::LengthMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let mut out = a.clone();
    for col in b.columns() {
        if !out.has_column(col.name()) {
            out.add_column(col.name(), col.data().clone())?;
        }
    }
    Ok(out)
}

/// Rows of `a` followed by the rows of `b` not already in `a`, matched by row identity.
///
/// Both inputs must share a schema.
pub fn union_rows(a: &Dataset, b: &Dataset) -> Result<Dataset> {
    let in_a = row_ids(a);
    let mask: Vec<bool> = (0..b.len())
        .map(|i| b.row_id(i).is_some_and(|id| !in_a.contains(&id)))
        .collect();
    let extra = b.select_rows(&mask)?;
    let mut out = a.clone();
    out.append_dataset(&extra)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter, FilterOp};

    fn people() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_column("id", vec![1, 2, 3, 4, 5]).unwrap();
        ds.add_column("age", vec![25, 30, 22, 40, 35]).unwrap();
        ds
    }

    #[test]
    fn test_logical_and_intersects_rows() {
        let ds = people();
        let older = filter(&ds, "age", FilterOp::GreaterThan, 24).unwrap();
        let low_ids = filter(&ds, "id", FilterOp::LessThanOrEqual, 4).unwrap();
        let both = logical_and(&older, &low_ids).unwrap();
        assert_eq!(both.get_column::<i32>("id").unwrap(), &[1, 2, 4]);

        let none = filter(&ds, "id", FilterOp::Equal, 3).unwrap();
        let empty = logical_and(&older, &none).unwrap();
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.column_count(), 2);
    }

    #[test]
    fn test_logical_or_unions_columns() {
        let ds = people();
        let mut extra = Dataset::new();
        extra.add_column("age", vec![0; 5]).unwrap();
        extra.add_column("flag", vec![true; 5]).unwrap();

        let out = logical_or(&ds, &extra).unwrap();
        assert_eq!(out.column_names(), vec!["id", "age", "flag"]);
        assert_eq!(out.get_column::<i32>("age").unwrap(), &[25, 30, 22, 40, 35]);

        let short = filter(&ds, "id", FilterOp::Equal, 1).unwrap();
        assert!(matches!(
            logical_or(&ds, &short),
            Err(StoreError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_union_rows() {
        let ds = people();
        let young = filter(&ds, "age", FilterOp::LessThan, 26).unwrap();
        let old = filter(&ds, "age", FilterOp::GreaterThan, 24).unwrap();
        let all = union_rows(&young, &old).unwrap();
        assert_eq!(all.get_column::<i32>("id").unwrap(), &[1, 3, 2, 4, 5]);
    }
}
