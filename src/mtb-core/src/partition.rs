//! N-dimensional row partitioning
//!
//! Splits row indices into one group per combination of key-column values.
//! Distinct values are collected in first-encountered order, which makes
//! group order deterministic for a given input. Combinations are laid out
//! row-major with the last column varying fastest.

use std::collections::HashMap;

use log::debug;

use mtb_shared::{Error, LabelKey, Result, Value};

/// Partition rows by the cross-product of per-column label sequences.
///
/// `columns` holds one equal-length value slice per key. When
/// `explicit_labels` supplies a label sequence for the axes, rows whose
/// value does not appear in it are silently dropped; explicit label sets
/// act as a filter on which values participate.
///
/// Returns one index group per label combination (row-major, last axis
/// fastest) together with the final per-axis label sequences.
pub fn partition_nd(
    columns: &[&[Value]],
    explicit_labels: Option<&[Vec<Value>]>,
) -> Result<(Vec<Vec<usize>>, Vec<Vec<Value>>)> {
    if columns.is_empty() {
        return Err(Error::missing_args(
            "partitioning requires at least one key column".to_string(),
        ));
    }
    let rows = columns[0].len();
    for (i, column) in columns.iter().enumerate() {
        if column.len() != rows {
            return Err(Error::operation(format!(
                "key column {i} has {} rows, expected {rows}",
                column.len()
            )));
        }
    }
    if let Some(explicit) = explicit_labels {
        if explicit.len() != columns.len() {
            return Err(Error::operation(format!(
                "{} label sequences supplied for {} key columns",
                explicit.len(),
                columns.len()
            )));
        }
    }

    let labels: Vec<Vec<Value>> = match explicit_labels {
        Some(explicit) => explicit.iter().map(|seq| dedup(seq)).collect(),
        None => columns.iter().map(|column| dedup(column)).collect(),
    };

    // per-axis label -> position
    let positions: Vec<HashMap<LabelKey, usize>> = labels
        .iter()
        .map(|seq| {
            seq.iter()
                .enumerate()
                .map(|(i, v)| (LabelKey(v.clone()), i))
                .collect()
        })
        .collect();

    let total: usize = labels.iter().map(Vec::len).product();
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); total];

    'rows: for row in 0..rows {
        let mut flat = 0;
        for (column, (axis_labels, axis_positions)) in
            columns.iter().zip(labels.iter().zip(&positions))
        {
            let key = LabelKey(column[row].clone());
            match axis_positions.get(&key) {
                Some(pos) => flat = flat * axis_labels.len() + pos,
                // value absent from an explicit label set: drop the row
                None => continue 'rows,
            }
        }
        groups[flat].push(row);
    }

    debug!(
        "partitioned {rows} rows into {total} groups over {} axes",
        columns.len()
    );
    Ok((groups, labels))
}

fn dedup(values: &[Value]) -> Vec<Value> {
    let mut seen = HashMap::new();
    let mut out = Vec::new();
    for value in values {
        let key = LabelKey(value.clone());
        if seen.insert(key, ()).is_none() {
            out.push(value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn test_single_axis() {
        let col = ints(&[0, 0, 1, 1, 1]);
        let (groups, labels) = partition_nd(&[&col], None).unwrap();
        assert_eq!(labels, vec![ints(&[0, 1])]);
        assert_eq!(groups, vec![vec![0, 1], vec![2, 3, 4]]);
    }

    #[test]
    fn test_first_encountered_order() {
        let col = ints(&[2, 0, 2, 1]);
        let (groups, labels) = partition_nd(&[&col], None).unwrap();
        assert_eq!(labels, vec![ints(&[2, 0, 1])]);
        assert_eq!(groups, vec![vec![0, 2], vec![1], vec![3]]);
    }

    #[test]
    fn test_two_axes_row_major() {
        let a = ints(&[0, 0, 1, 1]);
        let b = ints(&[0, 1, 0, 1]);
        let (groups, labels) = partition_nd(&[&a, &b], None).unwrap();
        assert_eq!(labels, vec![ints(&[0, 1]), ints(&[0, 1])]);
        // last axis fastest: (0,0), (0,1), (1,0), (1,1)
        assert_eq!(groups, vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_explicit_labels_drop_unlisted_rows() {
        let col = ints(&[0, 2, 1, 2]);
        let explicit = vec![ints(&[0, 1])];
        let (groups, labels) = partition_nd(&[&col], Some(&explicit)).unwrap();
        assert_eq!(labels, explicit);
        assert_eq!(groups, vec![vec![0], vec![2]]);
    }

    #[test]
    fn test_explicit_labels_fix_order_and_width() {
        let col = ints(&[1, 1]);
        let explicit = vec![ints(&[0, 1, 2])];
        let (groups, labels) = partition_nd(&[&col], Some(&explicit)).unwrap();
        assert_eq!(labels, explicit);
        assert_eq!(groups, vec![vec![], vec![0, 1], vec![]]);
    }

    #[test]
    fn test_unequal_columns_rejected() {
        let a = ints(&[0, 1]);
        let b = ints(&[0]);
        assert!(partition_nd(&[&a, &b], None).is_err());
    }

    proptest! {
        // every row lands in exactly one group, unless dropped by an
        // explicit label set
        #[test]
        fn prop_partition_is_complete(
            a in proptest::collection::vec(0i64..4, 0..40),
            b in proptest::collection::vec(0i64..3, 0..40),
        ) {
            let n = a.len().min(b.len());
            let col_a = ints(&a[..n]);
            let col_b = ints(&b[..n]);
            let (groups, _) = partition_nd(&[&col_a, &col_b], None).unwrap();
            let mut seen: Vec<usize> = groups.into_iter().flatten().collect();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
        }
    }
}
