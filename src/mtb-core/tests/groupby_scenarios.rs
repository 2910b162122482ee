//! End-to-end group-by scenarios

use pretty_assertions::assert_eq;

use mtb_core::{Axis, Context, Expr, GroupBy, Value};

fn single_key_ctx() -> Context {
    Context::new([("a".to_string(), Value::from_ints(vec![0, 0, 1, 1, 1]))]).unwrap()
}

fn two_key_ctx() -> Context {
    Context::new([
        ("a".to_string(), Value::from_ints(vec![0, 0, 1, 1])),
        ("b".to_string(), Value::from_ints(vec![0, 1, 0, 1])),
    ])
    .unwrap()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|i| Value::Int(*i)).collect()
}

#[test]
fn test_single_key_counts() {
    let result = GroupBy::new(vec![Expr::var("a")])
        .totals(false)
        .compute(&single_key_ctx())
        .unwrap();
    assert_eq!(result.axes, vec![Axis::new("a", ints(&[0, 1]))]);
    assert_eq!(result.data, ints(&[2, 3]));
    assert_eq!(result.row_totals, None);
    assert_eq!(result.col_totals, None);
}

#[test]
fn test_single_key_totals() {
    let result = GroupBy::new(vec![Expr::var("a")])
        .compute(&single_key_ctx())
        .unwrap();
    assert_eq!(result.data, ints(&[2, 3]));
    // one outer combination, so a single row total spanning everything
    assert_eq!(result.row_totals, Some(ints(&[5])));
    // per-label column totals, then the grand total
    assert_eq!(result.col_totals, Some(ints(&[2, 3, 5])));
    assert_eq!(result.grand_total(), Some(&Value::Int(5)));
}

#[test]
fn test_two_keys_grid() {
    let result = GroupBy::new(vec![Expr::var("a"), Expr::var("b")])
        .compute(&two_key_ctx())
        .unwrap();
    assert_eq!(
        result.axes,
        vec![Axis::new("a", ints(&[0, 1])), Axis::new("b", ints(&[0, 1]))]
    );
    assert_eq!(result.shape, vec![2, 2]);
    assert_eq!(result.data, ints(&[1, 1, 1, 1]));
    assert_eq!(result.row_totals, Some(ints(&[2, 2])));
    assert_eq!(result.col_totals, Some(ints(&[2, 2, 4])));
    assert_eq!(result.grand_total(), Some(&Value::Int(4)));
}

#[test]
fn test_zero_matching_rows_is_empty() {
    let filter = Expr::var("a").gt(Expr::lit(Value::Int(100)));
    let result = GroupBy::new(vec![Expr::var("a")])
        .filter(filter)
        .compute(&single_key_ctx())
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.shape, vec![0]);
    assert_eq!(result.grand_total(), None);
}

#[test]
fn test_filter_restricts_rows() {
    let filter = Expr::var("a").eq(Expr::lit(Value::Int(1)));
    let result = GroupBy::new(vec![Expr::var("a")])
        .filter(filter)
        .compute(&single_key_ctx())
        .unwrap();
    assert_eq!(result.axes[0].labels, ints(&[1]));
    assert_eq!(result.data, ints(&[3]));
}

#[test]
fn test_sum_aggregation() {
    let ctx = Context::new([
        ("a".to_string(), Value::from_ints(vec![0, 0, 1, 1, 1])),
        (
            "income".to_string(),
            Value::from_floats(vec![10.0, 20.0, 1.0, 2.0, 3.0]),
        ),
    ])
    .unwrap();
    let result = GroupBy::new(vec![Expr::var("a")])
        .aggregate(Expr::call("sum", vec![Expr::var("income")]))
        .compute(&ctx)
        .unwrap();
    assert_eq!(result.data, vec![Value::Float(30.0), Value::Float(6.0)]);
    assert_eq!(result.grand_total(), Some(&Value::Float(36.0)));
}

#[test]
fn test_totals_are_consistent_for_additive_aggregations() {
    let ctx = Context::new([
        ("a".to_string(), Value::from_ints(vec![0, 1, 2, 0, 1, 2, 0])),
        ("b".to_string(), Value::from_ints(vec![0, 0, 1, 1, 0, 0, 1])),
        (
            "v".to_string(),
            Value::from_ints(vec![1, 2, 3, 4, 5, 6, 7]),
        ),
    ])
    .unwrap();
    let result = GroupBy::new(vec![Expr::var("a"), Expr::var("b")])
        .aggregate(Expr::call("sum", vec![Expr::var("v")]))
        .compute(&ctx)
        .unwrap();

    let sum = |values: &[Value]| -> i64 {
        values
            .iter()
            .map(|v| match v {
                Value::Int(i) => *i,
                other => panic!("unexpected total {other:?}"),
            })
            .sum()
    };
    let rows = result.row_totals.as_ref().unwrap();
    let cols = result.col_totals.as_ref().unwrap();
    let grand = match result.grand_total().unwrap() {
        Value::Int(i) => *i,
        other => panic!("unexpected grand total {other:?}"),
    };
    assert_eq!(sum(rows), grand);
    assert_eq!(sum(&cols[..cols.len() - 1]), grand);
    assert_eq!(grand, 28);
}

#[test]
fn test_percent_closure() {
    let result = GroupBy::new(vec![Expr::var("a")])
        .percent(true)
        .compute(&single_key_ctx())
        .unwrap();
    let cells: Vec<f64> = result
        .data
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert!((cells.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    assert_eq!(cells, vec![40.0, 60.0]);
    assert_eq!(result.grand_total(), Some(&Value::Float(100.0)));
}

#[test]
fn test_percent_forces_totals() {
    let result = GroupBy::new(vec![Expr::var("a")])
        .totals(false)
        .percent(true)
        .compute(&single_key_ctx())
        .unwrap();
    assert!(result.col_totals.is_some());
    assert_eq!(result.grand_total(), Some(&Value::Float(100.0)));
}

#[test]
fn test_percent_with_zero_grand_total_is_infinite() {
    let ctx = Context::new([
        ("a".to_string(), Value::from_ints(vec![0, 1])),
        ("v".to_string(), Value::from_floats(vec![-1.0, 1.0])),
    ])
    .unwrap();
    let result = GroupBy::new(vec![Expr::var("a")])
        .aggregate(Expr::call("sum", vec![Expr::var("v")]))
        .percent(true)
        .compute(&ctx)
        .unwrap();
    assert_eq!(result.data[0], Value::Float(f64::NEG_INFINITY));
    assert_eq!(result.data[1], Value::Float(f64::INFINITY));
}

#[test]
fn test_explicit_labels_pin_order_and_drop_unlisted() {
    let result = GroupBy::new(vec![Expr::var("a")])
        .explicit_labels(vec![ints(&[1, 0])])
        .totals(false)
        .compute(&single_key_ctx())
        .unwrap();
    assert_eq!(result.axes[0].labels, ints(&[1, 0]));
    assert_eq!(result.data, ints(&[3, 2]));

    let dropped = GroupBy::new(vec![Expr::var("a")])
        .explicit_labels(vec![ints(&[0])])
        .compute(&single_key_ctx())
        .unwrap();
    assert_eq!(dropped.data, ints(&[2]));
    assert_eq!(dropped.grand_total(), Some(&Value::Int(2)));
}

#[test]
fn test_supplied_axes_name_the_result() {
    let axes = vec![Axis::new("group", ints(&[0, 1]))];
    let result = GroupBy::new(vec![Expr::var("a")])
        .axes(axes)
        .totals(false)
        .compute(&single_key_ctx())
        .unwrap();
    assert_eq!(result.axes[0].name, "group");
    assert_eq!(result.data, ints(&[2, 3]));
}

#[test]
fn test_ambient_and_call_filter_compose() {
    let ctx = Context::new([
        ("a".to_string(), Value::from_ints(vec![0, 0, 1, 1, 1])),
        (
            "keep".to_string(),
            Value::from_bools(vec![true, true, true, false, true]),
        ),
    ])
    .unwrap()
    .with_filter(Expr::var("keep"));
    let result = GroupBy::new(vec![Expr::var("a")])
        .filter(Expr::var("a").eq(Expr::lit(Value::Int(1))))
        .compute(&ctx)
        .unwrap();
    assert_eq!(result.axes[0].labels, ints(&[1]));
    assert_eq!(result.data, ints(&[2]));
}
