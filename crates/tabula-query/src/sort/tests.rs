use super::*;
use crate::SortOrder;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::cmp::Ordering;
use tabula_core::Value;

fn items() -> Vec<Vec<Value>> {
    vec![
        vec![Value::Int64(1), "a".into(), Value::Float64(10.0)],
        vec![Value::Int64(2), "b".into(), Value::Null],
        vec![Value::Int64(3), "c".into(), Value::Float64(5.0)],
    ]
}

fn ids(rows: &[Vec<Value>]) -> Vec<i64> {
    rows.iter().filter_map(|r| r[0].as_i64()).collect()
}

#[rstest]
#[case(Value::Null)]
#[case(Value::Float64(f64::NAN))]
#[case(Value::String(String::new()))]
#[case(Value::String("   ".into()))]
#[case(Value::String("NULL".into()))]
#[case(Value::String("Undefined".into()))]
#[case(Value::String(" - ".into()))]
#[case(Value::Array(vec![]))]
#[case(Value::Json(serde_json::json!({})))]
fn recognizes_empty_values(#[case] value: Value) {
    assert!(is_empty_value(&value), "{:?}", value);
}

#[rstest]
#[case(Value::Int64(0))]
#[case(Value::Bool(false))]
#[case(Value::String("0".into()))]
#[case(Value::String("--".into()))]
#[case(Value::Json(serde_json::json!({"k": 1})))]
fn keeps_real_values(#[case] value: Value) {
    assert!(!is_empty_value(&value), "{:?}", value);
}

#[rstest]
#[case(SortOrder::Asc, vec![3, 1, 2])]
#[case(SortOrder::Desc, vec![1, 3, 2])]
fn empty_price_sorts_last_in_both_directions(#[case] order: SortOrder, #[case] expected: Vec<i64>) {
    let mut rows = items();
    normalize_rows(&mut rows, 2, order);
    assert_eq!(ids(&rows), expected);
}

#[test]
fn numeric_strings_compare_numerically() {
    let mut rows = vec![
        vec![Value::Int64(1), "10".into()],
        vec![Value::Int64(2), "9".into()],
        vec![Value::Int64(3), Value::Float64(9.5)],
    ];
    normalize_rows(&mut rows, 1, SortOrder::Asc);
    assert_eq!(ids(&rows), vec![2, 3, 1]);
}

#[test]
fn timestamps_compare_as_instants() {
    let mut rows = vec![
        vec![Value::Int64(1), "2024-03-01T10:00:00+02:00".into()],
        vec![Value::Int64(2), "2024-03-01 09:00:00".into()],
        vec![Value::Int64(3), "2024-02-28".into()],
    ];
    normalize_rows(&mut rows, 1, SortOrder::Asc);
    assert_eq!(ids(&rows), vec![3, 1, 2]);
}

#[test]
fn text_compares_case_insensitively_after_trim() {
    assert_eq!(
        compare_values(&"  apple".into(), &"Banana".into(), SortOrder::Asc),
        Ordering::Less
    );
    assert_eq!(
        compare_values(&"APPLE".into(), &"apple ".into(), SortOrder::Desc),
        Ordering::Equal
    );
}

#[test]
fn ties_keep_input_order() {
    let mut rows = vec![
        vec![Value::Int64(1), "x".into()],
        vec![Value::Int64(2), Value::Null],
        vec![Value::Int64(3), "X".into()],
        vec![Value::Int64(4), "".into()],
        vec![Value::Int64(5), "x ".into()],
    ];
    normalize_rows(&mut rows, 1, SortOrder::Desc);
    assert_eq!(ids(&rows), vec![1, 3, 5, 2, 4]);
}

#[test]
fn mixed_kinds_do_not_panic() {
    let mut rows: Vec<Vec<Value>> = ["10", "9", "1a", "2024-01-01", "b", "-", "3"]
        .iter()
        .enumerate()
        .map(|(i, v)| vec![Value::Int64(i as i64), Value::String(v.to_string())])
        .collect();
    normalize_rows(&mut rows, 1, SortOrder::Asc);

    assert_eq!(rows.len(), 7);
    assert_eq!(rows.last().unwrap()[1], Value::String("-".into()));
}

#[test]
fn missing_column_counts_as_empty() {
    let mut rows = vec![vec![Value::Int64(1)], vec![Value::Int64(2), "a".into()]];
    normalize_rows(&mut rows, 1, SortOrder::Asc);
    assert_eq!(ids(&rows), vec![2, 1]);
}

#[test]
fn empty_never_precedes_non_empty() {
    let values = [
        Value::Null,
        Value::Int64(4),
        "".into(),
        "zeta".into(),
        Value::Float64(f64::NAN),
        "2023-12-31".into(),
        "null".into(),
        Value::Float64(-2.0),
    ];
    for order in [SortOrder::Asc, SortOrder::Desc] {
        let mut rows: Vec<Vec<Value>> = values.iter().map(|v| vec![v.clone()]).collect();
        normalize_rows(&mut rows, 0, order);
        let first_empty = rows.iter().position(|r| is_empty_value(&r[0])).unwrap();
        assert!(rows[first_empty..].iter().all(|r| is_empty_value(&r[0])));
        assert_eq!(first_empty, 4);
    }
}
