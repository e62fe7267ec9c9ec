use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::cmp::Ordering;
use tabula_core::Value;

use crate::SortOrder;

const EMPTY_MARKERS: [&str; 3] = ["null", "undefined", "-"];

static MISSING: Value = Value::Null;

/// Whether a cell counts as empty for ordering purposes.
///
/// Empty cells always sort after non-empty ones, whichever direction was
/// requested.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Float64(f) => f.is_nan(),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.is_empty()
                || EMPTY_MARKERS
                    .iter()
                    .any(|marker| trimmed.eq_ignore_ascii_case(marker))
        }
        Value::Array(items) => items.is_empty(),
        Value::Json(serde_json::Value::Object(map)) => map.is_empty(),
        Value::Json(serde_json::Value::Array(items)) => items.is_empty(),
        Value::Json(serde_json::Value::Null) => true,
        _ => false,
    }
}

/// How a non-empty cell compares against another
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Number(f64),
    Instant(DateTime<Utc>),
    Text(String),
}

impl SortKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::Int64(i) => SortKey::Number(*i as f64),
            Value::Float64(f) => SortKey::Number(*f),
            Value::Bool(b) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Some(number) = trimmed.parse::<f64>().ok().filter(|n| n.is_finite()) {
                    SortKey::Number(number)
                } else if let Some(instant) = parse_instant(trimmed) {
                    SortKey::Instant(instant)
                } else {
                    SortKey::Text(trimmed.to_lowercase())
                }
            }
            other => SortKey::Text(text_form(other).trim().to_lowercase()),
        }
    }

    fn text(&self, value: &Value) -> String {
        match self {
            SortKey::Text(t) => t.clone(),
            _ => text_form(value).trim().to_lowercase(),
        }
    }
}

fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bytes(b) => hex::encode(b),
        Value::Json(j) => j.to_string(),
        Value::Array(items) => serde_json::Value::from(Value::Array(items.clone())).to_string(),
        other => other.to_string(),
    }
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Compare two cells: empties last, then numeric, temporal or
/// case-insensitive lexical comparison. `order` only flips the comparison
/// between two non-empty cells.
pub fn compare_values(a: &Value, b: &Value, order: SortOrder) -> Ordering {
    match (is_empty_value(a), is_empty_value(b)) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let (key_a, key_b) = (SortKey::of(a), SortKey::of(b));
    let ordering = match (&key_a, &key_b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SortKey::Instant(x), SortKey::Instant(y)) => x.cmp(y),
        _ => key_a.text(a).cmp(&key_b.text(b)),
    };

    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Stable in-place reorder of `rows` by the cell at `column`.
///
/// Rows too short to have the column are treated as empty.
pub fn normalize_rows(rows: &mut Vec<Vec<Value>>, column: usize, order: SortOrder) {
    merge_sort_by(rows, &|a: &Vec<Value>, b: &Vec<Value>| {
        compare_values(
            a.get(column).unwrap_or(&MISSING),
            b.get(column).unwrap_or(&MISSING),
            order,
        )
    });
}

/// Top-down stable merge sort.
///
/// Mixed numeric, temporal and text cells in one column do not form a
/// transitive order, and `slice::sort_by` may panic on such comparators.
/// A merge sort only ever asks "is b strictly before a", so it always
/// terminates with a stable result.
fn merge_sort_by<T, F>(items: &mut Vec<T>, compare: &F)
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    let mut right = items.split_off(items.len() / 2);
    merge_sort_by(items, compare);
    merge_sort_by(&mut right, compare);

    let left = std::mem::take(items);
    items.reserve(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        if let Some(item) = next {
            items.push(item);
        }
    }
}
