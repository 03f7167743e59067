//! Row sorting
//!
//! Sorts projected rows by an order spec, deterministically.

use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::planner::{OrderSpec, SortDirection};

/// Sorts result rows
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts rows by every term of `order` in turn. Sort is stable.
    pub fn sort(rows: &mut [Map<String, Value>], order: &OrderSpec) {
        rows.sort_by(|a, b| {
            for term in order.terms() {
                let ordering = compare_values(a.get(&term.attribute), b.get(&term.attribute));
                let ordering = match term.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
}

/// Total order over JSON values
///
/// Ordering rules:
/// - missing = null < bool < number < string < array < object
/// - for same types, natural ordering; arrays and objects compare equal
/// - two RFC 3339 strings compare as instants
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    let type_order = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        _ => type_order(a).cmp(&type_order(b)),
    }
}

/// SQL-style comparison: `None` when either side is null or the types differ
pub fn compare_sql(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Bool(_), Value::Bool(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_)) => Some(compare_values(Some(a), Some(b))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::OrderTerm;
    use serde_json::json;

    fn row(id: i64, age: i64) -> Map<String, Value> {
        json!({"id": id, "age": age}).as_object().cloned().unwrap()
    }

    fn ids(rows: &[Map<String, Value>]) -> Vec<i64> {
        rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn test_sort_ascending() {
        let mut rows = vec![row(3, 30), row(1, 20), row(2, 25)];
        ResultSorter::sort(&mut rows, &OrderSpec::new(vec![OrderTerm::asc("age")]));
        assert_eq!(ids(&rows), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_descending_with_tie_break() {
        let mut rows = vec![row(1, 25), row(3, 30), row(2, 25)];
        ResultSorter::sort(
            &mut rows,
            &OrderSpec::new(vec![OrderTerm::desc("age"), OrderTerm::asc("id")]),
        );
        assert_eq!(ids(&rows), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_stable() {
        let mut rows = vec![row(1, 25), row(2, 25), row(3, 25)];
        ResultSorter::sort(&mut rows, &OrderSpec::new(vec![OrderTerm::asc("age")]));
        assert_eq!(ids(&rows), vec![1, 2, 3]);
    }

    #[test]
    fn test_type_ordering() {
        assert_eq!(compare_values(None, Some(&json!(false))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(true)), Some(&json!(0))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(99)), Some(&json!("1"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(2.0))), Ordering::Equal);
    }

    #[test]
    fn test_timestamps_compare_as_instants() {
        let utc = json!("2021-03-01T10:00:00Z");
        let offset = json!("2021-03-01T11:30:00+02:00");
        assert_eq!(compare_values(Some(&offset), Some(&utc)), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!("2021-03-01T10:00:00+00:00")), Some(&utc)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_sql_comparison_unknown() {
        assert_eq!(compare_sql(&json!(null), &json!(1)), None);
        assert_eq!(compare_sql(&json!("a"), &json!(1)), None);
        assert_eq!(compare_sql(&json!("a"), &json!("b")), Some(Ordering::Less));
    }
}
