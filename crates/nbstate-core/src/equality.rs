#![forbid(unsafe_code)]

//! Structural equality and record diffing.
//!
//! Typed values compare with their `PartialEq` implementation, which for the
//! derived data model is a deep, field-by-field comparison. Operations that
//! need to look at *keys* (ignoring fields, listing changed fields) work on
//! the JSON record form of a value, obtained through `serde`.
//!
//! # Invariants
//!
//! 1. `changed_keys(a, a)` is empty.
//! 2. `deep_equals_ignoring(a, b, &[])` agrees with comparing the JSON forms.
//! 3. `remove_keys` never mutates its input.

use std::rc::Rc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// A JSON object: the record form of a serialised struct or map.
pub type Record = Map<String, Value>;

/// Structural equality.
#[inline]
#[must_use]
pub fn deep_equals<T: PartialEq + ?Sized>(a: &T, b: &T) -> bool {
    a == b
}

/// Structural equality after stripping `ignore_keys` from the top level of
/// both operands.
///
/// Nested records keep their keys; only the outermost record is projected.
/// Non-record values are compared as-is.
pub fn deep_equals_ignoring<T: Serialize + ?Sized>(
    a: &T,
    b: &T,
    ignore_keys: &[&str],
) -> Result<bool> {
    let a = strip_top_level(serde_json::to_value(a)?, ignore_keys);
    let b = strip_top_level(serde_json::to_value(b)?, ignore_keys);
    Ok(a == b)
}

fn strip_top_level(value: Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(record) if !keys.is_empty() => Value::Object(remove_keys(&record, keys)),
        other => other,
    }
}

/// Fast-path equality for identity and empty containers.
///
/// Returns `true` for equal scalars, two empty records, or two empty arrays.
/// Non-empty records and arrays are never compared and yield `false`.
#[must_use]
pub fn shallow_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => x.is_empty() && y.is_empty(),
        (Value::Array(x), Value::Array(y)) => x.is_empty() && y.is_empty(),
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => false,
        (x, y) => x == y,
    }
}

/// Reference identity of two shared snapshots.
#[inline]
#[must_use]
pub fn shallow_equals_rc<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    Rc::ptr_eq(a, b)
}

/// Whether a value has no own entries.
///
/// Scalars have no entries and are reported as empty.
#[must_use]
pub fn is_empty_record(value: &Value) -> bool {
    match value {
        Value::Object(record) => record.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => true,
    }
}

/// Convert a serialisable value into its record form.
pub fn to_record<T: Serialize + ?Sized>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(record) => Ok(record),
        other => Err(CoreError::not_a_record(&other)),
    }
}

/// Top-level keys whose values differ between `old` and `new`.
///
/// Keys of `old` come first (in record order), followed by keys that only
/// exist in `new`. Wholly equal records short-circuit to an empty list.
#[must_use]
pub fn changed_keys(old: &Record, new: &Record) -> Vec<String> {
    if old == new {
        return Vec::new();
    }
    let mut keys: Vec<String> = old
        .iter()
        .filter(|(key, value)| new.get(key.as_str()) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    keys.extend(new.keys().filter(|key| !old.contains_key(key.as_str())).cloned());
    keys
}

/// [`changed_keys`] over the record form of two typed values.
pub fn changed_fields<T: Serialize + ?Sized>(old: &T, new: &T) -> Result<Vec<String>> {
    Ok(changed_keys(&to_record(old)?, &to_record(new)?))
}

/// A copy of `record` without `keys`.
#[must_use]
pub fn remove_keys(record: &Record, keys: &[&str]) -> Record {
    record
        .iter()
        .filter(|(key, _)| !keys.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Whether every key in `keys` is present in both records with equal values.
///
/// Vacuously true for an empty key list.
#[must_use]
pub fn equals_by_key(a: &Record, b: &Record, keys: &[&str]) -> bool {
    keys.iter().all(|key| match (a.get(*key), b.get(*key)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(record) => record,
            other => panic!("expected a record, got {other}"),
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Pair {
        a: i32,
        b: i32,
    }

    #[test]
    fn deep_equals_is_structural() {
        assert!(deep_equals(&vec![json!({"x": [1, 2]})], &vec![json!({"x": [1, 2]})]));
        assert!(!deep_equals(&Pair { a: 1, b: 2 }, &Pair { a: 1, b: 3 }));
    }

    #[test]
    fn ignoring_keys_strips_top_level_only() {
        let x = json!({"a": 1, "b": {"skip": 1}, "skip": 1});
        let y = json!({"a": 1, "b": {"skip": 1}, "skip": 2});
        assert!(deep_equals_ignoring(&x, &y, &["skip"]).unwrap());

        let nested_x = json!({"a": {"skip": 1}});
        let nested_y = json!({"a": {"skip": 2}});
        assert!(!deep_equals_ignoring(&nested_x, &nested_y, &["skip"]).unwrap());
    }

    #[test]
    fn ignoring_keys_on_typed_values() {
        let x = Pair { a: 1, b: 2 };
        let y = Pair { a: 1, b: 99 };
        assert!(deep_equals_ignoring(&x, &y, &["b"]).unwrap());
        assert!(!deep_equals_ignoring(&x, &y, &[]).unwrap());
    }

    #[test]
    fn shallow_equals_empty_containers() {
        assert!(shallow_equals(&json!({}), &json!({})));
        assert!(shallow_equals(&json!([]), &json!([])));
        assert!(shallow_equals(&json!(3), &json!(3)));
        assert!(!shallow_equals(&json!({}), &json!([])));
        assert!(!shallow_equals(&json!([1]), &json!([1])));
        assert!(!shallow_equals(&json!({"a": 1}), &json!({"a": 1})));
    }

    #[test]
    fn shallow_equals_rc_is_identity() {
        let a = Rc::new(vec![1]);
        let b = Rc::clone(&a);
        let c = Rc::new(vec![1]);
        assert!(shallow_equals_rc(&a, &b));
        assert!(!shallow_equals_rc(&a, &c));
    }

    #[test]
    fn empty_records() {
        assert!(is_empty_record(&json!({})));
        assert!(is_empty_record(&json!([])));
        assert!(is_empty_record(&json!(null)));
        assert!(!is_empty_record(&json!({"a": 1})));
    }

    #[test]
    fn changed_keys_equal_records() {
        let a = record(json!({"a": 1, "b": 2}));
        assert!(changed_keys(&a, &a.clone()).is_empty());
    }

    #[test]
    fn changed_keys_single_change() {
        let a = record(json!({"a": 1, "b": 2}));
        let b = record(json!({"a": 1, "b": 9}));
        assert_eq!(changed_keys(&a, &b), vec!["b".to_string()]);
    }

    #[test]
    fn changed_keys_added_and_removed() {
        let a = record(json!({"a": 1, "gone": true}));
        let b = record(json!({"a": 1, "new": true}));
        assert_eq!(changed_keys(&a, &b), vec!["gone".to_string(), "new".to_string()]);
    }

    #[test]
    fn changed_fields_on_structs() {
        let keys = changed_fields(&Pair { a: 1, b: 2 }, &Pair { a: 5, b: 2 }).unwrap();
        assert_eq!(keys, vec!["a".to_string()]);
    }

    #[test]
    fn to_record_rejects_scalars() {
        let err = to_record(&5).unwrap_err();
        assert!(matches!(err, CoreError::NotARecord { kind: "number" }));
    }

    #[test]
    fn remove_keys_leaves_input_untouched() {
        let a = record(json!({"a": 1, "b": 2, "c": 3}));
        let stripped = remove_keys(&a, &["b", "c"]);
        assert_eq!(Value::Object(stripped), json!({"a": 1}));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn equals_by_key_requires_presence() {
        let a = record(json!({"a": 1, "b": 2}));
        let b = record(json!({"a": 1, "b": 3}));
        assert!(equals_by_key(&a, &b, &["a"]));
        assert!(!equals_by_key(&a, &b, &["a", "b"]));
        assert!(!equals_by_key(&a, &b, &["missing"]));
    }
}
