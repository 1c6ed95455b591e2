// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Structural comparison of JSON values
//!
//! serde_json distinguishes `1` from `1.0`; predicates compare numbers by
//! magnitude, so equality here is implemented by hand.

use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Compare two numbers by magnitude
///
/// Integers are compared exactly; anything involving a float falls back to
/// `f64` comparison, which is `None` only for NaN.
pub fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => None,
    }
}

/// Deep equality with numeric comparison for numbers
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Order of two values if both are numbers
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        _ => None,
    }
}

/// Check whether `list` contains an element equal to `elem`
pub fn list_contains(list: &[Value], elem: &Value) -> bool {
    list.iter().any(|item| values_equal(item, elem))
}

/// Order-independent list equality
///
/// Each element of `a` must pair with a distinct equal element of `b`.
pub fn lists_equivalent(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut unmatched: Vec<&Value> = b.iter().collect();
    for item in a {
        match unmatched.iter().position(|other| values_equal(item, other)) {
            Some(index) => {
                unmatched.swap_remove(index);
            }
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_by_magnitude() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!(2)));
        assert_eq!(compare_values(&json!(3), &json!(2.5)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!("a"), &json!(1)), None);
    }

    #[test]
    fn test_nested_equality() {
        assert!(values_equal(
            &json!({"a": [1, {"b": 2.0}]}),
            &json!({"a": [1.0, {"b": 2}]})
        ));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_lists_equivalent_ignores_order() {
        assert!(lists_equivalent(&[json!(1), json!("a"), json!(1)], &[json!("a"), json!(1), json!(1)]));
        assert!(!lists_equivalent(&[json!(1), json!(1)], &[json!(1), json!(2)]));
        assert!(!lists_equivalent(&[json!(1)], &[json!(1), json!(1)]));
    }

    #[test]
    fn test_list_contains() {
        assert!(list_contains(&[json!("a"), json!(2)], &json!(2.0)));
        assert!(!list_contains(&[json!("a")], &json!("b")));
    }
}
