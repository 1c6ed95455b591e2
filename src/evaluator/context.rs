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

//! Execution context shared by a predicate evaluation

use super::operand::Operand;
use crate::error::{PredicateError, Result};
use crate::model::JsonType;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

/// Variable bindings consulted when resolving deferred operands
///
/// The engine only reads the context. Populating it is up to the caller,
/// typically before running a group of predicates that reference the same
/// runtime values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionContext {
    variables: FxHashMap<String, Value>,
}

impl ExecutionContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Load bindings from a JSON object
    pub fn from_json(bindings: Value) -> Result<Self> {
        match bindings {
            Value::Object(map) => Ok(Self {
                variables: map.into_iter().collect(),
            }),
            other => Err(PredicateError::operand_type(
                "ExecutionContext",
                JsonType::Map,
                JsonType::of(&other),
            )),
        }
    }

    /// Builder-style variable binding
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Bind a variable, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.variables.insert(name.into(), value.into())
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Check whether a variable is bound
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Remove a variable binding
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether no variables are bound
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Resolve an operand: literals are returned as-is, deferred operands are invoked
    pub fn eval<'a>(&self, operand: &'a Operand) -> Cow<'a, Value> {
        match operand {
            Operand::Literal(value) => Cow::Borrowed(value),
            Operand::Deferred(resolve) => Cow::Owned(resolve(self)),
        }
    }

    /// Resolve an operand used as a count bound
    ///
    /// `null` means unbounded. Negative numbers clamp to zero and fractions
    /// are truncated. Non-numeric values are also treated as unbounded.
    pub fn eval_count(&self, operand: &Operand) -> Option<usize> {
        match self.eval(operand).as_ref() {
            Value::Null => None,
            Value::Number(n) => Some(match n.as_u64() {
                Some(count) => usize::try_from(count).unwrap_or(usize::MAX),
                None => n.as_f64().map_or(0, |count| count.max(0.0) as usize),
            }),
            other => {
                log::warn!("Count bound {other} is not a number; treating as unbounded");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variable_binding() {
        let mut context = ExecutionContext::new().with_variable("min", 2);
        assert!(context.contains("min"));
        assert_eq!(context.get("min"), Some(&json!(2)));
        assert_eq!(context.set("min", 3), Some(json!(2)));
        assert_eq!(context.remove("min"), Some(json!(3)));
        assert!(context.is_empty());
    }

    #[test]
    fn test_from_json() {
        let context = ExecutionContext::from_json(json!({"a": 1, "b": "x"})).unwrap();
        assert_eq!(context.len(), 2);
        assert_eq!(context.get("b"), Some(&json!("x")));

        assert!(ExecutionContext::from_json(json!([1])).is_err());
    }

    #[test]
    fn test_eval_literal_and_deferred() {
        let context = ExecutionContext::new().with_variable("key", "value");
        assert_eq!(context.eval(&Operand::from(5)).as_ref(), &json!(5));
        assert_eq!(context.eval(&Operand::variable("key")).as_ref(), &json!("value"));
        assert_eq!(context.eval(&Operand::variable("missing")).as_ref(), &Value::Null);
    }

    #[test]
    fn test_eval_count() {
        let context = ExecutionContext::new().with_variable("max", 4);
        assert_eq!(context.eval_count(&Operand::variable("max")), Some(4));
        assert_eq!(context.eval_count(&Operand::from(None::<usize>)), None);
        assert_eq!(context.eval_count(&Operand::from(-1)), Some(0));
        assert_eq!(context.eval_count(&Operand::from(2.5)), Some(2));
        assert_eq!(context.eval_count(&Operand::from("many")), None);
    }
}
