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

//! Transforms applied to located values before they are reported

use super::PredicateIdentity;
use crate::error::{PredicateError, Result};
use crate::evaluator::ExecutionContext;
use crate::model::{JsonType, PATH_SEP};
use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

/// Shared handle to a transform of any kind
pub type Transform = Arc<dyn ValueTransform>;

/// Maps a located value into the value that is reported for it
pub trait ValueTransform: fmt::Debug + fmt::Display + Send + Sync + PredicateIdentity {
    /// Produce the reported value
    fn apply(&self, context: &ExecutionContext, value: &Value) -> Result<Value>;
}

impl PartialEq for dyn ValueTransform {
    fn eq(&self, other: &Self) -> bool {
        let other = <dyn ValueTransform as PredicateIdentity>::as_any(other);
        <dyn ValueTransform as PredicateIdentity>::equals_any(self, other)
    }
}

/// Difference between two numeric fields of a map value
///
/// Integers stay integers; any float operand makes the result a float.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDifference {
    minuend: String,
    subtractend: String,
}

impl FieldDifference {
    /// Subtract field `subtractend` from field `minuend`
    ///
    /// Only top-level fields are supported.
    pub fn new(minuend: impl Into<String>, subtractend: impl Into<String>) -> Result<Self> {
        let minuend = minuend.into();
        let subtractend = subtractend.into();
        for field in [&minuend, &subtractend] {
            if field.contains(PATH_SEP) {
                return Err(PredicateError::NestedField {
                    field: field.clone(),
                });
            }
        }
        Ok(Self {
            minuend,
            subtractend,
        })
    }

    /// Field subtracted from
    pub fn minuend(&self) -> &str {
        &self.minuend
    }

    /// Field subtracted
    pub fn subtractend(&self) -> &str {
        &self.subtractend
    }

    fn field<'a>(&self, value: &'a Value, name: &str) -> Result<&'a Number> {
        match value.get(name) {
            Some(Value::Number(number)) => Ok(number),
            Some(other) => Err(PredicateError::transform(
                self,
                format!("field '{name}' is a {}", JsonType::of(other)),
            )),
            None => Err(PredicateError::transform(
                self,
                format!("field '{name}' is missing"),
            )),
        }
    }
}

impl fmt::Display for FieldDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(\"{}\" - \"{}\")", self.minuend, self.subtractend)
    }
}

impl ValueTransform for FieldDifference {
    fn apply(&self, _context: &ExecutionContext, value: &Value) -> Result<Value> {
        let a = self.field(value, &self.minuend)?;
        let b = self.field(value, &self.subtractend)?;

        if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
            if let Some(difference) = a.checked_sub(b) {
                return Ok(Value::from(difference));
            }
        }
        let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
        Number::from_f64(a - b)
            .map(Value::Number)
            .ok_or_else(|| PredicateError::transform(self, "difference is not finite"))
    }
}

/// Function signature wrapped by [`FnTransform`]
pub type TransformFn = dyn Fn(&ExecutionContext, &Value) -> Result<Value> + Send + Sync;

/// A named transform backed by a closure
///
/// Two closure transforms are equal only if they share the same closure.
#[derive(Clone)]
pub struct FnTransform {
    name: String,
    func: Arc<TransformFn>,
}

impl FnTransform {
    /// Wrap `func` under a reporting name
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&ExecutionContext, &Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl PartialEq for FnTransform {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for FnTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FnTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl ValueTransform for FnTransform {
    fn apply(&self, context: &ExecutionContext, value: &Value) -> Result<Value> {
        (self.func)(context, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_difference() {
        let context = ExecutionContext::new();
        let diff = FieldDifference::new("end", "start").unwrap();
        assert_eq!(diff.apply(&context, &json!({"end": 10, "start": 4})).unwrap(), json!(6));
        assert_eq!(
            diff.apply(&context, &json!({"end": 1.5, "start": 1})).unwrap(),
            json!(0.5)
        );
        assert_eq!(diff.to_string(), "(\"end\" - \"start\")");
    }

    #[test]
    fn test_field_difference_errors() {
        assert_eq!(
            FieldDifference::new("a/b", "c").unwrap_err(),
            PredicateError::NestedField {
                field: "a/b".to_string()
            }
        );

        let diff = FieldDifference::new("end", "start").unwrap();
        let err = diff
            .apply(&ExecutionContext::new(), &json!({"end": "x", "start": 1}))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Transform (\"end\" - \"start\") failed: field 'end' is a string"
        );
    }

    #[test]
    fn test_fn_transform_identity() {
        let upper = FnTransform::new("upper", |_, value| {
            Ok(Value::from(value.as_str().unwrap_or_default().to_uppercase()))
        });
        let same: Transform = Arc::new(upper.clone());
        let other: Transform = Arc::new(FnTransform::new("upper", |_, value| Ok(value.clone())));
        let original: Transform = Arc::new(upper);

        assert!(*original == *same);
        assert!(*original != *other);
        assert_eq!(
            original.apply(&ExecutionContext::new(), &json!("abc")).unwrap(),
            json!("ABC")
        );
    }
}
