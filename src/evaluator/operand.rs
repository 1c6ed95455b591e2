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

//! Predicate operands that may be resolved at evaluation time

use super::context::ExecutionContext;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Function resolving a deferred operand against an execution context
pub type DeferredFn = dyn Fn(&ExecutionContext) -> Value + Send + Sync;

/// The fixed operand bound into a predicate
///
/// A literal is known when the predicate is built. A deferred operand is a
/// function of the [`ExecutionContext`] and is only resolved when the
/// predicate is applied, so a predicate can compare against values that are
/// not known until the test is running.
#[derive(Clone)]
pub enum Operand {
    /// Value known at construction
    Literal(Value),
    /// Value computed from the execution context at call time
    Deferred(Arc<DeferredFn>),
}

impl Operand {
    /// Create a literal operand
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a deferred operand from a function of the context
    pub fn deferred<F>(resolve: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Value + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(resolve))
    }

    /// Create a deferred operand reading a context variable
    ///
    /// An unbound variable resolves to `null`.
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::deferred(move |context| context.get(&name).cloned().unwrap_or(Value::Null))
    }

    /// The literal value, if this operand is not deferred
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }

    /// Whether the operand is resolved at call time
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Deferred(a), Self::Deferred(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Deferred(_) => f.write_str("<deferred>"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(value) => value.serialize(serializer),
            Self::Deferred(_) => serializer.serialize_str("<deferred>"),
        }
    }
}

impl Default for Operand {
    fn default() -> Self {
        Self::Literal(Value::Null)
    }
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_from!(
    Value,
    &str,
    String,
    bool,
    i32,
    i64,
    u32,
    u64,
    usize,
    f64,
    Vec<Value>,
    Map<String, Value>,
);

impl From<Option<usize>> for Operand {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Self::Literal(Value::Null), Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_conversions() {
        assert_eq!(Operand::from("a"), Operand::Literal(json!("a")));
        assert_eq!(Operand::from(3usize), Operand::Literal(json!(3)));
        assert_eq!(Operand::from(None::<usize>), Operand::Literal(Value::Null));
        assert_eq!(Operand::from(json!([1])).as_literal(), Some(&json!([1])));
    }

    #[test]
    fn test_deferred_identity() {
        let a = Operand::variable("x");
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Operand::variable("x"));
        assert!(a.is_deferred());
        assert_eq!(a.to_string(), "<deferred>");
    }
}
