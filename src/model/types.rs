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

//! Runtime shape tags for JSON values

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The shape of a JSON value
///
/// Predicates dispatch on this tag rather than on the value itself when they
/// need to report what they expected versus what they found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// Object with string keys
    Map,
    /// Ordered sequence
    List,
    /// String scalar
    String,
    /// Integer or floating point scalar
    Number,
    /// Boolean scalar
    Boolean,
    /// The null scalar
    Null,
}

impl JsonType {
    /// Determine the shape of a value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Map,
            Value::Array(_) => Self::List,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
        }
    }

    /// Check whether a value has this shape
    pub fn matches(self, value: &Value) -> bool {
        Self::of(value) == self
    }

    /// Scalars are everything except maps and lists
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Map | Self::List)
    }

    /// Lowercase name used in messages
    pub fn name(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::List => "list",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_of_values() {
        assert_eq!(JsonType::of(&json!({"a": 1})), JsonType::Map);
        assert_eq!(JsonType::of(&json!([1])), JsonType::List);
        assert_eq!(JsonType::of(&json!("x")), JsonType::String);
        assert_eq!(JsonType::of(&json!(1.5)), JsonType::Number);
        assert_eq!(JsonType::of(&json!(false)), JsonType::Boolean);
        assert_eq!(JsonType::of(&Value::Null), JsonType::Null);
    }

    #[test]
    fn test_scalar_classification() {
        assert!(JsonType::Number.is_scalar());
        assert!(JsonType::Null.is_scalar());
        assert!(!JsonType::List.is_scalar());
        assert!(!JsonType::Map.is_scalar());
    }

    #[test]
    fn test_serialized_name() {
        assert_eq!(serde_json::to_value(JsonType::Map).unwrap(), json!("map"));
    }
}
