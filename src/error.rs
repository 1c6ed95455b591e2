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

//! Construction errors for predicates and result builders
//!
//! Data never produces an error: every mismatch between a value and a
//! predicate is reported as a [`crate::result::PredicateResult`]. The errors in
//! this module describe predicates that were put together incorrectly.

use crate::model::JsonType;
use thiserror::Error;

/// Result type for predicate construction
pub type Result<T> = std::result::Result<T, PredicateError>;

/// Errors raised while building predicates or results
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredicateError {
    /// A literal operand does not have the shape the predicate requires
    #[error("{predicate} operand must be a {expected}, got {actual}")]
    OperandType {
        /// Predicate name
        predicate: String,
        /// Required operand shape
        expected: JsonType,
        /// Shape that was supplied
        actual: JsonType,
    },

    /// A regular expression operand failed to compile
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidRegex {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// A transform was given a nested field name
    #[error("Nested field '{field}' is not supported")]
    NestedField {
        /// The offending field name
        field: String,
    },

    /// A keyed result builder already holds a result under this key
    #[error("Result key '{key}' already exists")]
    DuplicateResultKey {
        /// The duplicated key
        key: String,
    },

    /// A transform could not produce a value
    #[error("Transform {transform} failed: {message}")]
    Transform {
        /// Transform rendering
        transform: String,
        /// Failure description
        message: String,
    },
}

impl PredicateError {
    /// Create an operand type error
    pub fn operand_type(predicate: impl Into<String>, expected: JsonType, actual: JsonType) -> Self {
        Self::OperandType {
            predicate: predicate.into(),
            expected,
            actual,
        }
    }

    /// Create a transform failure
    pub fn transform(transform: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Transform {
            transform: transform.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_type_message() {
        let err = PredicateError::operand_type("has-subset", JsonType::Map, JsonType::List);
        assert_eq!(err.to_string(), "has-subset operand must be a map, got list");
    }

    #[test]
    fn test_duplicate_key_message() {
        let err = PredicateError::DuplicateResultKey {
            key: "name".to_string(),
        };
        assert_eq!(err.to_string(), "Result key 'name' already exists");
    }
}
