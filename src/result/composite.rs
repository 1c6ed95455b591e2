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

//! Ordered and keyed aggregations of sub-results

use super::{Cause, CloneableWithSource, PredicateResult};
use crate::error::{PredicateError, Result};
use crate::model::ArcJsonValue;
use crate::predicate::Predicate;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Sub-results of a composite predicate in the order they were produced
#[derive(Debug, Clone, Serialize)]
pub struct SequencedPredicateResult {
    valid: bool,
    pred: Predicate,
    results: Vec<PredicateResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<Cause>,
}

impl PartialEq for SequencedPredicateResult {
    fn eq(&self, other: &Self) -> bool {
        self.valid == other.valid
            && *self.pred == *other.pred
            && self.results == other.results
            && self.comment == other.comment
            && self.cause == other.cause
    }
}

impl SequencedPredicateResult {
    /// Whether the owning predicate considered the aggregate successful
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The predicate that produced the aggregate
    pub fn pred(&self) -> &Predicate {
        &self.pred
    }

    /// The sub-results in order
    pub fn results(&self) -> &[PredicateResult] {
        &self.results
    }

    /// Reporting comment
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Indirect cause
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl CloneableWithSource for SequencedPredicateResult {
    fn clone_with_source(
        &self,
        source: &ArcJsonValue,
        base_target_path: &str,
        base_value_path: &str,
    ) -> Self {
        Self {
            results: self
                .results
                .iter()
                .map(|result| result.clone_with_source(source, base_target_path, base_value_path))
                .collect(),
            ..self.clone()
        }
    }
}

impl fmt::Display for SequencedPredicateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, result) in self.results.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{result}")?;
        }
        f.write_str("]")
    }
}

/// Builder for [`SequencedPredicateResult`]
///
/// Validity is never inferred from the sub-results; the owning predicate
/// decides it when calling [`Self::build`].
#[derive(Debug)]
pub struct SequencedPredicateResultBuilder {
    pred: Predicate,
    results: Vec<PredicateResult>,
    /// Reporting comment for the built result
    pub comment: Option<String>,
    /// Indirect cause for the built result
    pub cause: Option<Cause>,
}

impl SequencedPredicateResultBuilder {
    /// Start an aggregate for `pred`
    pub fn new(pred: Predicate) -> Self {
        Self {
            pred,
            results: Vec::new(),
            comment: None,
            cause: None,
        }
    }

    /// Append a sub-result
    pub fn append_result(&mut self, result: PredicateResult) -> &mut Self {
        self.results.push(result);
        self
    }

    /// Append several sub-results
    pub fn extend_results(
        &mut self,
        results: impl IntoIterator<Item = PredicateResult>,
    ) -> &mut Self {
        self.results.extend(results);
        self
    }

    /// Freeze the aggregate
    pub fn build(self, valid: bool) -> SequencedPredicateResult {
        SequencedPredicateResult {
            valid,
            pred: self.pred,
            results: self.results,
            comment: self.comment,
            cause: self.cause,
        }
    }
}

/// Sub-results of a composite predicate under caller-chosen keys
///
/// Keys keep their insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct KeyedPredicateResult {
    valid: bool,
    pred: Predicate,
    results: IndexMap<String, PredicateResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<Cause>,
}

impl PartialEq for KeyedPredicateResult {
    fn eq(&self, other: &Self) -> bool {
        self.valid == other.valid
            && *self.pred == *other.pred
            && self.results == other.results
            && self.comment == other.comment
            && self.cause == other.cause
    }
}

impl KeyedPredicateResult {
    /// Whether the owning predicate considered the aggregate successful
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The predicate that produced the aggregate
    pub fn pred(&self) -> &Predicate {
        &self.pred
    }

    /// The sub-results by key
    pub fn results(&self) -> &IndexMap<String, PredicateResult> {
        &self.results
    }

    /// The sub-result recorded under `key`
    pub fn get(&self, key: &str) -> Option<&PredicateResult> {
        self.results.get(key)
    }

    /// Reporting comment
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Indirect cause
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl CloneableWithSource for KeyedPredicateResult {
    fn clone_with_source(
        &self,
        source: &ArcJsonValue,
        base_target_path: &str,
        base_value_path: &str,
    ) -> Self {
        Self {
            results: self
                .results
                .iter()
                .map(|(key, result)| {
                    (
                        key.clone(),
                        result.clone_with_source(source, base_target_path, base_value_path),
                    )
                })
                .collect(),
            ..self.clone()
        }
    }
}

impl fmt::Display for KeyedPredicateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, result)) in self.results.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {result}")?;
        }
        f.write_str("}")
    }
}

/// Builder for [`KeyedPredicateResult`]
#[derive(Debug)]
pub struct KeyedPredicateResultBuilder {
    pred: Predicate,
    results: IndexMap<String, PredicateResult>,
    /// Reporting comment for the built result
    pub comment: Option<String>,
    /// Indirect cause for the built result
    pub cause: Option<Cause>,
}

impl KeyedPredicateResultBuilder {
    /// Start an aggregate for `pred`
    pub fn new(pred: Predicate) -> Self {
        Self {
            pred,
            results: IndexMap::new(),
            comment: None,
            cause: None,
        }
    }

    /// Record a sub-result under a key not used before
    pub fn add_result(
        &mut self,
        key: impl Into<String>,
        result: PredicateResult,
    ) -> Result<&mut Self> {
        let key = key.into();
        if self.results.contains_key(&key) {
            return Err(PredicateError::DuplicateResultKey { key });
        }
        self.results.insert(key, result);
        Ok(self)
    }

    /// Merge sub-results, replacing any with the same key
    pub fn update_results(
        &mut self,
        results: impl IntoIterator<Item = (String, PredicateResult)>,
    ) -> &mut Self {
        self.results.extend(results);
        self
    }

    /// Freeze the aggregate
    pub fn build(self, valid: bool) -> KeyedPredicateResult {
        KeyedPredicateResult {
            valid,
            pred: self.pred,
            results: self.results,
            comment: self.comment,
            cause: self.cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PathValue;
    use crate::predicate::{IntoPredicate, NegationPredicate, PathPredicate};
    use crate::result::PathResult;
    use serde_json::json;

    fn pred() -> Predicate {
        NegationPredicate::new(PathPredicate::new("x")).into_predicate()
    }

    fn missing(target: &str) -> PredicateResult {
        PathResult::missing_path(json!({}), target, PathValue::root(json!({}))).into()
    }

    #[test]
    fn test_sequenced_builder_keeps_order() {
        let mut builder = SequencedPredicateResultBuilder::new(pred());
        builder
            .append_result(missing("a"))
            .extend_results([missing("b"), missing("c")]);
        builder.comment = Some("three".to_string());
        let result = builder.build(true);

        assert!(result.valid());
        assert_eq!(result.results().len(), 3);
        assert_eq!(result.comment(), Some("three"));
    }

    #[test]
    fn test_keyed_builder_rejects_duplicates() {
        let mut builder = KeyedPredicateResultBuilder::new(pred());
        builder.add_result("a", missing("a")).unwrap();
        let err = builder.add_result("a", missing("a")).unwrap_err();
        assert_eq!(err, PredicateError::DuplicateResultKey { key: "a".to_string() });

        builder.update_results([("a".to_string(), missing("z"))]);
        let result = builder.build(false);
        assert_eq!(result.results().len(), 1);
        match result.get("a") {
            Some(PredicateResult::Path(path)) => assert_eq!(path.target_path(), "z"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_clone_with_source_rewrites_children() {
        let mut builder = KeyedPredicateResultBuilder::new(pred());
        builder.add_result("k", missing("y")).unwrap();
        let result = builder.build(false);

        let outer = ArcJsonValue::new(json!({"x": {}}));
        let cloned = result.clone_with_source(&outer, "x", "x");
        match cloned.get("k") {
            Some(PredicateResult::Path(path)) => {
                assert_eq!(path.target_path(), "x/y");
                assert!(path.source().ptr_eq(&outer));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!cloned.valid());
    }
}
