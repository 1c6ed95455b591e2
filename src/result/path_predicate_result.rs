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

//! Result of collecting and filtering the values at a path

use super::{PathResult, PredicateResult};
use crate::model::{ArcJsonValue, PathValue};
use crate::predicate::PathPredicate;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A value reached by the path together with the result that judged it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPredicateResultCandidate {
    /// The value reached by the path
    pub path_value: PathValue,
    /// Justification for keeping or rejecting the value
    pub result: PredicateResult,
}

impl fmt::Display for PathPredicateResultCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.path_value, self.result)
    }
}

/// Values collected by a [`PathPredicate`]
///
/// Holds the values that made it through both the path and the filter, the
/// values that reached the end of the path but were rejected by the filter,
/// and the branches that were pruned before reaching the end of the path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPredicateResult {
    valid: bool,
    pred: Arc<PathPredicate>,
    source: ArcJsonValue,
    path_values: Vec<PathValue>,
    path_failures: Vec<PathResult>,
    valid_candidates: Vec<PathPredicateResultCandidate>,
    invalid_candidates: Vec<PathPredicateResultCandidate>,
}

impl PathPredicateResult {
    /// Whether the result is considered successful
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The path predicate that produced the result
    pub fn pred(&self) -> &Arc<PathPredicate> {
        &self.pred
    }

    /// The document the path was resolved against
    pub fn source(&self) -> &ArcJsonValue {
        &self.source
    }

    /// Path values that passed the filter
    pub fn path_values(&self) -> &[PathValue] {
        &self.path_values
    }

    /// The values of [`Self::path_values`]
    pub fn values(&self) -> Vec<&Value> {
        self.path_values.iter().map(|pv| &pv.value).collect()
    }

    /// First point of failure for each pruned branch
    pub fn path_failures(&self) -> &[PathResult] {
        &self.path_failures
    }

    /// Justification for each value in [`Self::path_values`]
    pub fn valid_candidates(&self) -> &[PathPredicateResultCandidate] {
        &self.valid_candidates
    }

    /// Values that reached the end of the path but failed the filter
    pub fn invalid_candidates(&self) -> &[PathPredicateResultCandidate] {
        &self.invalid_candidates
    }
}

impl fmt::Display for PathPredicateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PathPredicateResult #valid={} #invalid={} #pruned={}",
            self.valid_candidates.len(),
            self.invalid_candidates.len(),
            self.path_failures.len()
        )
    }
}

/// Accumulates candidates and pruned branches into a [`PathPredicateResult`]
#[derive(Debug)]
pub struct PathPredicateResultBuilder {
    pred: Arc<PathPredicate>,
    source: ArcJsonValue,
    path_values: Vec<PathValue>,
    path_failures: Vec<PathResult>,
    valid_candidates: Vec<PathPredicateResultCandidate>,
    invalid_candidates: Vec<PathPredicateResultCandidate>,
}

impl PathPredicateResultBuilder {
    /// Start a result for `pred` applied to `source`
    pub fn new(source: ArcJsonValue, pred: Arc<PathPredicate>) -> Self {
        Self {
            pred,
            source,
            path_values: Vec::new(),
            path_failures: Vec::new(),
            valid_candidates: Vec::new(),
            invalid_candidates: Vec::new(),
        }
    }

    /// The document being traversed
    pub fn source(&self) -> &ArcJsonValue {
        &self.source
    }

    /// Record why a branch was pruned
    pub fn add_path_failure(&mut self, failure: PathResult) -> &mut Self {
        self.path_failures.push(failure);
        self
    }

    /// Record several pruned branches
    pub fn add_all_path_failures(
        &mut self,
        failures: impl IntoIterator<Item = PathResult>,
    ) -> &mut Self {
        self.path_failures.extend(failures);
        self
    }

    /// Record a value that reached the end of the path
    ///
    /// The candidate is kept when `result` is valid and rejected otherwise.
    pub fn add_result_candidate(
        &mut self,
        path_value: PathValue,
        result: PredicateResult,
    ) -> &mut Self {
        if result.valid() {
            self.path_values.push(path_value.clone());
            self.valid_candidates
                .push(PathPredicateResultCandidate { path_value, result });
        } else {
            self.invalid_candidates
                .push(PathPredicateResultCandidate { path_value, result });
        }
        self
    }

    /// Build with validity meaning "at least one value was kept"
    pub fn build(self) -> PathPredicateResult {
        let valid = !self.path_values.is_empty();
        self.build_with_validity(valid)
    }

    /// Build with an explicit validity
    pub fn build_with_validity(self, valid: bool) -> PathPredicateResult {
        PathPredicateResult {
            valid,
            pred: self.pred,
            source: self.source,
            path_values: self.path_values,
            path_failures: self.path_failures,
            valid_candidates: self.valid_candidates,
            invalid_candidates: self.invalid_candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate_result(valid: bool) -> PredicateResult {
        PathResult::value(json!(1), "a", PathValue::new("a", json!(1)), valid, None).into()
    }

    #[test]
    fn test_builder_partitions_candidates() {
        let source = ArcJsonValue::new(json!({"a": 1}));
        let mut builder =
            PathPredicateResultBuilder::new(source.clone(), Arc::new(PathPredicate::new("a")));
        builder
            .add_result_candidate(PathValue::new("a", json!(1)), candidate_result(true))
            .add_result_candidate(PathValue::new("a", json!(2)), candidate_result(false))
            .add_path_failure(PathResult::missing_path(
                source.clone(),
                "b",
                PathValue::root(json!({"a": 1})),
            ));
        let result = builder.build();

        assert!(result.valid());
        assert_eq!(result.path_values(), &[PathValue::new("a", json!(1))]);
        assert_eq!(result.values(), vec![&json!(1)]);
        assert_eq!(result.invalid_candidates().len(), 1);
        assert_eq!(result.path_failures().len(), 1);
        assert_eq!(
            result.to_string(),
            "PathPredicateResult #valid=1 #invalid=1 #pruned=1"
        );
    }

    #[test]
    fn test_validity_override() {
        let builder = PathPredicateResultBuilder::new(
            ArcJsonValue::new(json!(null)),
            Arc::new(PathPredicate::new("")),
        );
        assert!(builder.build_with_validity(true).valid());

        let builder = PathPredicateResultBuilder::new(
            ArcJsonValue::new(json!(null)),
            Arc::new(PathPredicate::new("")),
        );
        assert!(!builder.build().valid());
    }
}
