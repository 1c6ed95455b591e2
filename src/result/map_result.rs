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

//! Result of mapping a predicate over the members of a list

use super::{CloneableWithSource, PredicateResult};
use crate::model::ArcJsonValue;
use crate::predicate::Predicate;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A member value and the result of applying the mapped predicate to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapAttempt {
    /// The member the predicate was applied to
    pub value: Value,
    /// What the predicate said about it
    pub result: PredicateResult,
}

impl MapAttempt {
    /// Reporting summary of the attempt
    pub fn summary(&self) -> String {
        self.result.summary()
    }
}

impl fmt::Display for MapAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.value, self.result)
    }
}

/// Outcome of a [`crate::predicate::MapPredicate`]
///
/// Attempts are kept in member order; the good and bad views partition them
/// by validity.
#[derive(Debug, Clone, Serialize)]
pub struct MapPredicateResult {
    valid: bool,
    pred: Predicate,
    attempts: Vec<MapAttempt>,
}

impl PartialEq for MapPredicateResult {
    fn eq(&self, other: &Self) -> bool {
        self.valid == other.valid
            && *self.pred == *other.pred
            && self.attempts == other.attempts
    }
}

impl MapPredicateResult {
    /// Whether the count of good attempts was within bounds
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The predicate that was mapped
    pub fn pred(&self) -> &Predicate {
        &self.pred
    }

    /// Every attempt in member order
    pub fn attempts(&self) -> &[MapAttempt] {
        &self.attempts
    }

    /// Per-member results in member order
    pub fn results(&self) -> impl Iterator<Item = &PredicateResult> {
        self.attempts.iter().map(|attempt| &attempt.result)
    }

    /// The members the predicate was mapped over
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.attempts.iter().map(|attempt| &attempt.value)
    }

    /// Attempts the predicate accepted
    pub fn good_attempts(&self) -> impl Iterator<Item = &MapAttempt> {
        self.attempts.iter().filter(|attempt| attempt.result.valid())
    }

    /// Attempts the predicate rejected
    pub fn bad_attempts(&self) -> impl Iterator<Item = &MapAttempt> {
        self.attempts.iter().filter(|attempt| !attempt.result.valid())
    }

    /// Number of accepted attempts
    pub fn good_count(&self) -> usize {
        self.good_attempts().count()
    }
}

impl CloneableWithSource for MapPredicateResult {
    fn clone_with_source(
        &self,
        source: &ArcJsonValue,
        base_target_path: &str,
        base_value_path: &str,
    ) -> Self {
        let mut builder = MapPredicateResultBuilder::new(self.pred.clone());
        for attempt in &self.attempts {
            builder.add_result(
                attempt.value.clone(),
                attempt
                    .result
                    .clone_with_source(source, base_target_path, base_value_path),
            );
        }
        builder.build(self.valid)
    }
}

impl fmt::Display for MapPredicateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Map({}) {} of {} good",
            self.pred,
            self.good_count(),
            self.attempts.len()
        )
    }
}

/// Builder for [`MapPredicateResult`]
#[derive(Debug)]
pub struct MapPredicateResultBuilder {
    pred: Predicate,
    attempts: Vec<MapAttempt>,
}

impl MapPredicateResultBuilder {
    /// Start a result for mapping `pred`
    pub fn new(pred: Predicate) -> Self {
        Self {
            pred,
            attempts: Vec::new(),
        }
    }

    /// Apply the mapped predicate to `value` and record the attempt
    pub fn apply_value(
        &mut self,
        context: &crate::evaluator::ExecutionContext,
        value: &Value,
    ) -> &PredicateResult {
        let result = self.pred.evaluate(context, value);
        self.add_result(value.clone(), result);
        &self.attempts[self.attempts.len() - 1].result
    }

    /// Record an attempt made elsewhere
    pub fn add_result(&mut self, value: Value, result: PredicateResult) -> &mut Self {
        self.attempts.push(MapAttempt { value, result });
        self
    }

    /// Number of accepted attempts so far
    pub fn good_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|attempt| attempt.result.valid())
            .count()
    }

    /// Freeze the result
    pub fn build(self, valid: bool) -> MapPredicateResult {
        MapPredicateResult {
            valid,
            pred: self.pred,
            attempts: self.attempts,
        }
    }
}
