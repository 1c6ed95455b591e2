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

//! Counting the values a path predicate collects

use super::{IntoPredicate, PathPredicate, Predicate, ValuePredicate};
use crate::evaluator::{ExecutionContext, Operand};
use crate::result::{CardinalityOutcome, CardinalityResult, PredicateResult};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Bounds the number of values a [`PathPredicate`] collects
///
/// Absence is judged before the range: finding nothing is a missing value
/// unless the upper bound is exactly zero, and finding anything when the
/// upper bound is zero is an unexpected value regardless of the lower bound.
#[derive(Debug, Clone, PartialEq)]
pub struct CardinalityPredicate {
    path_pred: PathPredicate,
    min: Operand,
    max: Operand,
}

impl CardinalityPredicate {
    /// Count values accepted by `pred`
    ///
    /// A predicate that is not already a [`PathPredicate`] is applied to the
    /// value itself through an empty path.
    pub fn new(pred: impl IntoPredicate) -> Self {
        let pred = pred.into_predicate();
        let path_pred = match pred.downcast_ref::<PathPredicate>() {
            Some(path_pred) => path_pred.clone(),
            None => PathPredicate::new("").with_predicate(pred),
        };
        Self {
            path_pred,
            min: Operand::from(0u32),
            max: Operand::default(),
        }
    }

    /// Minimum count; null disables the bound
    pub fn with_min(mut self, min: impl Into<Operand>) -> Self {
        self.min = min.into();
        self
    }

    /// Maximum count; null disables the bound
    pub fn with_max(mut self, max: impl Into<Operand>) -> Self {
        self.max = max.into();
        self
    }

    /// The path predicate whose values are counted
    pub fn path_pred(&self) -> &PathPredicate {
        &self.path_pred
    }

    /// The predicate the collected values are filtered with, if any
    pub fn filter_pred(&self) -> Option<&Predicate> {
        self.path_pred.pred()
    }

    /// Lower count bound
    pub fn min(&self) -> &Operand {
        &self.min
    }

    /// Upper count bound
    pub fn max(&self) -> &Operand {
        &self.max
    }

    fn classify(&self, context: &ExecutionContext, count: usize) -> CardinalityOutcome {
        let min = context.eval_count(&self.min).unwrap_or(0);
        let max = context.eval_count(&self.max);
        match (count, max) {
            (0, Some(0)) => CardinalityOutcome::Confirmed,
            (0, _) => CardinalityOutcome::MissingValue,
            (_, Some(0)) => CardinalityOutcome::UnexpectedValue,
            (count, max) if count >= min && max.is_none_or(|max| count <= max) => {
                CardinalityOutcome::Confirmed
            }
            _ => CardinalityOutcome::FailedRange,
        }
    }
}

impl fmt::Display for CardinalityPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cardinality({}) {}..{}", self.path_pred, self.min, self.max)
    }
}

impl ValuePredicate for CardinalityPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let collected = self.path_pred.collect(context, value);
        let count = collected.path_values().len();
        let outcome = self.classify(context, count);
        log::debug!("{} with count={count} is {}", self, outcome.name());
        CardinalityResult::new(outcome, Arc::new(self.clone()), collected).into()
    }
}
