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

//! Result of counting path matches against cardinality bounds

use super::PathPredicateResult;
use crate::model::ArcJsonValue;
use crate::predicate::{CardinalityPredicate, PathPredicate};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// How a count compared against the bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalityOutcome {
    /// The count was within bounds, including the expected absence of values
    Confirmed,
    /// Values were found where none were allowed
    UnexpectedValue,
    /// No values were found where some were expected
    MissingValue,
    /// Values were found but too few or too many
    FailedRange,
}

impl CardinalityOutcome {
    /// Reporting name of the outcome
    pub fn name(self) -> &'static str {
        match self {
            Self::Confirmed => "ConfirmedCardinalityResult",
            Self::UnexpectedValue => "UnexpectedValueCardinalityResult",
            Self::MissingValue => "MissingValueCardinalityResult",
            Self::FailedRange => "FailedCardinalityRangeResult",
        }
    }

    /// Only a confirmed outcome is valid
    pub fn is_valid(self) -> bool {
        self == Self::Confirmed
    }
}

/// Outcome of a [`CardinalityPredicate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardinalityResult {
    outcome: CardinalityOutcome,
    cardinality_pred: Arc<CardinalityPredicate>,
    path_predicate_result: PathPredicateResult,
}

impl CardinalityResult {
    pub(crate) fn new(
        outcome: CardinalityOutcome,
        cardinality_pred: Arc<CardinalityPredicate>,
        path_predicate_result: PathPredicateResult,
    ) -> Self {
        Self {
            outcome,
            cardinality_pred,
            path_predicate_result,
        }
    }

    /// The classification of the count
    pub fn outcome(&self) -> CardinalityOutcome {
        self.outcome
    }

    /// Whether the bounds were satisfied
    pub fn valid(&self) -> bool {
        self.outcome.is_valid()
    }

    /// The cardinality predicate that produced the result
    pub fn cardinality_pred(&self) -> &Arc<CardinalityPredicate> {
        &self.cardinality_pred
    }

    /// The path predicate used to collect values
    pub fn path_pred(&self) -> &Arc<PathPredicate> {
        self.path_predicate_result.pred()
    }

    /// The collected values
    pub fn path_predicate_result(&self) -> &PathPredicateResult {
        &self.path_predicate_result
    }

    /// Number of values that satisfied the predicate
    pub fn count(&self) -> usize {
        self.path_predicate_result.path_values().len()
    }

    /// The document values were collected from
    pub fn source(&self) -> &ArcJsonValue {
        self.path_predicate_result.source()
    }
}

impl fmt::Display for CardinalityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.count();
        let pred = &self.cardinality_pred;
        match self.outcome {
            CardinalityOutcome::Confirmed if count == 0 => {
                write!(f, "Confirmed no {}.", self.path_pred())
            }
            CardinalityOutcome::Confirmed => {
                write!(f, "Confirmed pred={pred} with count={count}")
            }
            CardinalityOutcome::UnexpectedValue => {
                write!(f, "Found unexpected count={count} pred={pred}")
            }
            CardinalityOutcome::MissingValue => {
                write!(f, "Expected to find {pred}. No values found.")
            }
            CardinalityOutcome::FailedRange => write!(
                f,
                "Found {count} {} but expected {}..{}",
                self.path_pred(),
                pred.min(),
                pred.max()
            ),
        }
    }
}
