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

//! Outcome records produced by predicates
//!
//! Every predicate evaluation returns a [`PredicateResult`]. `valid` is the
//! only truthiness signal; comments and causes are for reporting. The set of
//! result kinds is closed so reporting code can match on it exhaustively.

#![warn(missing_docs)]

mod cardinality_result;
mod composite;
mod map_result;
mod path_predicate_result;
mod path_result;

pub use cardinality_result::{CardinalityOutcome, CardinalityResult};
pub use composite::{
    KeyedPredicateResult, KeyedPredicateResultBuilder, SequencedPredicateResult,
    SequencedPredicateResultBuilder,
};
pub use map_result::{MapAttempt, MapPredicateResult, MapPredicateResultBuilder};
pub use path_predicate_result::{
    PathPredicateResult, PathPredicateResultBuilder, PathPredicateResultCandidate,
};
pub use path_result::{PathResult, PathResultKind};

use crate::model::ArcJsonValue;
use serde::Serialize;
use std::fmt;

/// An indirect reason attached to a result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    /// An error raised while producing the result
    Error(String),
    /// A nested result that explains this one
    Result(Box<PredicateResult>),
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => f.write_str(message),
            Self::Result(result) => write!(f, "{result}"),
        }
    }
}

impl From<crate::error::PredicateError> for Cause {
    fn from(err: crate::error::PredicateError) -> Self {
        Self::Error(err.to_string())
    }
}

/// Results that can be re-expressed relative to an outer document
///
/// A predicate applied to a value found at some path reports paths relative
/// to that value. When the result surfaces through the outer predicate it is
/// cloned with the outer `source`, with `base_target_path` prepended to the
/// sought path and `base_value_path` prepended to the path actually taken.
pub trait CloneableWithSource {
    /// Clone with paths re-rooted at `source`
    fn clone_with_source(
        &self,
        source: &ArcJsonValue,
        base_target_path: &str,
        base_value_path: &str,
    ) -> Self;
}

/// Outcome of applying a predicate to a value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredicateResult {
    /// A value found, missing or mismatched at a path
    Path(PathResult),
    /// Values collected at a path
    PathPredicate(PathPredicateResult),
    /// Ordered sub-results of a composite predicate
    Sequenced(SequencedPredicateResult),
    /// Keyed sub-results of a composite predicate
    Keyed(KeyedPredicateResult),
    /// A predicate mapped over list members
    Map(MapPredicateResult),
    /// A count of matches classified against bounds
    Cardinality(CardinalityResult),
}

impl PredicateResult {
    /// Whether the result is considered successful
    pub fn valid(&self) -> bool {
        match self {
            Self::Path(result) => result.valid(),
            Self::PathPredicate(result) => result.valid(),
            Self::Sequenced(result) => result.valid(),
            Self::Keyed(result) => result.valid(),
            Self::Map(result) => result.valid(),
            Self::Cardinality(result) => result.valid(),
        }
    }

    /// Reporting comment, if any
    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::Path(result) => result.comment(),
            Self::Sequenced(result) => result.comment(),
            Self::Keyed(result) => result.comment(),
            Self::PathPredicate(_) | Self::Map(_) | Self::Cardinality(_) => None,
        }
    }

    /// Indirect cause, if any
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            Self::Path(result) => result.cause(),
            Self::Sequenced(result) => result.cause(),
            Self::Keyed(result) => result.cause(),
            Self::PathPredicate(_) | Self::Map(_) | Self::Cardinality(_) => None,
        }
    }

    /// Reporting name of the result kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Path(result) => result.kind().name(),
            Self::PathPredicate(_) => "PathPredicateResult",
            Self::Sequenced(_) => "SequencedPredicateResult",
            Self::Keyed(_) => "KeyedPredicateResult",
            Self::Map(_) => "MapPredicateResult",
            Self::Cardinality(result) => result.outcome().name(),
        }
    }

    /// `"<comment or kind> (GOOD|BAD)"`
    pub fn summary(&self) -> String {
        let message = self.comment().unwrap_or_else(|| self.kind_name());
        let valid = if self.valid() { "GOOD" } else { "BAD" };
        format!("{message} ({valid})")
    }

    /// Whether [`Self::clone_with_source`] rewrites this kind of result
    pub fn is_cloneable_with_source(&self) -> bool {
        matches!(
            self,
            Self::Path(_) | Self::Sequenced(_) | Self::Keyed(_) | Self::Map(_)
        )
    }

    /// Re-root the result at an outer document
    ///
    /// Kinds without path context of their own are returned unchanged.
    pub fn clone_with_source(
        &self,
        source: &ArcJsonValue,
        base_target_path: &str,
        base_value_path: &str,
    ) -> Self {
        match self {
            Self::Path(result) => {
                Self::Path(result.clone_with_source(source, base_target_path, base_value_path))
            }
            Self::Sequenced(result) => Self::Sequenced(result.clone_with_source(
                source,
                base_target_path,
                base_value_path,
            )),
            Self::Keyed(result) => {
                Self::Keyed(result.clone_with_source(source, base_target_path, base_value_path))
            }
            Self::Map(result) => {
                Self::Map(result.clone_with_source(source, base_target_path, base_value_path))
            }
            Self::PathPredicate(_) | Self::Cardinality(_) => self.clone(),
        }
    }

    /// The underlying collected values for path and cardinality results
    pub fn path_predicate_result(&self) -> Option<&PathPredicateResult> {
        match self {
            Self::PathPredicate(result) => Some(result),
            Self::Cardinality(result) => Some(result.path_predicate_result()),
            _ => None,
        }
    }

    /// The result as a path result
    pub fn as_path(&self) -> Option<&PathResult> {
        match self {
            Self::Path(result) => Some(result),
            _ => None,
        }
    }

    /// The result as a sequenced aggregate
    pub fn as_sequenced(&self) -> Option<&SequencedPredicateResult> {
        match self {
            Self::Sequenced(result) => Some(result),
            _ => None,
        }
    }

    /// The result as a keyed aggregate
    pub fn as_keyed(&self) -> Option<&KeyedPredicateResult> {
        match self {
            Self::Keyed(result) => Some(result),
            _ => None,
        }
    }

    /// The result as a map result
    pub fn as_map(&self) -> Option<&MapPredicateResult> {
        match self {
            Self::Map(result) => Some(result),
            _ => None,
        }
    }

    /// The result as a cardinality result
    pub fn as_cardinality(&self) -> Option<&CardinalityResult> {
        match self {
            Self::Cardinality(result) => Some(result),
            _ => None,
        }
    }
}

impl fmt::Display for PredicateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(result) => fmt::Display::fmt(result, f),
            Self::PathPredicate(result) => fmt::Display::fmt(result, f),
            Self::Sequenced(result) => fmt::Display::fmt(result, f),
            Self::Keyed(result) => fmt::Display::fmt(result, f),
            Self::Map(result) => fmt::Display::fmt(result, f),
            Self::Cardinality(result) => fmt::Display::fmt(result, f),
        }
    }
}

impl From<PathResult> for PredicateResult {
    fn from(result: PathResult) -> Self {
        Self::Path(result)
    }
}

impl From<PathPredicateResult> for PredicateResult {
    fn from(result: PathPredicateResult) -> Self {
        Self::PathPredicate(result)
    }
}

impl From<SequencedPredicateResult> for PredicateResult {
    fn from(result: SequencedPredicateResult) -> Self {
        Self::Sequenced(result)
    }
}

impl From<KeyedPredicateResult> for PredicateResult {
    fn from(result: KeyedPredicateResult) -> Self {
        Self::Keyed(result)
    }
}

impl From<MapPredicateResult> for PredicateResult {
    fn from(result: MapPredicateResult) -> Self {
        Self::Map(result)
    }
}

impl From<CardinalityResult> for PredicateResult {
    fn from(result: CardinalityResult) -> Self {
        Self::Cardinality(result)
    }
}
