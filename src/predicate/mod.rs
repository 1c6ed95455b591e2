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

//! Composable predicates over JSON values
//!
//! A [`ValuePredicate`] judges a value within an [`ExecutionContext`] and
//! explains its judgement with a [`PredicateResult`]. Predicates are
//! immutable once built, so a single predicate tree can be evaluated
//! concurrently against independent inputs.
//!
//! The families are:
//!
//! - comparisons against a fixed [`crate::evaluator::Operand`] ([`binary`], [`structural`])
//! - value location by path ([`PathPredicate`])
//! - boolean composition ([`logic`])
//! - quantified matching ([`MapPredicate`], [`CardinalityPredicate`], [`matches`])

pub mod binary;
pub mod cardinality;
pub mod logic;
pub mod map;
pub mod matches;
pub mod path;
pub mod structural;
pub mod transform;

pub use binary::{ComparisonOp, SimpleBinaryPredicate};
pub use cardinality::CardinalityPredicate;
pub use logic::{
    ConditionalPredicate, ConjunctivePredicate, DisjunctivePredicate, NegationPredicate,
};
pub use map::MapPredicate;
pub use matches::{DictMatchesPredicate, ListMatchesPredicate};
pub use path::{PathPredicate, path_contains, path_elements_contain, path_eq};
pub use structural::{
    ContainsPredicate, DictSubsetPredicate, DifferentPredicate, EquivalentPredicate,
    ListMembershipPredicate, ListSubsetPredicate,
};
pub use transform::{FieldDifference, FnTransform, Transform, ValueTransform};

use crate::evaluator::ExecutionContext;
use crate::result::PredicateResult;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a predicate of any kind
pub type Predicate = Arc<dyn ValuePredicate>;

/// Type-erased equality for predicate components held behind trait objects
///
/// Implemented for every `PartialEq` type, so concrete predicates and
/// transforms get it by deriving `PartialEq`.
pub trait PredicateIdentity {
    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Equality against another component of unknown type
    fn equals_any(&self, other: &dyn Any) -> bool;
}

impl<T: PartialEq + Any> PredicateIdentity for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals_any(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

/// Decides whether a JSON value is acceptable
pub trait ValuePredicate: fmt::Debug + fmt::Display + Send + Sync + PredicateIdentity {
    /// Apply the predicate to `value`
    ///
    /// Never fails: every mismatch between the value and the predicate is
    /// described by the returned result.
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult;
}

impl PartialEq for dyn ValuePredicate {
    fn eq(&self, other: &Self) -> bool {
        let other = <dyn ValuePredicate as PredicateIdentity>::as_any(other);
        <dyn ValuePredicate as PredicateIdentity>::equals_any(self, other)
    }
}

impl Serialize for dyn ValuePredicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl dyn ValuePredicate {
    /// Downcast to a concrete predicate type
    pub fn downcast_ref<T: ValuePredicate + 'static>(&self) -> Option<&T> {
        <dyn ValuePredicate as PredicateIdentity>::as_any(self).downcast_ref::<T>()
    }
}

/// Conversion into a shared [`Predicate`]
pub trait IntoPredicate {
    /// Wrap into a shared handle
    fn into_predicate(self) -> Predicate;
}

impl<P: ValuePredicate + 'static> IntoPredicate for P {
    fn into_predicate(self) -> Predicate {
        Arc::new(self)
    }
}

impl IntoPredicate for Predicate {
    fn into_predicate(self) -> Predicate {
        self
    }
}

/// Serialize concrete predicates as their display rendering
macro_rules! serialize_as_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl serde::Serialize for $ty {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }
        )*
    };
}

serialize_as_display!(
    SimpleBinaryPredicate,
    PathPredicate,
    CardinalityPredicate,
    MapPredicate,
    ConjunctivePredicate,
    DisjunctivePredicate,
    NegationPredicate,
    ConditionalPredicate,
    DictSubsetPredicate,
    ListSubsetPredicate,
    ListMembershipPredicate,
    ContainsPredicate,
    EquivalentPredicate,
    DifferentPredicate,
    DictMatchesPredicate,
    ListMatchesPredicate,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dyn_equality_compares_concrete_values() {
        let a = binary::str_eq("A").unwrap().into_predicate();
        let b = binary::str_eq("A").unwrap().into_predicate();
        let c = binary::str_eq("B").unwrap().into_predicate();
        let d = EquivalentPredicate::new("A").into_predicate();

        assert!(*a == *b);
        assert!(*a != *c);
        assert!(*a != *d);
    }

    #[test]
    fn test_downcast() {
        let pred = PathPredicate::new("a").into_predicate();
        assert!(pred.downcast_ref::<PathPredicate>().is_some());
        assert!(pred.downcast_ref::<MapPredicate>().is_none());
    }

    #[test]
    fn test_serializes_as_display() {
        let pred = binary::num_ge(3).unwrap().into_predicate();
        assert_eq!(serde_json::to_value(&pred).unwrap(), json!(">=(3)->number"));
    }
}
