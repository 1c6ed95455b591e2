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

//! Path-based query and predicate evaluation over JSON documents
//!
//! Predicates locate values inside a JSON document by slash-delimited paths,
//! test them with comparison, structural and logical predicates, and explain
//! every judgement with a structured result that says what was found, where,
//! and why it did or did not satisfy the predicate.
//!
//! ```
//! use json_predicate::{ExecutionContext, PathPredicate, ValuePredicate};
//! use json_predicate::predicate::binary::num_ge;
//! use serde_json::json;
//!
//! let doc = json!({"disks": [{"size": 10}, {"size": 200}]});
//! let pred = PathPredicate::new("disks/size").with_predicate(num_ge(100).unwrap());
//! let result = pred.collect(&ExecutionContext::new(), &doc);
//!
//! assert!(result.valid());
//! assert_eq!(result.path_values()[0].path, "disks[1]/size");
//! ```

pub mod error;
pub mod evaluator;
pub mod model;
pub mod predicate;
pub mod result;

// Re-export main types
pub use error::{PredicateError, Result};
pub use evaluator::{ExecutionContext, Operand};
pub use model::{ArcJsonValue, JsonType, PathValue};
pub use predicate::{
    CardinalityPredicate, ConditionalPredicate, ConjunctivePredicate, DictMatchesPredicate,
    DisjunctivePredicate, IntoPredicate, ListMatchesPredicate, MapPredicate, NegationPredicate,
    PathPredicate, Predicate, ValuePredicate,
};
pub use result::{
    CardinalityOutcome, CardinalityResult, KeyedPredicateResult, MapPredicateResult,
    PathPredicateResult, PathResult, PathResultKind, PredicateResult, SequencedPredicateResult,
};
