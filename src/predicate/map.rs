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

//! Applying a predicate to every member of a list

use super::{IntoPredicate, Predicate, ValuePredicate};
use crate::evaluator::{ExecutionContext, Operand};
use crate::result::{MapPredicateResultBuilder, PredicateResult};
use serde_json::Value;
use std::fmt;

/// Maps a predicate over a list and bounds how many members satisfy it
///
/// A non-list value is treated as a list of one; null is treated as an
/// empty list. The bounds are operands, so they can be bound late through
/// the [`ExecutionContext`].
#[derive(Debug, Clone)]
pub struct MapPredicate {
    pred: Predicate,
    min: Operand,
    max: Operand,
}

impl MapPredicate {
    /// Require at least one member to satisfy `pred`
    pub fn new(pred: impl IntoPredicate) -> Self {
        Self {
            pred: pred.into_predicate(),
            min: Operand::from(1u32),
            max: Operand::default(),
        }
    }

    /// Minimum number of good members; null disables the bound
    pub fn with_min(mut self, min: impl Into<Operand>) -> Self {
        self.min = min.into();
        self
    }

    /// Maximum number of good members; null disables the bound
    pub fn with_max(mut self, max: impl Into<Operand>) -> Self {
        self.max = max.into();
        self
    }

    /// The mapped predicate
    pub fn pred(&self) -> &Predicate {
        &self.pred
    }

    /// Lower bound on good members
    pub fn min(&self) -> &Operand {
        &self.min
    }

    /// Upper bound on good members
    pub fn max(&self) -> &Operand {
        &self.max
    }
}

impl PartialEq for MapPredicate {
    fn eq(&self, other: &Self) -> bool {
        *self.pred == *other.pred && self.min == other.min && self.max == other.max
    }
}

impl fmt::Display for MapPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Map({})", self.pred)
    }
}

impl ValuePredicate for MapPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let members: &[Value] = match value {
            Value::Array(list) => list,
            Value::Null => &[],
            other => std::slice::from_ref(other),
        };

        let mut builder = MapPredicateResultBuilder::new(self.pred.clone());
        for member in members {
            builder.apply_value(context, member);
        }

        let good = builder.good_count();
        let too_few = context.eval_count(&self.min).is_some_and(|min| good < min);
        let too_many = context.eval_count(&self.max).is_some_and(|max| good > max);
        builder.build(!(too_few || too_many)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::binary::num_ge;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!([1, 5, 7]), 1, None, true)]
    #[case(json!([1, 2]), 1, None, false)]
    #[case(json!([5, 7]), 1, Some(1), false)]
    #[case(json!([5, 7]), 2, Some(2), true)]
    #[case(json!(9), 1, Some(1), true)]
    #[case(json!(null), 0, None, true)]
    #[case(json!(null), 1, None, false)]
    fn test_bounds(
        #[case] value: Value,
        #[case] min: usize,
        #[case] max: Option<usize>,
        #[case] valid: bool,
    ) {
        let pred = MapPredicate::new(num_ge(5).unwrap())
            .with_min(min)
            .with_max(max);
        assert_eq!(pred.evaluate(&ExecutionContext::new(), &value).valid(), valid);
    }

    #[test]
    fn test_partitions_attempts() {
        let pred = MapPredicate::new(num_ge(5).unwrap());
        let result = pred.evaluate(&ExecutionContext::new(), &json!([1, 5, 2, 8]));
        let map = result.as_map().unwrap();

        let good: Vec<&Value> = map.good_attempts().map(|attempt| &attempt.value).collect();
        let bad: Vec<&Value> = map.bad_attempts().map(|attempt| &attempt.value).collect();
        assert_eq!(good, vec![&json!(5), &json!(8)]);
        assert_eq!(bad, vec![&json!(1), &json!(2)]);
        assert_eq!(map.values().count(), 4);
        assert_eq!(result.to_string(), "Map(>=(5)->number) 2 of 4 good");
    }

    #[test]
    fn test_deferred_bounds() {
        let pred = MapPredicate::new(num_ge(5).unwrap()).with_max(Operand::variable("limit"));
        let value = json!([5, 6, 7]);

        let loose = ExecutionContext::new().with_variable("limit", 3);
        let tight = ExecutionContext::new().with_variable("limit", 2);
        assert!(pred.evaluate(&loose, &value).valid());
        assert!(!pred.evaluate(&tight, &value).valid());
        assert!(pred.evaluate(&ExecutionContext::new(), &value).valid());
    }
}
