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

//! Boolean composition of predicates with short-circuit evaluation

use super::{IntoPredicate, Predicate, ValuePredicate};
use crate::evaluator::ExecutionContext;
use crate::result::{PredicateResult, SequencedPredicateResultBuilder};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

fn fmt_joined(f: &mut fmt::Formatter<'_>, predicates: &[Predicate], join: &str) -> fmt::Result {
    for (index, pred) in predicates.iter().enumerate() {
        if index > 0 {
            write!(f, " {join} ")?;
        }
        write!(f, "{pred}")?;
    }
    Ok(())
}

/// AND: evaluates predicates in order until one fails
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConjunctivePredicate {
    predicates: Vec<Predicate>,
}

impl ConjunctivePredicate {
    /// Conjunction of `predicates`
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    /// Add a conjunct
    pub fn push(&mut self, pred: impl IntoPredicate) {
        self.predicates.push(pred.into_predicate());
    }

    /// The conjuncts
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

impl fmt::Display for ConjunctivePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_joined(f, &self.predicates, "AND")
    }
}

impl ValuePredicate for ConjunctivePredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let mut builder = SequencedPredicateResultBuilder::new(Arc::new(self.clone()));
        let mut valid = true;
        for pred in &self.predicates {
            let result = pred.evaluate(context, value);
            let passed = result.valid();
            builder.append_result(result);
            if !passed {
                valid = false;
                break;
            }
        }
        builder.build(valid).into()
    }
}

/// OR: evaluates predicates in order until one succeeds
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisjunctivePredicate {
    predicates: Vec<Predicate>,
}

impl DisjunctivePredicate {
    /// Disjunction of `predicates`
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    /// Add a disjunct
    pub fn push(&mut self, pred: impl IntoPredicate) {
        self.predicates.push(pred.into_predicate());
    }

    /// The disjuncts
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

impl fmt::Display for DisjunctivePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_joined(f, &self.predicates, "OR")
    }
}

impl ValuePredicate for DisjunctivePredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let mut builder = SequencedPredicateResultBuilder::new(Arc::new(self.clone()));
        let mut valid = false;
        for pred in &self.predicates {
            let result = pred.evaluate(context, value);
            let passed = result.valid();
            builder.append_result(result);
            if passed {
                valid = true;
                break;
            }
        }
        builder.build(valid).into()
    }
}

/// NOT: inverts the validity of a single predicate
#[derive(Debug, Clone)]
pub struct NegationPredicate {
    pred: Predicate,
}

impl NegationPredicate {
    /// Negation of `pred`
    pub fn new(pred: impl IntoPredicate) -> Self {
        Self {
            pred: pred.into_predicate(),
        }
    }

    /// The negated predicate
    pub fn predicate(&self) -> &Predicate {
        &self.pred
    }
}

impl PartialEq for NegationPredicate {
    fn eq(&self, other: &Self) -> bool {
        *self.pred == *other.pred
    }
}

impl fmt::Display for NegationPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NOT ({})", self.pred)
    }
}

impl ValuePredicate for NegationPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let result = self.pred.evaluate(context, value);
        let valid = !result.valid();
        let mut builder = SequencedPredicateResultBuilder::new(Arc::new(self.clone()));
        builder.append_result(result);
        builder.build(valid).into()
    }
}

/// IF/THEN with an optional ELSE
///
/// With an ELSE, the condition is evaluated and then exactly one branch; the
/// branch decides validity. Without one, the predicate is `NOT cond OR then`
/// and evaluates as that disjunction.
#[derive(Debug, Clone)]
pub struct ConditionalPredicate {
    if_pred: Predicate,
    then_pred: Predicate,
    else_pred: Option<Predicate>,
    demorgan: Option<DisjunctivePredicate>,
}

impl ConditionalPredicate {
    /// IF `if_pred` THEN `then_pred`
    pub fn new(if_pred: impl IntoPredicate, then_pred: impl IntoPredicate) -> Self {
        let if_pred = if_pred.into_predicate();
        let then_pred = then_pred.into_predicate();
        let demorgan = DisjunctivePredicate::new(vec![
            NegationPredicate::new(if_pred.clone()).into_predicate(),
            then_pred.clone(),
        ]);
        Self {
            if_pred,
            then_pred,
            else_pred: None,
            demorgan: Some(demorgan),
        }
    }

    /// IF `if_pred` THEN `then_pred` ELSE `else_pred`
    pub fn with_else(
        if_pred: impl IntoPredicate,
        then_pred: impl IntoPredicate,
        else_pred: impl IntoPredicate,
    ) -> Self {
        Self {
            if_pred: if_pred.into_predicate(),
            then_pred: then_pred.into_predicate(),
            else_pred: Some(else_pred.into_predicate()),
            demorgan: None,
        }
    }

    /// The condition
    pub fn if_predicate(&self) -> &Predicate {
        &self.if_pred
    }

    /// The consequent
    pub fn then_predicate(&self) -> &Predicate {
        &self.then_pred
    }

    /// The alternative, absent for the disjunctive form
    pub fn else_predicate(&self) -> Option<&Predicate> {
        self.else_pred.as_ref()
    }
}

impl PartialEq for ConditionalPredicate {
    fn eq(&self, other: &Self) -> bool {
        *self.if_pred == *other.if_pred
            && *self.then_pred == *other.then_pred
            && self.else_pred == other.else_pred
    }
}

impl fmt::Display for ConditionalPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF ({}) THEN ({})", self.if_pred, self.then_pred)?;
        if let Some(else_pred) = &self.else_pred {
            write!(f, " ELSE ({else_pred})")?;
        }
        Ok(())
    }
}

impl ValuePredicate for ConditionalPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let else_pred = match (&self.demorgan, &self.else_pred) {
            (Some(demorgan), _) => return demorgan.evaluate(context, value),
            (None, Some(else_pred)) => else_pred,
            (None, None) => &self.then_pred,
        };

        let condition = self.if_pred.evaluate(context, value);
        let branch = if condition.valid() {
            self.then_pred.evaluate(context, value)
        } else {
            else_pred.evaluate(context, value)
        };
        let valid = branch.valid();

        let mut builder = SequencedPredicateResultBuilder::new(Arc::new(self.clone()));
        builder.append_result(condition).append_result(branch);
        builder.build(valid).into()
    }
}
