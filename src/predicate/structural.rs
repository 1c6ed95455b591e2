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

//! Structural matching: subsets, membership, containment and equivalence
//!
//! These predicates accept values of several shapes and pick the comparison
//! by looking at the value:
//!
//! | value  | [`ContainsPredicate`]       | [`EquivalentPredicate`] |
//! |--------|-----------------------------|-------------------------|
//! | string | substring                   | `==`                    |
//! | map    | subset                      | `==`                    |
//! | list   | subset, or element contains | order-free `==`         |
//! | number | `==`                        | `==`                    |
//! | other  | `==`                        | `==`                    |

use super::binary::{ComparisonOp, apply_literal, fmt_binary};
use super::{Predicate, ValuePredicate};
use crate::error::{PredicateError, Result};
use crate::evaluator::{ExecutionContext, Operand};
use crate::model::{ArcJsonValue, JsonType, PathValue, build_path, list_contains, values_equal};
use crate::result::{PathResult, PredicateResult};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

fn check_literal(name: &str, operand: &Operand, expected: JsonType) -> Result<()> {
    match operand.as_literal() {
        Some(literal) if !expected.matches(literal) => Err(PredicateError::operand_type(
            name,
            expected,
            JsonType::of(literal),
        )),
        _ => Ok(()),
    }
}

fn value_result(value: &Value, valid: bool, pred: Predicate) -> PredicateResult {
    PathResult::value(value, "", PathValue::root(value.clone()), valid, Some(pred)).into()
}

/// Every field of the operand map appears in the value with a matching value
///
/// Nested maps are compared recursively, nested lists with
/// [`ListSubsetPredicate`] or [`ContainsPredicate`], and everything else by
/// exact equality.
#[derive(Debug, Clone, PartialEq)]
pub struct DictSubsetPredicate {
    operand: Operand,
}

impl DictSubsetPredicate {
    /// Create a subset predicate; a literal operand must be a map
    pub fn new(operand: impl Into<Operand>) -> Result<Self> {
        let operand = operand.into();
        check_literal("has-subset", &operand, JsonType::Map)?;
        Ok(Self { operand })
    }

    pub(crate) fn literal(operand: Value) -> Self {
        Self {
            operand: Operand::Literal(operand),
        }
    }

    /// The expected subset
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    fn is_subset(
        &self,
        context: &ExecutionContext,
        source: &ArcJsonValue,
        path: &str,
        a: &Map<String, Value>,
        b: &Map<String, Value>,
    ) -> PredicateResult {
        for (name, a_value) in a {
            let namepath = build_path([path, name.as_str()]);
            let Some(b_value) = b.get(name) else {
                return PathResult::missing_path(
                    source.clone(),
                    namepath,
                    PathValue::new(path, Value::Object(b.clone())),
                )
                .into();
            };

            match (a_value, b_value) {
                (Value::Object(a_map), Value::Object(b_map)) => {
                    let result = self.is_subset(context, source, &namepath, a_map, b_map);
                    if !result.valid() {
                        return result;
                    }
                }
                (_, Value::Array(_)) => {
                    let result = if a_value.is_array() {
                        ListSubsetPredicate::literal(a_value.clone(), false)
                            .evaluate(context, b_value)
                    } else {
                        ContainsPredicate::literal(a_value.clone()).evaluate(context, b_value)
                    };
                    if !result.valid() {
                        return result.clone_with_source(source, &namepath, &namepath);
                    }
                }
                _ if values_equal(a_value, b_value) => {}
                _ => {
                    let confirm_type = match b_value {
                        Value::String(_) => Some(JsonType::String),
                        Value::Number(_) => Some(JsonType::Number),
                        _ => None,
                    };
                    if let Some(expected) = confirm_type {
                        if !expected.matches(a_value) {
                            return PathResult::type_mismatch(
                                expected,
                                JsonType::of(a_value),
                                source.clone(),
                                namepath,
                                PathValue::new(path, Value::Object(b.clone())),
                            )
                            .into();
                        }
                    }
                    let pred: Predicate = match b_value {
                        Value::String(_) => Arc::new(super::SimpleBinaryPredicate::literal(
                            ComparisonOp::StrEq,
                            a_value.clone(),
                        )),
                        Value::Number(_) => Arc::new(super::SimpleBinaryPredicate::literal(
                            ComparisonOp::NumEq,
                            a_value.clone(),
                        )),
                        _ => Arc::new(EquivalentPredicate::new(a_value.clone())),
                    };
                    return PathResult::value(
                        source.clone(),
                        namepath.clone(),
                        PathValue::new(namepath, b_value.clone()),
                        false,
                        Some(pred),
                    )
                    .into();
                }
            }
        }

        PathResult::value(
            source.clone(),
            path,
            PathValue::new(path, Value::Object(b.clone())),
            true,
            Some(Arc::new(self.clone())),
        )
        .into()
    }
}

impl fmt::Display for DictSubsetPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, "has-subset", &self.operand, Some(JsonType::Map))
    }
}

impl ValuePredicate for DictSubsetPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let Value::Object(b) = value else {
            return PathResult::value_type_mismatch(JsonType::Map, JsonType::of(value), value)
                .into();
        };
        let operand = context.eval(&self.operand);
        let Value::Object(a) = operand.as_ref() else {
            return PathResult::value_type_mismatch(JsonType::Map, JsonType::of(&operand), value)
                .into();
        };
        let source = ArcJsonValue::from(value);
        self.is_subset(context, &source, "", a, b)
    }
}

/// Whether `elem` is in `list`
///
/// Scalars, and everything when `strict`, need an equal element. Otherwise a
/// map only needs to be a subset of some element and a list a subset of some
/// element.
fn verify_elem(context: &ExecutionContext, strict: bool, elem: &Value, list: &[Value]) -> bool {
    if strict || JsonType::of(elem).is_scalar() {
        return list_contains(list, elem);
    }
    match elem {
        Value::Object(_) => {
            let pred = DictSubsetPredicate::literal(elem.clone());
            list.iter()
                .any(|item| pred.evaluate(context, item).valid())
        }
        Value::Array(_) => {
            let pred = ListSubsetPredicate::literal(elem.clone(), false);
            list.iter()
                .any(|item| pred.evaluate(context, item).valid())
        }
        _ => list_contains(list, elem),
    }
}

/// Every element of the operand list is a member of the value list
#[derive(Debug, Clone, PartialEq)]
pub struct ListSubsetPredicate {
    operand: Operand,
    strict: bool,
}

impl ListSubsetPredicate {
    /// Create a subset predicate; a literal operand must be a list
    pub fn new(operand: impl Into<Operand>) -> Result<Self> {
        let operand = operand.into();
        check_literal("has-subset", &operand, JsonType::List)?;
        Ok(Self {
            operand,
            strict: false,
        })
    }

    pub(crate) fn literal(operand: Value, strict: bool) -> Self {
        Self {
            operand: Operand::Literal(operand),
            strict,
        }
    }

    /// Require exact element membership instead of allowing nested subsets
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether membership is exact
    pub fn strict(&self) -> bool {
        self.strict
    }
}

impl fmt::Display for ListSubsetPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, "has-subset", &self.operand, Some(JsonType::List))
    }
}

impl ValuePredicate for ListSubsetPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let Value::Array(list) = value else {
            return PathResult::value_type_mismatch(JsonType::List, JsonType::of(value), value)
                .into();
        };
        let operand = context.eval(&self.operand);
        let Value::Array(elems) = operand.as_ref() else {
            return PathResult::value_type_mismatch(JsonType::List, JsonType::of(&operand), value)
                .into();
        };

        let valid = elems
            .iter()
            .all(|elem| verify_elem(context, self.strict, elem, list));
        value_result(value, valid, Arc::new(self.clone()))
    }
}

/// The operand is a member of the value list
#[derive(Debug, Clone, PartialEq)]
pub struct ListMembershipPredicate {
    operand: Operand,
    strict: bool,
}

impl ListMembershipPredicate {
    /// Create a membership predicate for any operand
    pub fn new(operand: impl Into<Operand>) -> Self {
        Self {
            operand: operand.into(),
            strict: false,
        }
    }

    /// Require exact membership instead of allowing a subset of a member
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether membership is exact
    pub fn strict(&self) -> bool {
        self.strict
    }
}

impl fmt::Display for ListMembershipPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, "has-elem", &self.operand, None)
    }
}

impl ValuePredicate for ListMembershipPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let Value::Array(list) = value else {
            return PathResult::value_type_mismatch(JsonType::List, JsonType::of(value), value)
                .into();
        };
        let operand = context.eval(&self.operand);
        let valid = verify_elem(context, self.strict, &operand, list);
        value_result(value, valid, Arc::new(self.clone()))
    }
}

/// The value "contains" the operand, in the sense appropriate to its shape
#[derive(Debug, Clone, PartialEq)]
pub struct ContainsPredicate {
    operand: Operand,
}

impl ContainsPredicate {
    /// Create a containment predicate for any operand
    pub fn new(operand: impl Into<Operand>) -> Self {
        Self {
            operand: operand.into(),
        }
    }

    pub(crate) fn literal(operand: Value) -> Self {
        Self::new(Operand::Literal(operand))
    }

    /// The expected content
    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}

impl fmt::Display for ContainsPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, "Contains", &self.operand, None)
    }
}

impl ValuePredicate for ContainsPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let operand = context.eval(&self.operand);
        match value {
            Value::String(_) => apply_literal(ComparisonOp::StrSubstr, &operand, context, value),
            Value::Number(_) => apply_literal(ComparisonOp::NumEq, &operand, context, value),
            Value::Object(_) => {
                if !operand.is_object() {
                    return PathResult::value_type_mismatch(
                        JsonType::Map,
                        JsonType::of(&operand),
                        value,
                    )
                    .into();
                }
                DictSubsetPredicate::literal(operand.into_owned()).evaluate(context, value)
            }
            Value::Array(items) => {
                if operand.is_array() {
                    return ListSubsetPredicate::literal(operand.into_owned(), false)
                        .evaluate(context, value);
                }

                let resolved = Self::literal(operand.into_owned());
                let mut bad_values = Vec::new();
                for item in items {
                    let result = resolved.evaluate(context, item);
                    if result.valid() {
                        return result;
                    }
                    bad_values.push(item.clone());
                }
                PathResult::value(
                    value,
                    "",
                    PathValue::root(Value::Array(bad_values)),
                    false,
                    Some(Arc::new(self.clone())),
                )
                .into()
            }
            Value::Bool(_) | Value::Null => {
                value_result(value, values_equal(value, &operand), Arc::new(self.clone()))
            }
        }
    }
}

/// Polymorphic equality
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalentPredicate {
    operand: Operand,
}

impl EquivalentPredicate {
    /// Create an equality predicate for any operand
    pub fn new(operand: impl Into<Operand>) -> Self {
        Self {
            operand: operand.into(),
        }
    }

    /// The expected value
    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}

impl fmt::Display for EquivalentPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, "Equivalent", &self.operand, None)
    }
}

impl ValuePredicate for EquivalentPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let operand = context.eval(&self.operand);
        let op = match value {
            Value::String(_) => ComparisonOp::StrEq,
            Value::Object(_) => ComparisonOp::DictEq,
            Value::Array(_) => ComparisonOp::ListSimilar,
            Value::Number(_) => ComparisonOp::NumEq,
            Value::Bool(_) | Value::Null => {
                return value_result(
                    value,
                    values_equal(value, &operand),
                    Arc::new(self.clone()),
                );
            }
        };
        apply_literal(op, &operand, context, value)
    }
}

/// Polymorphic inequality
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentPredicate {
    operand: Operand,
}

impl DifferentPredicate {
    /// Create an inequality predicate for any operand
    pub fn new(operand: impl Into<Operand>) -> Self {
        Self {
            operand: operand.into(),
        }
    }

    /// The value to differ from
    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}

impl fmt::Display for DifferentPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, "Different", &self.operand, None)
    }
}

impl ValuePredicate for DifferentPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let operand = context.eval(&self.operand);
        let op = match value {
            Value::String(_) => ComparisonOp::StrNe,
            Value::Object(_) => ComparisonOp::DictNe,
            Value::Array(_) => ComparisonOp::ListNe,
            Value::Number(_) => ComparisonOp::NumNe,
            Value::Bool(_) | Value::Null => {
                return value_result(
                    value,
                    !values_equal(value, &operand),
                    Arc::new(self.clone()),
                );
            }
        };
        apply_literal(op, &operand, context, value)
    }
}

/// Map subset predicate
pub fn dict_subset(operand: impl Into<Operand>) -> Result<DictSubsetPredicate> {
    DictSubsetPredicate::new(operand)
}

/// List subset predicate
pub fn list_subset(operand: impl Into<Operand>, strict: bool) -> Result<ListSubsetPredicate> {
    Ok(ListSubsetPredicate::new(operand)?.with_strict(strict))
}

/// List membership predicate
pub fn list_member(operand: impl Into<Operand>, strict: bool) -> ListMembershipPredicate {
    ListMembershipPredicate::new(operand).with_strict(strict)
}

/// Containment predicate
pub fn contains(operand: impl Into<Operand>) -> ContainsPredicate {
    ContainsPredicate::new(operand)
}

/// Polymorphic equality predicate
pub fn equivalent(operand: impl Into<Operand>) -> EquivalentPredicate {
    EquivalentPredicate::new(operand)
}

/// Polymorphic inequality predicate
pub fn different(operand: impl Into<Operand>) -> DifferentPredicate {
    DifferentPredicate::new(operand)
}
