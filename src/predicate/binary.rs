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

//! Comparisons of a value against a fixed operand of a known shape

use super::ValuePredicate;
use crate::error::{PredicateError, Result};
use crate::evaluator::{ExecutionContext, Operand};
use crate::model::{JsonType, PathValue, compare_numbers, lists_equivalent, values_equal};
use crate::result::{PathResult, PredicateResult};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// The comparison bound into a [`SimpleBinaryPredicate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Map equality
    DictEq,
    /// Map inequality
    DictNe,
    /// Ordered list equality
    ListEq,
    /// Ordered list inequality
    ListNe,
    /// List equality ignoring order
    ListSimilar,
    /// Numeric `<=`
    NumLe,
    /// Numeric `>=`
    NumGe,
    /// Numeric equality
    NumEq,
    /// Numeric inequality
    NumNe,
    /// String equality
    StrEq,
    /// String inequality
    StrNe,
    /// The operand is a substring of the value
    StrSubstr,
    /// The operand regex matches somewhere in the value
    StrRegex,
}

impl ComparisonOp {
    /// Reporting name of the comparison
    pub fn name(self) -> &'static str {
        match self {
            Self::DictEq | Self::ListEq | Self::NumEq | Self::StrEq => "==",
            Self::DictNe | Self::ListNe | Self::NumNe | Self::StrNe => "!=",
            Self::ListSimilar => "~=",
            Self::NumLe => "<=",
            Self::NumGe => ">=",
            Self::StrSubstr => "has-substring",
            Self::StrRegex => "RegEx",
        }
    }

    /// Shape required of both the value and the operand
    pub fn operand_type(self) -> JsonType {
        match self {
            Self::DictEq | Self::DictNe => JsonType::Map,
            Self::ListEq | Self::ListNe | Self::ListSimilar => JsonType::List,
            Self::NumLe | Self::NumGe | Self::NumEq | Self::NumNe => JsonType::Number,
            Self::StrEq | Self::StrNe | Self::StrSubstr | Self::StrRegex => JsonType::String,
        }
    }
}

/// Render a binary predicate as `name(operand)->type`
pub(crate) fn fmt_binary(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    operand: &Operand,
    operand_type: Option<JsonType>,
) -> fmt::Result {
    match operand_type {
        Some(operand_type) => write!(f, "{name}({operand})->{operand_type}"),
        None => write!(f, "{name}({operand})->Any"),
    }
}

/// A predicate comparing values against an operand with a [`ComparisonOp`]
#[derive(Debug, Clone)]
pub struct SimpleBinaryPredicate {
    op: ComparisonOp,
    operand: Operand,
    regex: Option<Regex>,
}

impl SimpleBinaryPredicate {
    /// Bind `op` to `operand`
    ///
    /// A literal operand must have the shape the comparison requires; a
    /// deferred operand is checked when the predicate is applied.
    pub fn new(op: ComparisonOp, operand: impl Into<Operand>) -> Result<Self> {
        let operand = operand.into();
        let mut regex = None;
        if let Some(literal) = operand.as_literal() {
            let actual = JsonType::of(literal);
            if actual != op.operand_type() {
                return Err(PredicateError::operand_type(
                    op.name(),
                    op.operand_type(),
                    actual,
                ));
            }
            if op == ComparisonOp::StrRegex {
                regex = Some(compile(literal.as_str().unwrap_or_default())?);
            }
        }
        Ok(Self { op, operand, regex })
    }

    /// Bind `op` to a literal already known to have the right shape
    pub(crate) fn literal(op: ComparisonOp, operand: Value) -> Self {
        let regex = match op {
            ComparisonOp::StrRegex => operand.as_str().and_then(|p| compile(p).ok()),
            _ => None,
        };
        Self {
            op,
            operand: Operand::Literal(operand),
            regex,
        }
    }

    /// The bound comparison
    pub fn op(&self) -> ComparisonOp {
        self.op
    }

    /// The bound operand
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    fn compare(&self, value: &Value, operand: &Value) -> Result<bool> {
        let valid = match self.op {
            ComparisonOp::DictEq | ComparisonOp::ListEq | ComparisonOp::NumEq => {
                values_equal(value, operand)
            }
            ComparisonOp::DictNe | ComparisonOp::ListNe | ComparisonOp::NumNe => {
                !values_equal(value, operand)
            }
            ComparisonOp::StrEq => value.as_str() == operand.as_str(),
            ComparisonOp::StrNe => value.as_str() != operand.as_str(),
            ComparisonOp::ListSimilar => match (value.as_array(), operand.as_array()) {
                (Some(value), Some(operand)) => lists_equivalent(value, operand),
                _ => false,
            },
            ComparisonOp::NumLe => ordering(value, operand)
                .is_some_and(|ordering| ordering != Ordering::Greater),
            ComparisonOp::NumGe => {
                ordering(value, operand).is_some_and(|ordering| ordering != Ordering::Less)
            }
            ComparisonOp::StrSubstr => match (value.as_str(), operand.as_str()) {
                (Some(value), Some(operand)) => value.contains(operand),
                _ => false,
            },
            ComparisonOp::StrRegex => {
                let text = value.as_str().unwrap_or_default();
                match &self.regex {
                    Some(regex) => regex.is_match(text),
                    None => compile(operand.as_str().unwrap_or_default())?.is_match(text),
                }
            }
        };
        Ok(valid)
    }
}

fn ordering(value: &Value, operand: &Value) -> Option<Ordering> {
    match (value, operand) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        _ => None,
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| PredicateError::InvalidRegex {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

impl PartialEq for SimpleBinaryPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op && self.operand == other.operand
    }
}

impl fmt::Display for SimpleBinaryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_binary(f, self.op.name(), &self.operand, Some(self.op.operand_type()))
    }
}

impl ValuePredicate for SimpleBinaryPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let operand = context.eval(&self.operand);
        let expected = self.op.operand_type();
        if !expected.matches(&operand) {
            return PathResult::value_type_mismatch(expected, JsonType::of(&operand), value)
                .into();
        }
        if !expected.matches(value) {
            return PathResult::value_type_mismatch(expected, JsonType::of(value), value).into();
        }

        let pred = Some(Arc::new(self.clone()) as super::Predicate);
        let path_value = PathValue::root(value.clone());
        match self.compare(value, &operand) {
            Ok(valid) => PathResult::value(value, "", path_value, valid, pred).into(),
            Err(err) => PathResult::value(value, "", path_value, false, pred)
                .with_cause(err.into())
                .into(),
        }
    }
}

/// Apply `op` with an already-resolved operand
///
/// An operand of the wrong shape is reported as a type mismatch on `value`.
pub(crate) fn apply_literal(
    op: ComparisonOp,
    operand: &Value,
    context: &ExecutionContext,
    value: &Value,
) -> PredicateResult {
    let expected = op.operand_type();
    if !expected.matches(operand) {
        return PathResult::value_type_mismatch(expected, JsonType::of(operand), value).into();
    }
    SimpleBinaryPredicate::literal(op, operand.clone()).evaluate(context, value)
}

macro_rules! binary_factories {
    ($($(#[$doc:meta])* $name:ident => $op:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(operand: impl Into<Operand>) -> Result<SimpleBinaryPredicate> {
                SimpleBinaryPredicate::new(ComparisonOp::$op, operand)
            }
        )*
    };
}

binary_factories! {
    /// Map equality
    dict_eq => DictEq;
    /// Map inequality
    dict_ne => DictNe;
    /// Ordered list equality
    list_eq => ListEq;
    /// Ordered list inequality
    list_ne => ListNe;
    /// List equality ignoring order
    list_similar => ListSimilar;
    /// Numeric `<=`
    num_le => NumLe;
    /// Numeric `>=`
    num_ge => NumGe;
    /// Numeric equality
    num_eq => NumEq;
    /// Numeric inequality
    num_ne => NumNe;
    /// String equality
    str_eq => StrEq;
    /// String inequality
    str_ne => StrNe;
    /// Substring containment
    str_substr => StrSubstr;
    /// Regular expression search
    str_regex => StrRegex;
}
