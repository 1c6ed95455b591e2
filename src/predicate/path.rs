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

//! Locating values by path and filtering them with an inner predicate
//!
//! A path is a `/`-delimited list of field names. A field name may be
//! followed by `[n]` to pick one element of a list value; otherwise every
//! element of a list met along the way is followed, so one path can reach
//! many values. Paths taken are always recorded with explicit indices.
//!
//! For `{"a": [{"x": "X", "y": [1, {"z": "Z"}]}, "Plain"]}`:
//!
//! | path       | values found                                  |
//! |------------|-----------------------------------------------|
//! | `a`        | `a[0]` = `{"x": ..}`, `a[1]` = `"Plain"`      |
//! | `a[1]`     | `a[1]` = `"Plain"`                            |
//! | `a/x`      | `a[0]/x` = `"X"`                              |
//! | `a/y`      | `a[0]/y[0]` = `1`, `a[0]/y[1]` = `{"z": "Z"}` |
//! | `a/y@`     | `a[0]/y` = `[1, {"z": "Z"}]`                  |
//! | `a/y/z`    | `a[0]/y[1]/z` = `"Z"`                         |
//!
//! A list found at the end of the path is enumerated into its elements
//! unless the path ends in `@`.

use super::structural::{ContainsPredicate, EquivalentPredicate};
use super::transform::{Transform, ValueTransform};
use super::{IntoPredicate, Predicate, ValuePredicate};
use crate::evaluator::{ExecutionContext, Operand};
use crate::model::{
    ArcJsonValue, DONT_ENUMERATE_TERMINAL, JsonType, PATH_SEP, PathValue, build_path,
};
use crate::result::{PathPredicateResult, PathPredicateResultBuilder, PathResult, PredicateResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

static INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/?\[(\d+)\]").expect("index pattern is valid"));

static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/?([^/@\[]+)").expect("segment pattern is valid"));

/// A partially resolved branch: how much of the path is consumed and where it led
#[derive(Debug)]
struct Cursor<'a> {
    offset: usize,
    path: String,
    value: &'a Value,
}

impl<'a> Cursor<'a> {
    fn root(value: &'a Value) -> Self {
        Self {
            offset: 0,
            path: String::new(),
            value,
        }
    }

    fn path_value(&self) -> PathValue {
        PathValue::new(self.path.clone(), self.value.clone())
    }

    fn elements(self) -> impl Iterator<Item = Cursor<'a>> {
        let offset = self.offset;
        let base = self.path;
        self.value
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .map(move |(index, value)| Cursor {
                offset,
                path: format!("{base}[{index}]"),
                value,
            })
    }
}

enum Step<'a> {
    Continue(Vec<Cursor<'a>>),
    Pruned(PathResult),
}

/// Index specifier starting exactly at `offset`, with the offset past it
fn index_at(path: &str, offset: usize) -> Option<(usize, usize)> {
    let captures = INDEX_RE.captures_at(path, offset)?;
    let whole = captures.get(0)?;
    if whole.start() != offset {
        return None;
    }
    let index = captures
        .get(1)
        .and_then(|digits| digits.as_str().parse().ok())
        .unwrap_or(usize::MAX);
    Some((index, whole.end()))
}

fn step_map<'a>(path: &str, cursor: Cursor<'a>, map: &'a Map<String, Value>) -> Step<'a> {
    if index_at(path, cursor.offset).is_some() {
        return Step::Pruned(PathResult::type_mismatch(
            JsonType::List,
            JsonType::Map,
            cursor.value,
            path,
            cursor.path_value(),
        ));
    }

    let (segment, next_offset) = match SEGMENT_RE.captures_at(path, cursor.offset) {
        Some(captures) => match (captures.get(0), captures.get(1)) {
            (Some(whole), Some(name)) => (name.as_str(), whole.end()),
            _ => (&path[cursor.offset..], path.len()),
        },
        None => {
            let rest = &path[cursor.offset..];
            if rest.len() == 1 && rest.starts_with(PATH_SEP) {
                return Step::Continue(vec![Cursor {
                    offset: path.len(),
                    ..cursor
                }]);
            }
            (rest, path.len())
        }
    };

    log::trace!("Resolving segment '{segment}' at '{}'", cursor.path);
    // A null field is indistinguishable from an absent one
    match map.get(segment).filter(|value| !value.is_null()) {
        Some(value) => Step::Continue(vec![Cursor {
            offset: next_offset,
            path: build_path([cursor.path.as_str(), segment]),
            value,
        }]),
        None => Step::Pruned(PathResult::missing_path(
            cursor.value,
            segment,
            cursor.path_value(),
        )),
    }
}

fn step_list<'a>(path: &str, cursor: Cursor<'a>, list: &'a [Value]) -> Step<'a> {
    let Some((index, next_offset)) = index_at(path, cursor.offset) else {
        return Step::Continue(cursor.elements().collect());
    };

    match list.get(index) {
        Some(value) => Step::Continue(vec![Cursor {
            offset: next_offset,
            path: format!("{}[{index}]", cursor.path),
            value,
        }]),
        None => Step::Pruned(PathResult::index_bounds(
            index,
            cursor.value,
            &path[cursor.offset..],
            cursor.path_value(),
        )),
    }
}

fn step_scalar<'a>(path: &str, cursor: Cursor<'a>) -> Step<'a> {
    let rest = &path[cursor.offset..];
    let rest = rest.strip_prefix(PATH_SEP).unwrap_or(rest);
    Step::Pruned(PathResult::missing_path(
        cursor.value,
        rest,
        cursor.path_value(),
    ))
}

fn step<'a>(path: &str, cursor: Cursor<'a>) -> Step<'a> {
    let value = cursor.value;
    match value {
        Value::Object(map) => step_map(path, cursor, map),
        Value::Array(list) => step_list(path, cursor, list),
        _ => step_scalar(path, cursor),
    }
}

/// Strip a trailing terminal marker, returning whether to enumerate terminal lists
fn strip_terminal(path: &str, enumerate_default: bool) -> (&str, bool) {
    if let Some(stripped) = path.strip_suffix(DONT_ENUMERATE_TERMINAL) {
        (stripped, false)
    } else if let Some(stripped) = path.strip_suffix(PATH_SEP) {
        (stripped, true)
    } else {
        (path, enumerate_default)
    }
}

/// Locates the values at a path and filters them with an optional predicate
///
/// Without an inner predicate every value reached is kept, and the
/// transform, if there is one, is applied to the value its result reports. With an inner predicate each value is kept
/// only if the predicate accepts it, and the predicate's result is re-rooted
/// at the document the path was resolved against.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPredicate {
    path: Operand,
    pred: Option<Predicate>,
    transform: Option<Transform>,
    enumerate_terminals: bool,
}

impl PathPredicate {
    /// Locate the values at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self::deferred(Operand::Literal(Value::String(path.into())))
    }

    /// Locate the values at a path resolved from the context at call time
    pub fn deferred(path: Operand) -> Self {
        Self {
            path,
            pred: None,
            transform: None,
            enumerate_terminals: true,
        }
    }

    /// Keep only values accepted by `pred`
    pub fn with_predicate(mut self, pred: impl IntoPredicate) -> Self {
        self.pred = Some(pred.into_predicate());
        self
    }

    /// Apply `transform` to each located value
    ///
    /// Only used without an inner predicate. The transformed value is carried
    /// by the candidate's result; `path_values` keep the located value.
    pub fn with_transform(mut self, transform: impl ValueTransform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Whether a terminal list is enumerated when the path has no trailing marker
    pub fn with_enumerate_terminals(mut self, enumerate: bool) -> Self {
        self.enumerate_terminals = enumerate;
        self
    }

    /// The path operand
    pub fn path(&self) -> &Operand {
        &self.path
    }

    /// The inner filtering predicate
    pub fn pred(&self) -> Option<&Predicate> {
        self.pred.as_ref()
    }

    /// The transform applied when there is no inner predicate
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Whether terminal lists are enumerated by default
    pub fn enumerate_terminals(&self) -> bool {
        self.enumerate_terminals
    }

    /// Resolve against `value`, copying it into the result
    pub fn collect(&self, context: &ExecutionContext, value: &Value) -> PathPredicateResult {
        self.collect_shared(context, ArcJsonValue::from(value))
    }

    /// Resolve against a shared document
    pub fn collect_shared(
        &self,
        context: &ExecutionContext,
        source: ArcJsonValue,
    ) -> PathPredicateResult {
        let mut builder = PathPredicateResultBuilder::new(source.clone(), Arc::new(self.clone()));

        let resolved = context.eval(&self.path);
        let Some(full_path) = resolved.as_str() else {
            log::debug!("Path operand {resolved} is not a string");
            builder.add_path_failure(PathResult::type_mismatch(
                JsonType::String,
                JsonType::of(&resolved),
                source.clone(),
                "",
                PathValue::root(source.as_json().clone()),
            ));
            return builder.build();
        };
        let (path, enumerate_terminal) = strip_terminal(full_path, self.enumerate_terminals);

        let mut queue = VecDeque::from([Cursor::root(source.as_json())]);
        let mut finals = Vec::new();
        while let Some(cursor) = queue.pop_front() {
            if cursor.offset >= path.len() {
                finals.push(cursor);
                continue;
            }
            match step(path, cursor) {
                Step::Continue(next) => queue.extend(next),
                Step::Pruned(failure) => {
                    log::debug!("Pruned path: {failure}");
                    builder.add_path_failure(failure);
                }
            }
        }

        for cursor in finals {
            if enumerate_terminal && cursor.value.is_array() {
                for element in cursor.elements() {
                    self.add_candidate(context, &mut builder, full_path, element);
                }
            } else {
                self.add_candidate(context, &mut builder, full_path, cursor);
            }
        }
        builder.build()
    }

    fn add_candidate(
        &self,
        context: &ExecutionContext,
        builder: &mut PathPredicateResultBuilder,
        target_path: &str,
        cursor: Cursor<'_>,
    ) {
        let path_value = cursor.path_value();
        let result = match &self.pred {
            Some(pred) => {
                let result = pred.evaluate(context, cursor.value);
                if result.is_cloneable_with_source() {
                    result.clone_with_source(builder.source(), target_path, &path_value.path)
                } else {
                    result
                }
            }
            None => self.locate(context, builder.source(), &path_value).into(),
        };
        builder.add_result_candidate(path_value, result);
    }

    fn locate(
        &self,
        context: &ExecutionContext,
        source: &ArcJsonValue,
        path_value: &PathValue,
    ) -> PathResult {
        let Some(transform) = &self.transform else {
            return PathResult::value(
                source.clone(),
                path_value.path.clone(),
                path_value.clone(),
                true,
                None,
            );
        };
        match transform.apply(context, &path_value.value) {
            Ok(value) => PathResult::value(
                source.clone(),
                path_value.path.clone(),
                PathValue::new(path_value.path.clone(), value),
                true,
                None,
            ),
            Err(err) => {
                log::debug!("Transform failed at '{}': {err}", path_value.path);
                PathResult::value(
                    source.clone(),
                    path_value.path.clone(),
                    path_value.clone(),
                    false,
                    None,
                )
                .with_cause(err.into())
            }
        }
    }
}

impl fmt::Display for PathPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(transform) = &self.transform {
            write!(f, " {transform}")?;
        }
        if let Some(pred) = &self.pred {
            write!(f, " {pred}")?;
        }
        Ok(())
    }
}

impl ValuePredicate for PathPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        self.collect(context, value).into()
    }
}

/// Values at `path` equivalent to `operand`
pub fn path_eq(path: impl Into<String>, operand: impl Into<Operand>) -> PathPredicate {
    PathPredicate::new(path).with_predicate(EquivalentPredicate::new(operand))
}

/// Values at `path` containing `operand`
pub fn path_contains(path: impl Into<String>, operand: impl Into<Operand>) -> PathPredicate {
    PathPredicate::new(path).with_predicate(ContainsPredicate::new(operand))
}

/// Elements at `path` containing `operand`
///
/// Terminal lists are enumerated, so this is [`path_contains`] applied to
/// each element.
pub fn path_elements_contain(
    path: impl Into<String>,
    operand: impl Into<Operand>,
) -> PathPredicate {
    path_contains(path, operand)
}
