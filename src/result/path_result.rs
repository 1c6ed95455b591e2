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

//! Results whose subject is a value at a path within a source document

use super::{Cause, CloneableWithSource};
use crate::model::{ArcJsonValue, JsonType, PathValue, build_path};
use crate::predicate::Predicate;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// What a [`PathResult`] reports about its path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathResultKind {
    /// A value was found and optionally judged by a filtering predicate
    Value {
        /// The predicate applied as the filter, if any
        pred: Option<Predicate>,
    },
    /// A path segment did not exist
    MissingPath,
    /// A value or operand did not have the required shape
    TypeMismatch {
        /// The shape that was wanted
        expected: JsonType,
        /// The shape that was found
        actual: JsonType,
    },
    /// An explicit list index was past the end of the list
    IndexBounds {
        /// The requested index
        index: usize,
        /// Length of the list that was indexed
        len: usize,
    },
    /// A field or element was present that nothing asked for
    UnexpectedPath,
}

impl PathResultKind {
    /// Reporting name of the result kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::Value { .. } => "PathValueResult",
            Self::MissingPath => "MissingPathError",
            Self::TypeMismatch { .. } => "TypeMismatchError",
            Self::IndexBounds { .. } => "IndexBoundsError",
            Self::UnexpectedPath => "UnexpectedPathError",
        }
    }
}

/// Outcome of looking for `target_path` within `source`
///
/// `path_value` records how far resolution actually got, so on failure its
/// path may be a strict prefix of `target_path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    kind: PathResultKind,
    valid: bool,
    source: ArcJsonValue,
    target_path: String,
    path_value: PathValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<Cause>,
}

impl PathResult {
    fn new(
        kind: PathResultKind,
        valid: bool,
        source: impl Into<ArcJsonValue>,
        target_path: impl Into<String>,
        path_value: PathValue,
    ) -> Self {
        Self {
            kind,
            valid,
            source: source.into(),
            target_path: target_path.into(),
            path_value,
            comment: None,
            cause: None,
        }
    }

    /// A found value, judged valid or not by `pred`
    pub fn value(
        source: impl Into<ArcJsonValue>,
        target_path: impl Into<String>,
        path_value: PathValue,
        valid: bool,
        pred: Option<Predicate>,
    ) -> Self {
        Self::new(
            PathResultKind::Value { pred },
            valid,
            source,
            target_path,
            path_value,
        )
    }

    /// A path segment that does not exist
    pub fn missing_path(
        source: impl Into<ArcJsonValue>,
        target_path: impl Into<String>,
        path_value: PathValue,
    ) -> Self {
        Self::new(
            PathResultKind::MissingPath,
            false,
            source,
            target_path,
            path_value,
        )
    }

    /// A value of the wrong shape
    pub fn type_mismatch(
        expected: JsonType,
        actual: JsonType,
        source: impl Into<ArcJsonValue>,
        target_path: impl Into<String>,
        path_value: PathValue,
    ) -> Self {
        Self::new(
            PathResultKind::TypeMismatch { expected, actual },
            false,
            source,
            target_path,
            path_value,
        )
    }

    /// Type mismatch on a standalone value, reported at the empty path
    pub fn value_type_mismatch(expected: JsonType, actual: JsonType, value: &Value) -> Self {
        Self::type_mismatch(expected, actual, value, "", PathValue::root(value.clone()))
    }

    /// An index past the end of the list in `path_value`
    pub fn index_bounds(
        index: usize,
        source: impl Into<ArcJsonValue>,
        target_path: impl Into<String>,
        path_value: PathValue,
    ) -> Self {
        let len = path_value.value.as_array().map_or(0, Vec::len);
        Self::new(
            PathResultKind::IndexBounds { index, len },
            false,
            source,
            target_path,
            path_value,
        )
    }

    /// A path that was present but not expected
    pub fn unexpected_path(
        source: impl Into<ArcJsonValue>,
        target_path: impl Into<String>,
        path_value: PathValue,
    ) -> Self {
        Self::new(
            PathResultKind::UnexpectedPath,
            false,
            source,
            target_path,
            path_value,
        )
    }

    /// Attach a reporting comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Attach an indirect cause
    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// What this result reports
    pub fn kind(&self) -> &PathResultKind {
        &self.kind
    }

    /// Whether the result is considered successful
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The document `target_path` is relative to
    pub fn source(&self) -> &ArcJsonValue {
        &self.source
    }

    /// The path that was sought
    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// How far resolution got
    pub fn path_value(&self) -> &PathValue {
        &self.path_value
    }

    /// Reporting comment
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Indirect cause
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// The filtering predicate of a value result
    pub fn pred(&self) -> Option<&Predicate> {
        match &self.kind {
            PathResultKind::Value { pred } => pred.as_ref(),
            _ => None,
        }
    }
}

impl CloneableWithSource for PathResult {
    fn clone_with_source(
        &self,
        source: &ArcJsonValue,
        base_target_path: &str,
        base_value_path: &str,
    ) -> Self {
        let target_path = if self.target_path.is_empty() {
            base_target_path.to_string()
        } else {
            build_path([base_target_path, self.target_path.as_str()])
        };
        let value_path = if self.path_value.path.is_empty() {
            base_value_path.to_string()
        } else {
            build_path([base_value_path, self.path_value.path.as_str()])
        };

        Self {
            source: source.clone(),
            target_path,
            path_value: PathValue::new(value_path, self.path_value.value.clone()),
            ..self.clone()
        }
    }
}

impl fmt::Display for PathResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(comment) = &self.comment {
            return f.write_str(comment);
        }
        match &self.kind {
            PathResultKind::TypeMismatch { expected, actual } => write!(
                f,
                "{actual} is not a {expected} for field=\"{}\" trace={}.",
                self.target_path, self.path_value
            ),
            PathResultKind::IndexBounds { index, len } => write!(
                f,
                "{index} is not in the range 0..{len} for path_value={}.",
                self.path_value
            ),
            PathResultKind::Value { pred } => {
                write!(
                    f,
                    "{} target_path={} path_value={} valid={}",
                    self.kind.name(),
                    self.target_path,
                    self.path_value,
                    self.valid
                )?;
                match pred {
                    Some(pred) => write!(f, " pred={pred}"),
                    None => Ok(()),
                }
            }
            PathResultKind::MissingPath | PathResultKind::UnexpectedPath => write!(
                f,
                "{} target_path={} path_value={}",
                self.kind.name(),
                self.target_path,
                self.path_value
            ),
        }
    }
}
