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

//! Path/value pairs produced while walking a JSON document

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Separator between field names in a path expression
pub const PATH_SEP: char = '/';

/// Trailing marker that keeps a terminal list from being enumerated
pub const DONT_ENUMERATE_TERMINAL: char = '@';

/// Join non-empty path parts with [`PATH_SEP`]
pub fn build_path<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut path = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        if !path.is_empty() {
            path.push(PATH_SEP);
        }
        path.push_str(part);
    }
    path
}

/// A value together with the path taken to reach it
///
/// List traversal is rendered explicitly in the path, so `a[1]/x` names the
/// `x` field of the second element of `a`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    /// Slash-delimited trace from the root to `value`
    pub path: String,
    /// The value found at `path`
    pub value: Value,
}

impl PathValue {
    /// Create a new path value
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    /// The path value of a document root
    pub fn root(value: Value) -> Self {
        Self::new("", value)
    }

    /// Path value for a child field of this value
    pub fn child(&self, field: &str, value: Value) -> Self {
        Self::new(build_path([self.path.as_str(), field]), value)
    }

    /// Path value for an element of this (list) value
    pub fn element(&self, index: usize, value: Value) -> Self {
        Self::new(format!("{}[{index}]", self.path), value)
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"={}", self.path, self.value)
    }
}
