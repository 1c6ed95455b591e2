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

//! Arc-based JSON value wrapper for sharing source documents across results
//!
//! A single evaluation produces many results that all refer back to the same
//! source document. Wrapping the document in an `Arc` lets every result hold
//! it without copying the tree.

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Arc-wrapped JSON value for zero-copy sharing
#[derive(Clone, Debug)]
pub struct ArcJsonValue {
    inner: Arc<JsonValue>,
}

impl ArcJsonValue {
    /// Create a new ArcJsonValue from a JsonValue
    pub fn new(value: JsonValue) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Create an ArcJsonValue from an existing Arc
    pub fn from_arc(arc: Arc<JsonValue>) -> Self {
        Self { inner: arc }
    }

    /// Get a reference to the underlying JsonValue
    pub fn as_json(&self) -> &JsonValue {
        &self.inner
    }

    /// Get an owned JsonValue, cloning only if necessary
    pub fn into_owned(self) -> JsonValue {
        match Arc::try_unwrap(self.inner) {
            Ok(value) => value,
            Err(arc) => (*arc).clone(),
        }
    }

    /// Get the Arc directly
    pub fn as_arc(&self) -> &Arc<JsonValue> {
        &self.inner
    }

    /// Check whether both handles share one allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Deref for ArcJsonValue {
    type Target = JsonValue;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl PartialEq for ArcJsonValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner == other.inner
    }
}

impl PartialEq<JsonValue> for ArcJsonValue {
    fn eq(&self, other: &JsonValue) -> bool {
        *self.inner == *other
    }
}

impl From<JsonValue> for ArcJsonValue {
    fn from(value: JsonValue) -> Self {
        Self::new(value)
    }
}

impl From<&JsonValue> for ArcJsonValue {
    fn from(value: &JsonValue) -> Self {
        Self::new(value.clone())
    }
}

impl From<Arc<JsonValue>> for ArcJsonValue {
    fn from(arc: Arc<JsonValue>) -> Self {
        Self::from_arc(arc)
    }
}

impl Serialize for ArcJsonValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

impl fmt::Display for ArcJsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}
