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

//! Data model for path-based predicate evaluation
//!
//! JSON values are plain `serde_json::Value`s. This module adds the shape
//! tag used in type mismatch reports, the path/value pair that flows through
//! path resolution, and a shared handle for source documents.

#![warn(missing_docs)]

pub mod json_arc;
pub mod path_value;
pub mod types;
pub mod value;

pub use json_arc::ArcJsonValue;
pub use path_value::{DONT_ENUMERATE_TERMINAL, PATH_SEP, PathValue, build_path};
pub use types::JsonType;
pub use value::{compare_numbers, compare_values, list_contains, lists_equivalent, values_equal};
