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

//! Field-by-field and element-by-element matching of compound values

use super::{IntoPredicate, MapPredicate, PathPredicate, Predicate, ValuePredicate};
use crate::evaluator::{ExecutionContext, Operand};
use crate::model::{JsonType, PathValue};
use crate::result::{
    KeyedPredicateResultBuilder, PathResult, PredicateResult, SequencedPredicateResultBuilder,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Matches the fields of a map against per-field predicates
///
/// Each field is located without enumerating a terminal list, so a field
/// predicate sees a list-valued field whole. When strict, fields not named
/// by any predicate are reported as unexpected.
#[derive(Debug, Clone, PartialEq)]
pub struct DictMatchesPredicate {
    fields: IndexMap<String, Predicate>,
    strict: bool,
}

impl DictMatchesPredicate {
    /// Match each named field with its predicate
    pub fn new<K, P>(fields: impl IntoIterator<Item = (K, P)>) -> Self
    where
        K: Into<String>,
        P: IntoPredicate,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(key, pred)| (key.into(), pred.into_predicate()))
                .collect(),
            strict: false,
        }
    }

    /// Reject maps with fields that have no predicate
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Field predicates in declaration order
    pub fn fields(&self) -> &IndexMap<String, Predicate> {
        &self.fields
    }

    /// Whether unnamed fields are rejected
    pub fn strict(&self) -> bool {
        self.strict
    }
}

impl fmt::Display for DictMatchesPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matches({")?;
        for (index, (key, pred)) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key:?}: {pred}")?;
        }
        f.write_str("})")?;
        if self.strict {
            f.write_str(" strict")?;
        }
        Ok(())
    }
}

impl ValuePredicate for DictMatchesPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let Some(map) = value.as_object() else {
            return PathResult::value_type_mismatch(JsonType::Map, JsonType::of(value), value)
                .into();
        };

        let mut builder = KeyedPredicateResultBuilder::new(Arc::new(self.clone()));
        let mut valid = true;
        for (key, pred) in &self.fields {
            let field_result = PathPredicate::new(key.as_str())
                .with_predicate(pred.clone())
                .with_enumerate_terminals(false)
                .collect(context, value);
            valid &= field_result.valid();
            if let Err(err) = builder.add_result(key.as_str(), field_result.into()) {
                log::warn!("Skipping field result: {err}");
                valid = false;
            }
        }

        if self.strict {
            let unexpected: Vec<(String, PredicateResult)> = map
                .iter()
                .filter(|(key, _)| !self.fields.contains_key(key.as_str()))
                .map(|(key, field)| {
                    let failure = PathResult::unexpected_path(
                        value,
                        key.as_str(),
                        PathValue::new(key.as_str(), field.clone()),
                    );
                    (key.clone(), failure.into())
                })
                .collect();
            if !unexpected.is_empty() {
                log::debug!("Strict match found {} unexpected fields", unexpected.len());
                valid = false;
                builder.update_results(unexpected);
            }
        }

        builder.build(valid).into()
    }
}

/// Matches the elements of a list against a set of element predicates
///
/// Every predicate must match at least one element. When unique, a predicate
/// may match at most one element. When strict, every element must be matched
/// by some predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ListMatchesPredicate {
    elements: Vec<Predicate>,
    strict: bool,
    unique: bool,
}

impl ListMatchesPredicate {
    /// Match the list against each of `elements`
    pub fn new(elements: Vec<Predicate>) -> Self {
        Self {
            elements,
            strict: false,
            unique: false,
        }
    }

    /// Reject lists with elements no predicate matches
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reject predicates matching more than one element
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// The element predicates
    pub fn elements(&self) -> &[Predicate] {
        &self.elements
    }

    /// Whether unmatched elements are rejected
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Whether each predicate may match at most one element
    pub fn unique(&self) -> bool {
        self.unique
    }
}

impl fmt::Display for ListMatchesPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matches([")?;
        for (index, pred) in self.elements.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{pred}")?;
        }
        f.write_str("])")?;
        if self.strict {
            f.write_str(" strict")?;
        }
        if self.unique {
            f.write_str(" unique")?;
        }
        Ok(())
    }
}

impl ValuePredicate for ListMatchesPredicate {
    fn evaluate(&self, context: &ExecutionContext, value: &Value) -> PredicateResult {
        let Some(list) = value.as_array() else {
            return PathResult::value_type_mismatch(JsonType::List, JsonType::of(value), value)
                .into();
        };

        let max = if self.unique {
            Operand::from(1u32)
        } else {
            Operand::default()
        };

        let mut builder = SequencedPredicateResultBuilder::new(Arc::new(self.clone()));
        let mut valid = true;
        let mut matched = vec![0usize; list.len()];
        for pred in &self.elements {
            let result = MapPredicate::new(pred.clone())
                .with_max(max.clone())
                .evaluate(context, value);
            valid &= result.valid();
            if let Some(map) = result.as_map() {
                for (count, attempt) in matched.iter_mut().zip(map.results()) {
                    if attempt.valid() {
                        *count += 1;
                    }
                }
            }
            builder.append_result(result);
        }

        if self.strict {
            let unexpected: Vec<PredicateResult> = matched
                .iter()
                .enumerate()
                .filter(|(_, count)| **count == 0)
                .map(|(index, _)| {
                    let path = format!("[{index}]");
                    PathResult::unexpected_path(
                        value,
                        path.as_str(),
                        PathValue::new(path.as_str(), list[index].clone()),
                    )
                    .into()
                })
                .collect();
            if !unexpected.is_empty() {
                log::debug!("Strict match left {} elements unmatched", unexpected.len());
                valid = false;
                builder.extend_results(unexpected);
            }
        }

        builder.build(valid).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::binary::{num_ge, str_eq};
    use crate::predicate::structural::equivalent;
    use crate::result::PathResultKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn eval(pred: &dyn ValuePredicate, value: Value) -> PredicateResult {
        pred.evaluate(&ExecutionContext::new(), &value)
    }

    fn dict_pred() -> DictMatchesPredicate {
        DictMatchesPredicate::new([
            ("name", str_eq("db").unwrap().into_predicate()),
            ("size", num_ge(10).unwrap().into_predicate()),
        ])
    }

    #[test]
    fn test_dict_matches_fields() {
        let result = eval(&dict_pred(), json!({"name": "db", "size": 20, "zone": "a"}));
        assert!(result.valid());

        let result = eval(&dict_pred(), json!({"name": "db", "size": 2}));
        let keyed = result.as_keyed().unwrap();
        assert!(!keyed.valid());
        assert!(keyed.get("name").unwrap().valid());
        assert!(!keyed.get("size").unwrap().valid());
    }

    #[test]
    fn test_dict_matches_list_field_whole() {
        let pred = DictMatchesPredicate::new([("tags", equivalent(json!(["a", "b"])))]);
        assert!(eval(&pred, json!({"tags": ["b", "a"]})).valid());
    }

    #[test]
    fn test_dict_matches_strict() {
        let pred = dict_pred().with_strict(true);
        let result = eval(&pred, json!({"name": "db", "size": 20, "zone": "a"}));
        let keyed = result.as_keyed().unwrap();
        assert!(!keyed.valid());

        let zone = keyed.get("zone").unwrap().as_path().unwrap();
        assert_eq!(zone.kind(), &PathResultKind::UnexpectedPath);
        assert_eq!(zone.path_value(), &PathValue::new("zone", json!("a")));
    }

    #[test]
    fn test_dict_matches_rejects_non_map() {
        let result = eval(&dict_pred(), json!([1]));
        assert!(matches!(
            result.as_path().unwrap().kind(),
            PathResultKind::TypeMismatch { expected: JsonType::Map, .. }
        ));
    }

    #[test]
    fn test_list_matches() {
        let pred = ListMatchesPredicate::new(vec![
            str_eq("a").unwrap().into_predicate(),
            str_eq("b").unwrap().into_predicate(),
        ]);
        assert!(eval(&pred, json!(["b", "c", "a"])).valid());
        assert!(!eval(&pred, json!(["a", "c"])).valid());
        assert!(eval(&pred, json!(["a", "a", "b"])).valid());
        assert!(!eval(&pred.clone().with_unique(true), json!(["a", "a", "b"])).valid());
    }

    #[test]
    fn test_list_matches_strict_reports_unmatched() {
        let pred = ListMatchesPredicate::new(vec![str_eq("a").unwrap().into_predicate()])
            .with_strict(true);
        let result = eval(&pred, json!(["a", "z"]));
        let sequenced = result.as_sequenced().unwrap();
        assert!(!sequenced.valid());

        let unexpected = sequenced.results()[1].as_path().unwrap();
        assert_eq!(unexpected.kind(), &PathResultKind::UnexpectedPath);
        assert_eq!(unexpected.target_path(), "[1]");
        assert_eq!(unexpected.path_value(), &PathValue::new("[1]", json!("z")));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            dict_pred().to_string(),
            "Matches({\"name\": ==(\"db\")->string, \"size\": >=(10)->number})"
        );
        let pred = ListMatchesPredicate::new(vec![str_eq("a").unwrap().into_predicate()])
            .with_unique(true);
        assert_eq!(pred.to_string(), "Matches([==(\"a\")->string]) unique");
    }
}
