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

//! Integration tests for rendering and serializing results

use json_predicate::predicate::binary::{num_ge, str_eq};
use json_predicate::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_serialized_path_predicate_result() {
    let pred = PathPredicate::new("a/x").with_predicate(num_ge(2).unwrap());
    let result: PredicateResult = pred
        .collect(&ExecutionContext::new(), &json!({"a": [{"x": 1}, {"x": 2}, {"y": 3}]}))
        .into();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["type"], json!("path_predicate"));
    assert_eq!(json["valid"], json!(true));
    assert_eq!(json["pred"], json!("\"a/x\" >=(2)->number"));
    assert_eq!(json["path_values"], json!([{"path": "a[1]/x", "value": 2}]));
    assert_eq!(json["path_failures"][0]["kind"]["kind"], json!("missing_path"));
    assert_eq!(json["path_failures"][0]["target_path"], json!("x"));
}

#[test]
fn test_serialized_cardinality_result() {
    let pred = CardinalityPredicate::new(str_eq("x").unwrap()).with_max(0);
    let result = pred.evaluate(&ExecutionContext::new(), &json!(["x"]));
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["type"], json!("cardinality"));
    assert_eq!(json["outcome"], json!("unexpected_value"));
    assert_eq!(json["cardinality_pred"], json!("Cardinality(\"\" ==(\"x\")->string) 0..0"));
}

#[test]
fn test_summaries() {
    let context = ExecutionContext::new();
    let missing = PathPredicate::new("a/b").collect(&context, &json!({"a": {}}));
    assert_eq!(
        PredicateResult::from(missing.path_failures()[0].clone()).summary(),
        "MissingPathError (BAD)"
    );

    let pred = NegationPredicate::new(str_eq("x").unwrap());
    assert_eq!(
        pred.evaluate(&context, &json!("y")).summary(),
        "SequencedPredicateResult (GOOD)"
    );

    let commented = PathResult::value(json!(1), "", PathValue::root(json!(1)), true, None)
        .with_comment("looks fine");
    assert_eq!(PredicateResult::from(commented).summary(), "looks fine (GOOD)");
}

#[test]
fn test_type_mismatch_message() {
    let result = num_ge(1)
        .unwrap()
        .evaluate(&ExecutionContext::new(), &json!("one"));
    assert_eq!(
        result.to_string(),
        "string is not a number for field=\"\" trace=\"\"=\"one\"."
    );
}

#[test]
fn test_cardinality_messages() {
    let context = ExecutionContext::new();
    let pred = CardinalityPredicate::new(str_eq("x").unwrap()).with_min(1);

    assert_eq!(
        pred.evaluate(&context, &json!([])).to_string(),
        "Expected to find Cardinality(\"\" ==(\"x\")->string) 1..null. No values found."
    );
    assert_eq!(
        pred.clone().with_max(0).evaluate(&context, &json!(["y"])).to_string(),
        "Confirmed no \"\" ==(\"x\")->string."
    );
}

#[test]
fn test_context_from_json() {
    let context = ExecutionContext::from_json(json!({"limit": 2, "user": "bob"})).unwrap();
    assert_eq!(context.len(), 2);
    assert_eq!(context.get("user"), Some(&json!("bob")));
    assert!(ExecutionContext::from_json(json!([1])).is_err());
}
