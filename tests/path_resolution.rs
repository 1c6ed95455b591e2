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

//! Integration tests for locating values by path

use json_predicate::predicate::binary::{num_ge, str_eq};
use json_predicate::predicate::{FieldDifference, FnTransform, path_contains, path_eq};
use json_predicate::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

fn collect(path: &str, value: &Value) -> PathPredicateResult {
    PathPredicate::new(path).collect(&ExecutionContext::new(), value)
}

fn path_values(result: &PathPredicateResult) -> Vec<(String, Value)> {
    result
        .path_values()
        .iter()
        .map(|pv| (pv.path.clone(), pv.value.clone()))
        .collect()
}

#[rstest]
#[case(json!(null))]
#[case(json!(42))]
#[case(json!("text"))]
#[case(json!({"a": {"b": [1, 2]}}))]
fn test_empty_path_is_identity(#[case] value: Value) {
    let result = collect("", &value);
    assert!(result.valid());
    assert_eq!(result.path_values(), &[PathValue::new("", value)]);
    assert!(result.path_failures().is_empty());
}

#[test]
fn test_list_enumeration() {
    let source = json!({"a": [{"x": 1}, {"x": 2}]});
    let result = collect("a/x", &source);

    assert_eq!(
        path_values(&result),
        vec![("a[0]/x".to_string(), json!(1)), ("a[1]/x".to_string(), json!(2))]
    );
    assert!(result.path_failures().is_empty());
}

#[test]
fn test_missing_key_is_pruned() {
    let result = collect("a/missing", &json!({"a": {"x": 1}}));

    assert!(!result.valid());
    assert!(result.path_values().is_empty());
    assert_eq!(result.path_failures().len(), 1);

    let failure = &result.path_failures()[0];
    assert_eq!(failure.kind(), &PathResultKind::MissingPath);
    assert_eq!(failure.target_path(), "missing");
    assert_eq!(failure.path_value(), &PathValue::new("a", json!({"x": 1})));
}

#[test]
fn test_index_out_of_bounds() {
    let result = collect("a[5]", &json!({"a": [1, 2]}));

    assert!(result.path_values().is_empty());
    assert_eq!(result.path_failures().len(), 1);
    assert_eq!(
        result.path_failures()[0].kind(),
        &PathResultKind::IndexBounds { index: 5, len: 2 }
    );
    assert_eq!(
        result.path_failures()[0].to_string(),
        "5 is not in the range 0..2 for path_value=\"a\"=[1,2]."
    );
}

#[test]
fn test_explicit_index() {
    let source = json!({"a": [{"x": 1}, {"x": 2}, {"x": 3}]});
    let result = collect("a[1]/x", &source);
    assert_eq!(path_values(&result), vec![("a[1]/x".to_string(), json!(2))]);
}

#[test]
fn test_nested_lists_are_flattened() {
    let source = json!({"rows": [[{"v": 1}, {"v": 2}], [{"v": 3}]]});
    let result = collect("rows/v", &source);
    assert_eq!(
        path_values(&result),
        vec![
            ("rows[0][0]/v".to_string(), json!(1)),
            ("rows[0][1]/v".to_string(), json!(2)),
            ("rows[1][0]/v".to_string(), json!(3)),
        ]
    );
}

#[rstest]
#[case("tags", 2)]
#[case("tags/", 2)]
#[case("tags@", 1)]
fn test_terminal_list_markers(#[case] path: &str, #[case] expected: usize) {
    let result = collect(path, &json!({"tags": ["a", "b"]}));
    assert_eq!(result.path_values().len(), expected);
}

#[test]
fn test_root_markers_on_list() {
    let source = json!([1, 2, 3]);
    assert_eq!(collect("/", &source).path_values().len(), 3);
    assert_eq!(
        collect("@", &source).path_values(),
        &[PathValue::new("", source.clone())]
    );
}

#[test]
fn test_terminals_can_be_kept_whole() {
    let pred = PathPredicate::new("tags").with_enumerate_terminals(false);
    let result = pred.collect(&ExecutionContext::new(), &json!({"tags": ["a", "b"]}));
    assert_eq!(result.values(), vec![&json!(["a", "b"])]);

    let pred = PathPredicate::new("tags/").with_enumerate_terminals(false);
    let result = pred.collect(&ExecutionContext::new(), &json!({"tags": ["a", "b"]}));
    assert_eq!(result.values().len(), 2);
}

#[test]
fn test_scalar_with_remaining_path_is_missing() {
    let result = collect("a/b/c", &json!({"a": {"b": 7}}));
    let failure = &result.path_failures()[0];
    assert_eq!(failure.kind(), &PathResultKind::MissingPath);
    assert_eq!(failure.target_path(), "c");
}

#[test]
fn test_index_on_map_is_type_mismatch() {
    let result = collect("a[0]", &json!({"a": {"b": 1}}));
    assert!(matches!(
        result.path_failures()[0].kind(),
        PathResultKind::TypeMismatch {
            expected: JsonType::List,
            actual: JsonType::Map
        }
    ));
}

#[test]
fn test_mixed_branches_report_both() {
    let source = json!({"items": [{"id": "a"}, {"name": "b"}, {"id": "c"}]});
    let result = collect("items/id", &source);

    assert_eq!(result.values(), vec![&json!("a"), &json!("c")]);
    assert_eq!(result.path_failures().len(), 1);
    assert_eq!(result.path_failures()[0].path_value().path, "items[1]");
}

#[test]
fn test_filter_partitions_candidates() {
    let source = json!({"disks": [{"size": 10}, {"size": 200}, {"size": 150}]});
    let pred = PathPredicate::new("disks/size").with_predicate(num_ge(100).unwrap());
    let result = pred.collect(&ExecutionContext::new(), &source);

    assert!(result.valid());
    assert_eq!(result.values(), vec![&json!(200), &json!(150)]);
    assert_eq!(result.invalid_candidates().len(), 1);
    assert_eq!(result.invalid_candidates()[0].path_value.path, "disks[0]/size");

    let accepted = result.valid_candidates()[0].result.as_path().unwrap();
    assert_eq!(accepted.target_path(), "disks/size");
    assert_eq!(accepted.path_value().path, "disks[1]/size");
    assert_eq!(accepted.source(), &source);
}

#[test]
fn test_nested_path_predicate_keeps_its_own_source() {
    let source = json!({"zones": [{"hosts": [{"name": "x"}, {"name": "y"}]}]});
    let inner = PathPredicate::new("hosts/name").with_predicate(str_eq("y").unwrap());
    let outer = PathPredicate::new("zones").with_predicate(inner);
    let result = outer.collect(&ExecutionContext::new(), &source);

    assert!(result.valid());
    let candidate = &result.valid_candidates()[0];
    assert_eq!(candidate.path_value.path, "zones[0]");

    let nested = candidate.result.path_predicate_result().unwrap();
    assert_eq!(nested.source(), &source["zones"][0]);
    assert_eq!(nested.valid_candidates()[0].path_value.path, "hosts[1]/name");

    let leaf = nested.valid_candidates()[0].result.as_path().unwrap();
    assert_eq!(leaf.target_path(), "hosts/name");
}

#[test]
fn test_deferred_path() {
    let pred = PathPredicate::deferred(Operand::variable("field"));
    let source = json!({"a": 1, "b": 2});

    let context = ExecutionContext::new().with_variable("field", "b");
    assert_eq!(pred.collect(&context, &source).values(), vec![&json!(2)]);

    let unbound = pred.collect(&ExecutionContext::new(), &source);
    assert!(!unbound.valid());
    assert!(matches!(
        unbound.path_failures()[0].kind(),
        PathResultKind::TypeMismatch {
            expected: JsonType::String,
            actual: JsonType::Null
        }
    ));
}

#[test]
fn test_deferred_operand_in_filter() {
    let pred = path_eq("owner", Operand::variable("user"));
    let source = json!({"owner": "alice"});

    let alice = ExecutionContext::new().with_variable("user", "alice");
    let bob = ExecutionContext::new().with_variable("user", "bob");
    assert!(pred.collect(&alice, &source).valid());
    assert!(!pred.collect(&bob, &source).valid());
}

fn transformed(result: &PathPredicateResult) -> Vec<(String, Value)> {
    result
        .valid_candidates()
        .iter()
        .map(|candidate| {
            let located = candidate.result.as_path().unwrap().path_value();
            (located.path.clone(), located.value.clone())
        })
        .collect()
}

#[test]
fn test_field_difference_transform() {
    let source = json!({"spans": [{"start": 3, "end": 10}, {"start": 5, "end": 6}]});
    let pred = PathPredicate::new("spans")
        .with_transform(FieldDifference::new("end", "start").unwrap());
    let result = pred.collect(&ExecutionContext::new(), &source);

    assert_eq!(
        transformed(&result),
        vec![("spans[0]".to_string(), json!(7)), ("spans[1]".to_string(), json!(1))]
    );
    assert_eq!(result.values(), vec![&source["spans"][0], &source["spans"][1]]);
}

#[test]
fn test_failed_transform_rejects_candidate() {
    let source = json!({"spans": [{"start": 3, "end": 10}, {"start": 5}]});
    let pred = PathPredicate::new("spans")
        .with_transform(FieldDifference::new("end", "start").unwrap());
    let result = pred.collect(&ExecutionContext::new(), &source);

    assert_eq!(transformed(&result), vec![("spans[0]".to_string(), json!(7))]);
    assert_eq!(result.values(), vec![&source["spans"][0]]);
    let rejected = &result.invalid_candidates()[0];
    assert_eq!(rejected.path_value.path, "spans[1]");
    assert!(rejected.result.cause().is_some());
}

#[test]
fn test_closure_transform_uses_context() {
    let scale = FnTransform::new("scale", |context: &ExecutionContext, value: &Value| {
        let factor = context.get("factor").and_then(Value::as_i64).unwrap_or(1);
        Ok(Value::from(value.as_i64().unwrap_or_default() * factor))
    });
    let pred = PathPredicate::new("n").with_transform(scale);
    let context = ExecutionContext::new().with_variable("factor", 3);
    let result = pred.collect(&context, &json!({"n": [1, 2]}));

    assert_eq!(
        transformed(&result),
        vec![("n[0]".to_string(), json!(3)), ("n[1]".to_string(), json!(6))]
    );
    assert_eq!(result.values(), vec![&json!(1), &json!(2)]);
}

#[test]
fn test_path_contains_helper() {
    let source = json!({"labels": ["env=prod", "team=core"]});
    let result = path_contains("labels", "team").collect(&ExecutionContext::new(), &source);
    assert_eq!(result.values(), vec![&json!("team=core")]);
}

#[test]
fn test_shared_source_is_not_copied() {
    let source = ArcJsonValue::new(json!({"a": [1, 2, 3]}));
    let result = PathPredicate::new("a").collect_shared(&ExecutionContext::new(), source.clone());
    assert!(result.source().ptr_eq(&source));
    assert!(result.path_failures().is_empty());
}
