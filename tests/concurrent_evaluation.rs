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

//! Integration tests for sharing predicates across threads

use json_predicate::predicate::binary::num_ge;
use json_predicate::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::thread;

fn create_inventory(id: usize) -> Value {
    let disks: Vec<Value> = (0..id % 5 + 1)
        .map(|n| json!({"name": format!("disk-{n}"), "size": (n + 1) * 50}))
        .collect();
    json!({"id": id, "disks": disks})
}

#[test]
fn test_shared_predicate_across_threads() {
    let pred: Predicate = Arc::new(
        CardinalityPredicate::new(
            PathPredicate::new("disks/size").with_predicate(num_ge(100).unwrap()),
        )
        .with_min(Operand::variable("min_large")),
    );
    let context = ExecutionContext::new().with_variable("min_large", 2);

    let counts: Vec<(usize, bool)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|id| {
                let pred = Arc::clone(&pred);
                let context = &context;
                scope.spawn(move || {
                    let result = pred.evaluate(context, &create_inventory(id));
                    let count = result
                        .as_cardinality()
                        .map(CardinalityResult::count)
                        .unwrap_or_default();
                    (count, result.valid())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for (id, (count, valid)) in counts.into_iter().enumerate() {
        let disks = id % 5 + 1;
        assert_eq!(count, disks - 1);
        assert_eq!(valid, disks >= 3);
    }
}

#[test]
fn test_shared_source_document() {
    let source = ArcJsonValue::new(create_inventory(4));
    let paths = ["disks/name", "disks/size", "disks[2]", "id"];

    let totals: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = paths
            .iter()
            .map(|path| {
                let source = source.clone();
                scope.spawn(move || {
                    PathPredicate::new(*path)
                        .collect_shared(&ExecutionContext::new(), source)
                        .path_values()
                        .len()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(totals, vec![5, 5, 1, 1]);
}
