//! Fan-out and join tests for `properties` and `items`

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use validate_json::{Flavor, Report, Rule, ValidationError, Verdict};

use crate::common::mocks::DelayRule;
use crate::common::test_helpers::{collecting_flavor, expect_report, issue_paths, issue_rules};

fn delay_flavor(fail_fast: bool) -> (Flavor, std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
    let mut flavor = if fail_fast {
        Flavor::json_schema()
    } else {
        collecting_flavor()
    };
    let (rule, completed) = DelayRule::new();
    flavor.add_rule("delay", Rule::validator(rule));
    (flavor, completed)
}

#[tokio::test(start_paused = true)]
async fn test_items_out_of_order_completion_keeps_index_order() {
    let (flavor, completed) = delay_flavor(true);
    let schema = json!({"items": {"delay": true}});
    let input = json!([{"ms": 30, "id": "a"}, {"ms": 10, "id": "b"}, {"ms": 20, "id": "c"}]);

    let result = flavor.validate(input.clone(), &schema).await.unwrap();

    assert_eq!(result, input);
    assert_eq!(*completed.lock().unwrap(), vec!["1", "2", "0"]);
}

#[tokio::test(start_paused = true)]
async fn test_properties_out_of_order_completion_keeps_key_order() {
    let (flavor, completed) = delay_flavor(true);
    let schema = json!({
        "properties": {
            "slow": {"delay": true},
            "fast": {"delay": true}
        }
    });
    let input = json!({"fast": {"ms": 5}, "slow": {"ms": 50}});

    let result = flavor.validate(input, &schema).await.unwrap();

    let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["slow", "fast"]);
    assert_eq!(*completed.lock().unwrap(), vec!["fast", "slow"]);
}

#[tokio::test(start_paused = true)]
async fn test_first_failure_cancels_remaining_children() {
    let (flavor, completed) = delay_flavor(true);
    let schema = json!({"items": {"delay": true}});
    let input = json!([{"ms": 100}, {"ms": 10, "fail": true}, {"ms": 200}]);

    let started = tokio::time::Instant::now();
    let report = expect_report(flavor.validate(input, &schema).await);

    assert_eq!(issue_paths(&report), vec!["1"]);
    assert_eq!(issue_rules(&report), vec!["delay"]);
    // Slower siblings were dropped before they completed
    assert_eq!(*completed.lock().unwrap(), vec!["1"]);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_collecting_join_waits_for_every_child() {
    let (flavor, completed) = delay_flavor(false);
    let schema = json!({"items": {"delay": true}});
    let input = json!([
        {"ms": 30, "fail": true},
        {"ms": 20},
        {"ms": 10, "fail": true}
    ]);

    let report = expect_report(flavor.validate(input, &schema).await);

    // Reports merge in index order, not completion order
    assert_eq!(issue_paths(&report), vec!["0", "2"]);
    assert_eq!(completed.lock().unwrap().len(), 3);
}

/// Flavor with a `reject` rule failing `"bad"` without recording any issue
fn rejecting_flavor(fail_fast: bool) -> Flavor {
    let mut flavor = if fail_fast {
        Flavor::json_schema()
    } else {
        collecting_flavor()
    };
    flavor.add_rule(
        "reject",
        Rule::validate_fn(|_, value, _| {
            if value == &json!("bad") {
                Err(ValidationError::Invalid(Report::default()))
            } else {
                Ok(Verdict::Pass)
            }
        }),
    );
    flavor
}

#[tokio::test]
async fn test_child_failing_with_empty_report_fails_items_join() {
    let schema = json!({"items": {"reject": true}});

    for fail_fast in [true, false] {
        let flavor = rejecting_flavor(fail_fast);
        let report = expect_report(flavor.validate(json!(["a", "bad", "c"]), &schema).await);
        assert!(report.is_empty(), "fail_fast = {}", fail_fast);

        let result = flavor.validate(json!(["a", "b", "c"]), &schema).await.unwrap();
        assert_eq!(result, json!(["a", "b", "c"]));
    }
}

#[tokio::test]
async fn test_child_failing_with_empty_report_fails_properties_join() {
    let flavor = rejecting_flavor(false);
    let schema = json!({
        "properties": {"x": {"reject": true}, "y": {}, "z": {}}
    });

    let report = expect_report(
        flavor
            .validate(json!({"x": "bad", "y": 1, "z": 2}), &schema)
            .await,
    );
    assert!(report.is_empty());

    // Other children still report in key order
    let schema = json!({
        "properties": {"x": {"reject": true}, "y": {"type": "string"}}
    });
    let report = expect_report(flavor.validate(json!({"x": "bad", "y": 1}), &schema).await);
    assert_eq!(issue_paths(&report), vec!["y"]);

    let result = flavor
        .validate(json!({"x": "ok", "y": "v"}), &schema)
        .await
        .unwrap();
    assert_eq!(result, json!({"x": "ok", "y": "v"}));
}

#[tokio::test]
async fn test_additional_properties_false_drops_undeclared() {
    let flavor = Flavor::json_schema();
    let schema = json!({
        "properties": {
            "a": {"type": "integer"},
            "b": {"type": "integer"},
            "c": {"type": "integer", "default": 0}
        },
        "additionalProperties": false
    });

    let result = flavor
        .validate(json!({"a": 1, "x": "extra", "y": 2}), &schema)
        .await
        .unwrap();

    // "b" is absent without default, "c" is filled in
    assert_eq!(result, json!({"a": 1, "c": 0}));
}

#[tokio::test]
async fn test_missing_additional_properties_drops_undeclared() {
    let flavor = Flavor::json_schema();
    let schema = json!({"properties": {"a": {}}});

    let result = flavor.validate(json!({"a": 1, "z": 2}), &schema).await.unwrap();
    assert_eq!(result, json!({"a": 1}));
}

#[tokio::test]
async fn test_additional_properties_true_copies_verbatim() {
    let flavor = Flavor::json_schema();
    let schema = json!({
        "properties": {"a": {"type": "integer"}},
        "additionalProperties": true
    });

    let input = json!({"a": 1, "nested": {"deep": [1, 2, {"x": null}]}});
    let result = flavor.validate(input.clone(), &schema).await.unwrap();

    assert_eq!(result, input);
}

#[tokio::test]
async fn test_additional_properties_schema_validates_undeclared() {
    let flavor = Flavor::json_schema();
    let schema = json!({
        "properties": {"id": {"type": "integer"}},
        "additionalProperties": {"type": "string"}
    });

    let ok = flavor
        .validate(json!({"id": 1, "label": "x"}), &schema)
        .await
        .unwrap();
    assert_eq!(ok, json!({"id": 1, "label": "x"}));

    let report = expect_report(flavor.validate(json!({"id": 1, "label": 2}), &schema).await);
    assert_eq!(issue_paths(&report), vec!["label"]);
    assert_eq!(issue_rules(&report), vec!["type"]);
}

#[tokio::test]
async fn test_nested_issue_paths() {
    let flavor = Flavor::json_schema();
    let schema = json!({
        "properties": {
            "users": {
                "items": {
                    "properties": {"name": {"type": "string"}},
                    "required": ["name"]
                }
            }
        }
    });

    let report = expect_report(
        flavor
            .validate(json!({"users": [{"name": "a"}, {"name": 5}]}), &schema)
            .await,
    );
    assert_eq!(issue_paths(&report), vec!["users.1.name"]);

    let report = expect_report(
        flavor
            .validate(json!({"users": [{"name": "a"}, {}]}), &schema)
            .await,
    );
    assert_eq!(issue_paths(&report), vec!["users.1.name"]);
    assert_eq!(issue_rules(&report), vec!["required"]);
}

#[tokio::test]
async fn test_own_issues_precede_child_issues() {
    let flavor = collecting_flavor();
    let schema = json!({
        "properties": {"a": {"type": "string"}},
        "required": ["b"],
        "minProperties": 3,
        "additionalProperties": true
    });

    let report = expect_report(flavor.validate(json!({"a": 1}), &schema).await);

    assert_eq!(issue_rules(&report), vec!["minProperties", "required", "type"]);
    assert_eq!(issue_paths(&report), vec!["", "b", "a"]);
}

#[tokio::test]
async fn test_nested_defaults_are_applied() {
    let flavor = Flavor::json_schema();
    let schema = json!({
        "properties": {
            "settings": {
                "properties": {
                    "theme": {"default": "dark"},
                    "size": {"default": 12}
                },
                "default": {}
            }
        }
    });

    let result = flavor
        .validate(json!({"settings": {"size": 14}}), &schema)
        .await
        .unwrap();
    assert_eq!(result, json!({"settings": {"theme": "dark", "size": 14}}));

    // A defaulted property is written as-is, not re-validated
    let result = flavor.validate(json!({}), &schema).await.unwrap();
    assert_eq!(result, json!({"settings": {}}));
}

#[tokio::test]
async fn test_items_with_nested_properties_prunes_each_element() {
    let flavor = Flavor::json_schema();
    let schema = json!({"items": {"properties": {"keep": {}}}});

    let result = flavor
        .validate(json!([{"keep": 1, "drop": 2}, {"drop": 3}]), &schema)
        .await
        .unwrap();
    assert_eq!(result, json!([{"keep": 1}, {}]));
}

#[tokio::test]
async fn test_non_object_child_schema_is_a_defect() {
    let flavor = Flavor::json_schema();
    let schema = json!({"properties": {"a": "string"}});

    match flavor.validate(json!({"a": "x"}), &schema).await {
        Err(ValidationError::InvalidSchema { path, .. }) => assert_eq!(path.to_string(), "a"),
        other => panic!("Expected InvalidSchema, got {:?}", other),
    }
}

#[tokio::test]
async fn test_child_defects_propagate_through_joins() {
    let flavor = collecting_flavor();
    let schema = json!({"items": {"pattern": "("}});

    let result = flavor.validate(json!(["a", "b"]), &schema).await;
    assert!(matches!(result, Err(ValidationError::InvalidPattern { .. })));
}

#[tokio::test]
async fn test_composition_rules_conflict_on_one_field() {
    let (flavor, _) = delay_flavor(true);
    let schema = json!({"properties": {}, "delay": true});

    let result = flavor.validate(json!({}), &schema).await;
    assert!(matches!(result, Err(ValidationError::Conflict { .. })));
}
