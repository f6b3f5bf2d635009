//! Tests for the JSON entry points.

use cookie_router::wasm::{available_versions, get_version, plan_route, run_plan};

#[test]
fn test_run_plan_with_explicit_input() {
    let input = r#"{
        "version": "v2031",
        "goal": {"resource": 1000},
        "options": {"click_rate": 8}
    }"#;
    let result = run_plan(input, None);
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.version, "v2031");
    assert!(!result.steps.is_empty());
    assert!(result.final_resource >= 1000.0);
    assert!(result.total_time_seconds > 0.0);
}

#[test]
fn test_run_plan_reports_progress() {
    let mut calls = 0;
    let mut count = |_: usize| calls += 1;
    let result = run_plan(r#"{"category": "short"}"#, Some(&mut count));
    assert!(result.success);
    assert_eq!(calls, result.steps.len());
}

#[test]
fn test_invalid_json() {
    let result = run_plan("not json", None);
    assert!(!result.success);
    assert_eq!(result.error_kind.as_deref(), Some("invalid_input"));
}

#[test]
fn test_missing_goal() {
    let result = run_plan(r#"{"version": "v2031"}"#, None);
    assert!(!result.success);
    assert_eq!(result.error_kind.as_deref(), Some("invalid_input"));
}

#[test]
fn test_unknown_version() {
    let result = run_plan(r#"{"version": "v1", "goal": {"resource": 10}}"#, None);
    assert!(!result.success);
    assert_eq!(result.error_kind.as_deref(), Some("catalog_error"));
}

#[test]
fn test_plan_errors_are_classified() {
    let result = run_plan(
        r#"{"version": "v2031", "goal": {"milestones": ["No such thing"]}}"#,
        None,
    );
    assert!(!result.success);
    assert_eq!(result.error_kind.as_deref(), Some("unknown_catalog_entry"));

    let result = run_plan(
        r#"{"version": "v2031", "goal": {"resource": 1000}, "options": {"lookahead": 0}}"#,
        None,
    );
    assert_eq!(result.error_kind.as_deref(), Some("configuration_error"));
}

#[test]
fn test_plan_route_returns_json() {
    let output = plan_route(r#"{"category": "short"}"#);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["success"], true);
    assert!(value["steps"].as_array().map_or(false, |s| !s.is_empty()));
}

#[test]
fn test_version_listing() {
    let versions: Vec<String> = serde_json::from_str(&available_versions()).unwrap();
    assert_eq!(versions, vec!["v2031", "v2048", "v10466"]);
    assert!(!get_version().is_empty());
}
