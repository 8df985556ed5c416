// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::Counter;
use std::collections::HashMap;

#[test]
fn get_on_an_unknown_name_is_an_error() {
    let state = CoordinatorState::new();
    assert!(state.get("nope", "").is_err());
}

#[test]
fn primitive_round_trips_through_set_and_get() {
    let mut state = CoordinatorState::new();
    state.set("count", ShareValue::primitive(7)).unwrap();
    assert_eq!(state.get("count", "").unwrap(), serde_json::json!(7));
}

#[test]
fn get_on_a_primitive_member_reads_a_json_field() {
    let mut state = CoordinatorState::new();
    state.set("config", ShareValue::primitive(serde_json::json!({ "retries": 3 }))).unwrap();
    assert_eq!(state.get("config", "retries").unwrap(), serde_json::json!(3));
}

#[test]
fn tracked_object_call_mutates_the_authoritative_instance() {
    let mut state = CoordinatorState::new();
    state.set("counter", ShareValue::tracked(Counter::new(0))).unwrap();
    let result = state.call("counter", "increment", serde_json::json!([10])).unwrap();
    assert_eq!(result, serde_json::json!(10));
    assert_eq!(state.get("counter", "value").unwrap(), serde_json::json!(10));
}

#[test]
fn get_on_a_declared_reader_is_served_from_the_snapshot() {
    let mut state = CoordinatorState::new();
    state.set("counter", ShareValue::tracked(Counter::new(6))).unwrap();
    assert_eq!(state.get("counter", "value").unwrap(), serde_json::json!(6));
}

#[test]
fn call_on_a_declared_reader_is_rejected() {
    let mut state = CoordinatorState::new();
    state.set("counter", ShareValue::tracked(Counter::new(0))).unwrap();
    assert!(state.call("counter", "value", serde_json::Value::Null).is_err());
}

#[test]
fn call_on_a_primitive_is_rejected() {
    let mut state = CoordinatorState::new();
    state.set("count", ShareValue::primitive(1)).unwrap();
    assert!(state.call("count", "increment", serde_json::Value::Null).is_err());
}

#[test]
fn get_on_an_unresolved_placeholder_is_rejected() {
    let mut state = CoordinatorState::new();
    state.set("db", ShareValue::Placeholder(Placeholder::new("db.Connection", HashMap::new()))).unwrap();
    assert!(state.get("db", "").is_err());
}

#[test]
fn set_rejects_a_forbidden_type_tag_placeholder() {
    let mut state = CoordinatorState::new();
    let result = state.set(
        "q",
        ShareValue::Placeholder(Placeholder::new("multiprocessing.Queue", HashMap::new())),
    );
    assert!(result.is_err());
    assert!(state.get("q", "").is_err());
}

#[test]
fn delete_removes_a_slot_and_errors_if_absent() {
    let mut state = CoordinatorState::new();
    state.set("count", ShareValue::primitive(1)).unwrap();
    assert!(state.delete("count").is_ok());
    assert!(state.delete("count").is_err());
}

#[test]
fn clear_drops_every_slot() {
    let mut state = CoordinatorState::new();
    state.set("a", ShareValue::primitive(1)).unwrap();
    state.set("b", ShareValue::primitive(2)).unwrap();
    state.clear();
    assert!(state.get("a", "").is_err());
    assert!(state.get("b", "").is_err());
}

#[test]
fn reconnect_all_resolves_a_registered_placeholder_in_place() {
    let mut registry = ReconnectRegistry::new();
    let mut params = HashMap::new();
    params.insert("host".to_string(), "localhost".to_string());
    registry.register("db.Connection", params);

    let mut state = CoordinatorState::with_reconnect_registry(registry);
    state.set("db", ShareValue::Placeholder(Placeholder::new("db.Connection", HashMap::new()))).unwrap();

    let resolved = state.reconnect_all();
    assert!(resolved.contains_key("db"));
    assert_eq!(state.get("db", "host").unwrap(), serde_json::json!("localhost"));
}

#[test]
fn reconnect_all_leaves_an_unregistered_placeholder_untouched() {
    let mut state = CoordinatorState::new();
    state.set("db", ShareValue::Placeholder(Placeholder::new("db.Connection", HashMap::new()))).unwrap();

    let resolved = state.reconnect_all();
    assert!(resolved.is_empty());
    assert!(state.get("db", "").is_err());
}
