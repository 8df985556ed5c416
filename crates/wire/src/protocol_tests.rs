// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn get_request_roundtrips() {
    let req = CoordinatorRequest::Get { name: "counter".into(), member: "value".into() };
    let json = serde_json::to_string(&req).unwrap();
    let back: CoordinatorRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(req, back);
}

#[test]
fn call_request_carries_args() {
    let req = CoordinatorRequest::Call {
        name: "counter".into(),
        member: "incr".into(),
        args: json!([1]),
    };
    match &req {
        CoordinatorRequest::Call { args, .. } => assert_eq!(args, &json!([1])),
        _ => panic!("expected Call"),
    }
}

#[test]
fn stop_request_accepts_no_deadline() {
    let req = CoordinatorRequest::Stop { deadline: None };
    let json = serde_json::to_string(&req).unwrap();
    let back: CoordinatorRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(req, back);
}

#[test]
fn response_error_helper_builds_error_variant() {
    let resp = CoordinatorResponse::error("coordinator unavailable");
    assert!(matches!(resp, CoordinatorResponse::Error { .. }));
}

#[test]
fn map_response_roundtrips() {
    let mut values = HashMap::new();
    values.insert("a".to_string(), json!(1));
    let resp = CoordinatorResponse::Map { values };
    let json = serde_json::to_string(&resp).unwrap();
    let back: CoordinatorResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(resp, back);
}
