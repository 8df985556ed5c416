// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::Counter;
use std::collections::HashMap;

#[test]
fn primitive_constructor_wraps_a_json_value() {
    let value = ShareValue::primitive(42);
    assert!(matches!(value, ShareValue::Primitive(serde_json::Value::Number(_))));
}

#[test]
fn tracked_constructor_boxes_a_shared_object() {
    let value = ShareValue::tracked(Counter::new(0));
    assert!(matches!(value, ShareValue::Tracked(_)));
}

#[test]
fn known_forbidden_type_tags_are_rejected() {
    for tag in FORBIDDEN_TYPE_TAGS {
        assert!(is_forbidden_type_tag(tag), "{tag} should be forbidden");
    }
}

#[test]
fn an_ordinary_placeholder_type_tag_is_not_forbidden() {
    assert!(!is_forbidden_type_tag("db.Connection"));
    assert!(!is_forbidden_type_tag("redis.Client"));
}

#[test]
fn from_wire_decodes_a_tagged_placeholder_payload() {
    let payload = serde_json::json!({
        "__placeholder__": true,
        "type_tag": "db.Connection",
        "attributes": { "host": "localhost" },
    });
    match ShareValue::from_wire(payload) {
        ShareValue::Placeholder(p) => {
            assert_eq!(p.type_tag, "db.Connection");
            assert_eq!(p.attributes.get("host"), Some(&"localhost".to_string()));
        }
        _ => panic!("expected a decoded placeholder"),
    }
}

#[test]
fn from_wire_treats_an_ordinary_object_as_a_primitive() {
    let payload = serde_json::json!({ "host": "localhost" });
    assert!(matches!(ShareValue::from_wire(payload), ShareValue::Primitive(_)));
}

#[test]
fn placeholder_variant_carries_its_type_tag_through() {
    let placeholder = Placeholder::new("db.Connection", HashMap::new());
    let value = ShareValue::Placeholder(placeholder);
    match value {
        ShareValue::Placeholder(p) => assert_eq!(p.type_tag, "db.Connection"),
        _ => panic!("expected Placeholder variant"),
    }
}
