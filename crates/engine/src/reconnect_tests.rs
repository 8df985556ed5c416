// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

struct PlainJob;
impl Reconnectable for PlainJob {}

#[test]
fn default_reconnect_is_a_noop() {
    let mut job = PlainJob;
    assert!(job.reconnect(&ReconnectRegistry::new()).is_ok());
}

struct ReconnectsEagerly {
    resolved: Option<HashMap<String, String>>,
}

impl Reconnectable for ReconnectsEagerly {
    fn reconnect(&mut self, registry: &ReconnectRegistry) -> Result<(), BoxError> {
        let placeholder = Placeholder::new("db.Connection", HashMap::new());
        self.resolved = registry.reconstitute(&placeholder);
        if self.resolved.is_none() {
            return Err("no registration for db.Connection".into());
        }
        Ok(())
    }
}

#[test]
fn reconnect_hook_can_resolve_a_placeholder_from_the_registry() {
    let mut registry = ReconnectRegistry::new();
    let mut params = HashMap::new();
    params.insert("host".to_string(), "localhost".to_string());
    registry.register("db.Connection", params);

    let mut job = ReconnectsEagerly { resolved: None };
    assert!(job.reconnect(&registry).is_ok());
    assert_eq!(job.resolved.and_then(|m| m.get("host").cloned()), Some("localhost".to_string()));
}

#[test]
fn reconnect_hook_fails_when_registry_has_no_matching_registration() {
    let mut job = ReconnectsEagerly { resolved: None };
    assert!(job.reconnect(&ReconnectRegistry::new()).is_err());
}
