// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authoritative, purely synchronous state store (spec.md §4.4).
//!
//! [`CoordinatorState`] is deliberately not `async` and not shared
//! behind a lock: the Coordinator task (`coordinator.rs`) owns one
//! instance exclusively and drains a request channel against it one
//! message at a time, which is what makes every named slot
//! linearizable (spec.md §4.4.1 "per-name ordering") without this type
//! needing to know anything about tasks, channels, or sockets.

use std::collections::HashMap;

use labor_core::error::ProcessError;
use labor_core::{Placeholder, ReconnectRegistry};

use crate::object::SharedObject;
use crate::value::{is_forbidden_type_tag, ShareValue};

/// One named slot's current contents.
pub enum Slot {
    Primitive(serde_json::Value),
    Tracked(Box<dyn SharedObject>),
    Placeholder(Placeholder),
}

impl From<ShareValue> for Slot {
    fn from(value: ShareValue) -> Self {
        match value {
            ShareValue::Primitive(v) => Slot::Primitive(v),
            ShareValue::Tracked(obj) => Slot::Tracked(obj),
            ShareValue::Placeholder(p) => Slot::Placeholder(p),
        }
    }
}

fn no_such_name(name: &str) -> ProcessError {
    ProcessError::Coordinator(format!("no such shared name: {name}"))
}

/// The coordinator's entire state: a flat namespace of shared values plus
/// the reconnect parameters `RECONNECT_ALL` draws on.
#[derive(Default)]
pub struct CoordinatorState {
    slots: HashMap<String, Slot>,
    reconnect: ReconnectRegistry,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconnect_registry(registry: ReconnectRegistry) -> Self {
        Self { slots: HashMap::new(), reconnect: registry }
    }

    /// `GET(name, member)`. An empty `member` reads the whole value —
    /// the full JSON payload for a primitive, or [`SharedObject::snapshot`]
    /// for a tracked object.
    pub fn get(&self, name: &str, member: &str) -> Result<serde_json::Value, ProcessError> {
        match self.slots.get(name) {
            None => Err(no_such_name(name)),
            Some(Slot::Primitive(value)) => {
                if member.is_empty() {
                    Ok(value.clone())
                } else {
                    value.get(member).cloned().ok_or_else(|| {
                        ProcessError::Coordinator(format!("{name} has no member {member}"))
                    })
                }
            }
            Some(Slot::Tracked(object)) => {
                if member.is_empty() {
                    Ok(object.snapshot())
                } else if object.meta().classify(member) == crate::meta::Capability::Reader {
                    // spec.md §4.4.2: a declared reader may be served from the
                    // serialized snapshot instead of the object's own
                    // `get_member`; fall back if the snapshot doesn't carry
                    // the member under its own name, so a type whose
                    // snapshot shape doesn't mirror its member names still
                    // answers correctly.
                    object
                        .snapshot()
                        .get(member)
                        .cloned()
                        .map_or_else(|| object.get_member(member), Ok)
                } else {
                    object.get_member(member)
                }
            }
            Some(Slot::Placeholder(placeholder)) => Err(ProcessError::Coordinator(format!(
                "{name} is an unresolved {} placeholder; call reconnect_all first",
                placeholder.type_tag
            ))),
        }
    }

    /// `CALL(name, member, args)`. Only tracked objects accept calls;
    /// primitives and unresolved placeholders have no behavior to invoke.
    pub fn call(
        &mut self,
        name: &str,
        member: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ProcessError> {
        match self.slots.get_mut(name) {
            None => Err(no_such_name(name)),
            Some(Slot::Tracked(object)) => {
                // A member explicitly declared a reader documents itself as
                // non-mutating; route it through GET instead of CALL, which
                // spec.md §4.4.2 reserves for writers.
                if object.meta().classify(member) == crate::meta::Capability::Reader {
                    Err(ProcessError::Coordinator(format!(
                        "{name}.{member} is a declared reader; use GET instead of CALL"
                    )))
                } else {
                    object.call_member(member, args)
                }
            }
            Some(Slot::Primitive(_)) => Err(ProcessError::Coordinator(format!(
                "{name} is a primitive value; CALL requires a tracked object"
            ))),
            Some(Slot::Placeholder(placeholder)) => Err(ProcessError::Coordinator(format!(
                "{name} is an unresolved {} placeholder; call reconnect_all first",
                placeholder.type_tag
            ))),
        }
    }

    /// `SET(name, value)`. Rejects a placeholder whose type tag names a
    /// host-runtime IPC primitive outright (spec.md §4.4.3, testable
    /// property #10) — this is the one place that check must happen,
    /// since every assignment path (local `Share::set`, a proxy's wire
    /// `SET`) funnels through here.
    pub fn set(&mut self, name: impl Into<String>, value: ShareValue) -> Result<(), ProcessError> {
        if let ShareValue::Placeholder(placeholder) = &value {
            if is_forbidden_type_tag(&placeholder.type_tag) {
                return Err(ProcessError::Coordinator(format!(
                    "{} is a forbidden host-runtime IPC primitive and cannot be shared",
                    placeholder.type_tag
                )));
            }
        }
        self.slots.insert(name.into(), value.into());
        Ok(())
    }

    /// `DELETE(name)`.
    pub fn delete(&mut self, name: &str) -> Result<(), ProcessError> {
        self.slots.remove(name).map(|_| ()).ok_or_else(|| no_such_name(name))
    }

    /// `CLEAR`. Drops every slot; used between test runs and by a fresh
    /// coordinator start.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// `RECONNECT_ALL`. Resolves every currently-held placeholder against
    /// the registry, replacing resolvable ones in place with the merged
    /// attribute map as a primitive. Placeholders with no matching
    /// registration are left untouched (spec.md §4.6: unresolvable stays
    /// a placeholder, it is not an error).
    pub fn reconnect_all(&mut self) -> HashMap<String, serde_json::Value> {
        let pending: Vec<String> = self
            .slots
            .iter()
            .filter_map(|(name, slot)| matches!(slot, Slot::Placeholder(_)).then(|| name.clone()))
            .collect();

        let mut resolved = HashMap::new();
        for name in pending {
            let Some(Slot::Placeholder(placeholder)) = self.slots.get(&name) else {
                continue;
            };
            let Some(merged) = self.reconnect.reconstitute(placeholder) else {
                continue;
            };
            let value = serde_json::to_value(&merged).unwrap_or(serde_json::Value::Null);
            self.slots.insert(name.clone(), Slot::Primitive(value.clone()));
            resolved.insert(name, value);
        }
        resolved
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
