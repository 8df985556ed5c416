// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared-state value classification (spec.md §4.4.3 "Object
//! classification").
//!
//! A value assigned to a [`crate::Share`] attribute is one of three
//! kinds: a primitive stored inline, a tracked object whose authoritative
//! instance the Coordinator owns, or a deferred-reconnect placeholder. A
//! fourth category — host-runtime IPC primitives — is never storable at
//! all; assignment is rejected before it reaches the Coordinator.

use labor_core::Placeholder;

use crate::object::SharedObject;

/// Type tags recognized as host-runtime IPC primitives (spec.md §4.4.3
/// "Forbidden values"). These can never be stored, even as a deferred-
/// reconnect placeholder — unlike a database connection or a socket, the
/// whole point of a multiprocessing queue/manager/semaphore/shared-memory
/// handle is the specific OS-level sharing this crate itself already
/// provides through other means (the Coordinator, `Pipe`), so proxying
/// one through `Share` would just be a redundant, broken second channel.
pub const FORBIDDEN_TYPE_TAGS: &[&str] = &[
    "multiprocessing.Queue",
    "multiprocessing.Manager",
    "multiprocessing.Semaphore",
    "multiprocessing.SharedMemory",
    "os.pipe",
    "socket.socket",
];

pub fn is_forbidden_type_tag(type_tag: &str) -> bool {
    FORBIDDEN_TYPE_TAGS.contains(&type_tag)
}

/// A value about to be assigned to a shared-state name.
pub enum ShareValue {
    Primitive(serde_json::Value),
    Tracked(Box<dyn SharedObject>),
    Placeholder(Placeholder),
}

impl ShareValue {
    pub fn primitive(value: impl Into<serde_json::Value>) -> Self {
        Self::Primitive(value.into())
    }

    pub fn tracked(object: impl SharedObject) -> Self {
        Self::Tracked(Box::new(object))
    }

    /// Decode a `SET` request's raw JSON payload as it arrives over the
    /// wire. A `Box<dyn SharedObject>` can never cross a socket, so a
    /// remote `SET` can only ever produce a primitive or a placeholder —
    /// tracked objects can only be registered by the coordinator's own
    /// process via [`ShareValue::tracked`] (spec.md §4.4.3: assigning a
    /// tracked object always happens where its authoritative instance is
    /// constructed).
    pub fn from_wire(value: serde_json::Value) -> Self {
        match decode_wire_placeholder(&value) {
            Some(placeholder) => Self::Placeholder(placeholder),
            None => Self::Primitive(value),
        }
    }
}

/// The tagged shape a placeholder takes when it must travel as plain JSON
/// over [`CoordinatorRequest::Set`](labor_wire::CoordinatorRequest::Set).
fn decode_wire_placeholder(value: &serde_json::Value) -> Option<Placeholder> {
    let obj = value.as_object()?;
    if !obj.get("__placeholder__")?.as_bool()? {
        return None;
    }
    let type_tag = obj.get("type_tag")?.as_str()?.to_string();
    let attributes = obj
        .get("attributes")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    Some(Placeholder::new(type_tag, attributes))
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
