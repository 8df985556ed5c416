// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The deferred-reconnect placeholder (spec.md §6, §4.6).
//!
//! A serialized stand-in for a live resource (a database connection, a
//! socket, a file handle) that cannot cross a process boundary. The
//! external Serializer this crate treats as opaque emits one of these in
//! place of the live value; `labor-engine`'s Autoreconnect Adapter (C8)
//! reconstitutes it inside the worker before `prerun`, and
//! `labor-share`'s Coordinator reconstitutes every placeholder currently
//! held in shared state on `RECONNECT_ALL`. Lives here, rather than in
//! either of those crates, because both need the same wire shape without
//! depending on each other.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A serialized stand-in for a live resource that could not cross the
/// process boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placeholder {
    pub type_tag: String,
    pub attributes: HashMap<String, String>,
}

impl Placeholder {
    pub fn new(type_tag: impl Into<String>, attributes: HashMap<String, String>) -> Self {
        Self { type_tag: type_tag.into(), attributes }
    }
}

/// Per-type, per-attribute parameters registered at Work Unit
/// declaration time (or at `labor-share` Coordinator startup), used to
/// reconstitute [`Placeholder`]s.
///
/// This only merges declared parameters with the placeholder's own
/// attributes into a plain attribute map — it never fabricates a live
/// resource itself, since this crate has no notion of what a "database
/// connection" or "socket" concretely is. Turning the merged map into an
/// actual live value is inherently host-specific and is left to the
/// caller: `labor-engine`'s `Reconnectable::reconnect` for a worker's own
/// fields, or the binary that registered a `labor-share` Coordinator's
/// reconnect parameters for shared-state placeholders.
#[derive(Debug, Clone, Default)]
pub struct ReconnectRegistry {
    params: HashMap<String, HashMap<String, String>>,
}

impl ReconnectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_tag: impl Into<String>, params: HashMap<String, String>) {
        self.params.insert(type_tag.into(), params);
    }

    pub fn params_for(&self, type_tag: &str) -> Option<&HashMap<String, String>> {
        self.params.get(type_tag)
    }

    /// Attempt to reconstitute one placeholder. Returns `None` if no
    /// registration exists for its type tag — the caller should treat
    /// that as "cannot be reconstituted" per spec.md §4.6.
    pub fn reconstitute(&self, placeholder: &Placeholder) -> Option<HashMap<String, String>> {
        let registered = self.params_for(&placeholder.type_tag)?;
        let mut merged = registered.clone();
        merged.extend(placeholder.attributes.clone());
        Some(merged)
    }
}

#[cfg(test)]
#[path = "placeholder_tests.rs"]
mod tests;
