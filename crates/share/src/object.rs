// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracked objects (spec.md §3 "Shared-State Item", §4.4.3).
//!
//! A tracked object's authoritative instance lives in the Coordinator;
//! proxies in workers never hold it directly. Rust has no dynamic
//! attribute/method dispatch, so "route member access to the
//! coordinator" is realized as one object-safe trait a shared type
//! implements once, rather than generic reflection over arbitrary user
//! objects (the same design note spec.md §9 gives for the `Job` trait
//! applies here).

use labor_core::error::ProcessError;

use crate::meta::SharedMeta;

/// A user-defined type whose authoritative instance the Coordinator
/// owns. Implementors name their own members and declare which ones are
/// read-only via [`SharedObject::meta`].
pub trait SharedObject: Send + 'static {
    /// `{readers, writers}` for this type (spec.md §4.4.2).
    fn meta(&self) -> &SharedMeta;

    /// Read a named member without mutating state. Coordinator routes
    /// `GET(name, member)` here.
    fn get_member(&self, member: &str) -> Result<serde_json::Value, ProcessError>;

    /// Invoke a named member, possibly mutating state. Coordinator
    /// routes `CALL(name, member, args)` here; always executed against
    /// the authoritative instance (spec.md §4.4.2 "writers must be
    /// executed in the coordinator").
    fn call_member(
        &mut self,
        member: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ProcessError>;

    /// A full snapshot of this object's state, used to answer a bare
    /// `GET(name, "")` (read the whole tracked value) and to populate
    /// `RECONNECT_ALL`'s response map.
    fn snapshot(&self) -> serde_json::Value;

    /// A short name identifying this object's concrete type, carried
    /// alongside tracked slots so a coordinator restart or a
    /// cross-process proxy can report sensible errors without needing
    /// to downcast.
    fn type_name(&self) -> &'static str;
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
