// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability metadata for tracked objects (spec.md §4.4.2).
//!
//! Each tracked object type declares which of its members read versus
//! write state. [`CoordinatorState::get`](crate::state::CoordinatorState::get)
//! answers a declared reader from the object's own [`snapshot`](crate::object::SharedObject::snapshot)
//! rather than its `get_member`, and [`CoordinatorState::call`](crate::state::CoordinatorState::call)
//! refuses to route a `CALL` at a declared reader at all. A member absent
//! from `readers` defaults to writer — spec.md's own "safe conservative"
//! default — so a type that under-declares its metadata never accidentally
//! serves a stale snapshot in place of a live read.
//!
//! `writers` records the complementary declaration for self-documentation
//! (spec.md's `_shared_meta = {readers, writers}` shape) even though
//! [`SharedMeta::classify`] never needs to consult it: everything not a
//! reader already classifies as a writer by default.

use std::collections::HashSet;

/// Whether a named member of a tracked object reads or writes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Reader,
    Writer,
}

/// `{readers, writers}` for one tracked object type (spec.md §4.4.2
/// `_shared_meta`).
#[derive(Debug, Clone, Default)]
pub struct SharedMeta {
    readers: HashSet<String>,
    writers: HashSet<String>,
}

impl SharedMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readers(mut self, readers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.readers.extend(readers.into_iter().map(Into::into));
        self
    }

    pub fn with_writers(mut self, writers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.writers.extend(writers.into_iter().map(Into::into));
        self
    }

    /// Classify `member`. Unknown members default to [`Capability::Writer`]
    /// (spec.md §4.4.2).
    pub fn classify(&self, member: &str) -> Capability {
        if self.readers.contains(member) {
            Capability::Reader
        } else {
            Capability::Writer
        }
    }
}

#[cfg(test)]
#[path = "meta_tests.rs"]
mod tests;
