// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Autoreconnect Adapter (C8, spec.md §4.6).
//!
//! Rust has no runtime field reflection, so "walks the Work Unit's
//! fields recursively" is realized as an explicit opt-in hook rather
//! than generic traversal: a [`Job`] that may hold deferred-reconnect
//! placeholders implements [`Reconnectable::reconnect`], which the
//! engine calls once, before the first `prerun`, with the
//! [`ReconnectRegistry`] the worker was started with. This follows
//! spec.md §9's own guidance — "model as a record of optional function
//! values... never assume inheritance" — applied to C8 the same way it
//! is applied to the lifecycle hooks themselves.

use labor_core::BoxError;
pub use labor_core::{Placeholder, ReconnectRegistry};

/// Implemented by work units that may hold deferred-reconnect
/// placeholders. Default implementation is a no-op: most jobs hold no
/// live-resource fields and never need reconnection.
pub trait Reconnectable {
    fn reconnect(&mut self, _registry: &ReconnectRegistry) -> Result<(), BoxError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "reconnect_tests.rs"]
mod tests;
