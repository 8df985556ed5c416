// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker↔parent envelope (spec.md §6): one tagged frame multiplexing
//! the result, tell, and listen queues over the worker's stdin/stdout.

use labor_core::timer::TimerSummary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which logical queue an [`Envelope`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// A final `Job::Output` value, sent exactly once before exit.
    Result,
    /// A final `ProcessError`, sent exactly once before exit, in place of `Result`.
    Error,
    /// A fire-and-forget message pushed from worker to parent mid-run.
    Tell,
    /// A message pushed from parent to worker mid-run.
    Listen,
    /// Parent-to-worker request to stop at the next safe point.
    Stop,
}

/// One frame of the worker wire protocol.
///
/// `payload` is left as a [`serde_json::Value`] here because this crate
/// doesn't know the job's `Output` type; `labor-engine` and
/// `labor-runtime` decode/encode it against the concrete type at the
/// point they hold it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: FrameKind,
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timers: Option<HashMap<String, TimerSummary>>,
}

impl Envelope {
    pub fn result(payload: serde_json::Value, timers: HashMap<String, TimerSummary>) -> Self {
        Self { kind: FrameKind::Result, payload, timers: Some(timers) }
    }

    pub fn error(payload: serde_json::Value, timers: HashMap<String, TimerSummary>) -> Self {
        Self { kind: FrameKind::Error, payload, timers: Some(timers) }
    }

    pub fn tell(payload: serde_json::Value) -> Self {
        Self { kind: FrameKind::Tell, payload, timers: None }
    }

    pub fn listen(payload: serde_json::Value) -> Self {
        Self { kind: FrameKind::Listen, payload, timers: None }
    }

    pub fn stop() -> Self {
        Self { kind: FrameKind::Stop, payload: serde_json::Value::Null, timers: None }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
