// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Shared-State Coordinator's request/response protocol (spec.md §6).
//!
//! `GET`/`CALL`/`SET`/`DELETE`/`RECONNECT_ALL`/`CLEAR`/`STOP`, framed with
//! [`crate::wire`] the same way the worker envelope is.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A request sent from a proxy (inside a worker) to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op")]
pub enum CoordinatorRequest {
    Get { name: String, member: String },
    Call { name: String, member: String, args: serde_json::Value },
    Set { name: String, value: serde_json::Value },
    Delete { name: String },
    ReconnectAll,
    Clear,
    Stop { deadline: Option<Duration> },
}

/// The coordinator's reply to a [`CoordinatorRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status")]
pub enum CoordinatorResponse {
    Value { payload: serde_json::Value },
    Map { values: HashMap<String, serde_json::Value> },
    Ack,
    Timeout,
    Error { message: String },
}

impl CoordinatorResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
