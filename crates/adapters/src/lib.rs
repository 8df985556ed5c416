// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! labor-adapters: OS-facing process glue for the worker control plane
//! (C4, spec.md §4.2).
//!
//! Re-execs the current binary as a worker, wires its stdio into the
//! framed wire protocol, and sends the signals that back `stop`/`kill`.

pub mod process;

pub use process::{ChildHandle, SpawnError, WorkerProcess, WORKER_MODE_ENV};
