// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod context;
pub mod entrypoint;
pub mod lifecycle;
pub mod reconnect;

pub use context::{tell, listen, WorkerIo};
pub use entrypoint::run_worker_entrypoint;
pub use lifecycle::{run_lifecycle, LifecycleOutcome};
pub use reconnect::{Placeholder, Reconnectable, ReconnectRegistry};
