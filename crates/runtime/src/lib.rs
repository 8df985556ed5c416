// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! labor-runtime: the parent-side API applications depend on directly.
//!
//! [`WorkerHandle`] (C4, spec.md §4.2) drives one worker process through
//! its lifecycle from the parent side. [`pool::Pool`] (C5, spec.md §4.3)
//! fans out many work units over a bounded set of workers. [`pipe::Pipe`]
//! (C1, spec.md §4.5) is the anchored point-to-point duplex channel the
//! other two build on for auxiliary communication.

pub mod handle;
pub mod pipe;
pub mod pool;

pub use handle::{WorkerHandle, WorkerOutcome, WorkerState};
pub use pipe::{Endpoint, EndpointError, Pipe, RecvOutcome};
pub use pool::{Pool, PoolError, PoolStream, StarItem};
