// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-side `tell`/`listen` access for job code (spec.md §4.5).
//!
//! `tell`/`listen` are symmetric from each side's vantage point: the
//! parent's `WorkerHandle::tell` feeds a worker's `listen`, and a
//! worker's `tell` feeds the parent's `listen`. Not every job uses
//! mirrored messaging, so rather than widen the already-settled [`Job`]
//! trait with two more hook parameters, this module exposes the current
//! worker's channel through a task-local, installed for the duration of
//! one [`crate::run_lifecycle`] call by [`WorkerIo::scope`]. Job hook
//! code reaches it through the free functions [`tell`] and [`listen`].

use labor_core::error::ProcessError;
use labor_wire::Envelope;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

tokio::task_local! {
    static CURRENT: Arc<WorkerIo>;
}

/// The channel endpoints wired to a worker's stdout-writer and
/// stdin-reader feeder tasks.
pub struct WorkerIo {
    outbound: mpsc::UnboundedSender<Envelope>,
    inbound: Mutex<mpsc::UnboundedReceiver<serde_json::Value>>,
}

impl WorkerIo {
    /// Build a `WorkerIo` wired to `outbound` (drained by the stdout
    /// writer task) and return the sender the stdin reader task feeds
    /// every `listen`-kind frame it receives from the parent into.
    pub fn new(
        outbound: mpsc::UnboundedSender<Envelope>,
    ) -> (Self, mpsc::UnboundedSender<serde_json::Value>) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        (Self { outbound, inbound: Mutex::new(inbound_rx) }, inbound_tx)
    }

    /// Run `fut` with this `WorkerIo` reachable from anywhere inside it
    /// via [`tell`]/[`listen`].
    pub async fn scope<F: Future>(self: Arc<Self>, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    fn current() -> Result<Arc<WorkerIo>, ProcessError> {
        CURRENT
            .try_with(Arc::clone)
            .map_err(|_| ProcessError::Endpoint("tell/listen called outside a running worker".into()))
    }
}

/// Send a value to the parent's `listen` side.
///
/// Callable from inside any `Job` hook while a lifecycle run is in
/// progress; returns [`ProcessError::Endpoint`] otherwise. Wire-framed
/// as a `Listen`-kind envelope, not `Tell`: spec.md §3 names the queue
/// this populates `listen_queue` (worker→parent) precisely so the
/// parent's `WorkerHandle::listen()` — which only forwards `Listen`-kind
/// frames off its stdout reader — picks it up; "tell"/"listen" name the
/// caller's action, not the frame's direction on the wire.
pub fn tell(value: serde_json::Value) -> Result<(), ProcessError> {
    let io = WorkerIo::current()?;
    io.outbound
        .send(Envelope::listen(value))
        .map_err(|_| ProcessError::Endpoint("worker output channel closed".into()))
}

/// Block until the parent sends a value via its `tell` side.
///
/// `Job` hooks are synchronous by design, so this bridges into the
/// worker's async I/O with [`tokio::task::block_in_place`] — it
/// requires running on a multi-threaded Tokio runtime, since blocking
/// the single reactor thread of a current-thread runtime here would
/// deadlock against the very feeder task this call waits on.
pub fn listen() -> Result<serde_json::Value, ProcessError> {
    let io = WorkerIo::current()?;
    tokio::task::block_in_place(|| {
        tokio::runtime::Handle::current().block_on(async {
            let mut inbound = io.inbound.lock().await;
            inbound
                .recv()
                .await
                .ok_or_else(|| ProcessError::Endpoint("worker input channel closed".into()))
        })
    })
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
