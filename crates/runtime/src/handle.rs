// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The parent-side Worker Handle (C4, spec.md §4.2).
//!
//! Owns a spawned [`WorkerProcess`] plus the three queues spec.md §3
//! names (`result_queue`, `tell_queue`, `listen_queue`), realized here
//! as a reader task draining the child's framed stdout and a writer
//! task feeding its framed stdin — the same reader/writer-task split
//! `labor_engine::entrypoint` uses on the worker side of the same pipe.

use labor_adapters::{ChildHandle, SpawnError, WorkerProcess};
use labor_core::error::ProcessError;
use labor_core::job::Job;
use labor_core::timer::TimerSummary;
use labor_wire::{Envelope, FrameKind};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// Lifecycle state of a [`WorkerHandle`] (spec.md §3 "Worker Handle
/// State"). `new`/`starting` aren't separate observable states here:
/// `start()` is a single async constructor that returns a handle only
/// once it is already `running`, so there is no window in which a
/// caller could observe either. `retrying` likewise isn't a distinct
/// state — retries happen entirely inside the worker process (spec.md
/// §4.1), invisible to the parent-side state machine. See `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Draining,
    Finished,
    Killed,
}

/// The decoded outcome of a finished worker: either its `Job::Output`,
/// or the "no result" sentinel for a killed worker that never sent a
/// `result_queue` message (spec.md §4.2 `result()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome<T> {
    Success(T),
    NoResult,
}

#[derive(Debug, Error)]
pub enum HandleError {
    #[error("failed to spawn worker process: {0}")]
    Spawn(#[from] SpawnError),
    #[error("serializing work unit failed: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Parent-side control plane for one worker process running a `J`.
///
/// Safe to drive from multiple threads (spec.md §5): every public
/// operation takes `&self` and guards its state behind a short-lived
/// `tokio::sync::Mutex` critical section rather than requiring `&mut
/// self` or external synchronization.
pub struct WorkerHandle<J: Job> {
    state: Mutex<WorkerState>,
    process: Mutex<Option<ChildHandle>>,
    outbound_tx: mpsc::UnboundedSender<Envelope>,
    terminal_rx: Mutex<mpsc::UnboundedReceiver<Envelope>>,
    terminal: Mutex<Option<Envelope>>,
    listen_rx: Mutex<mpsc::UnboundedReceiver<serde_json::Value>>,
    timers: Mutex<HashMap<String, TimerSummary>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    stop_sent: AtomicBool,
    _output: PhantomData<fn() -> J>,
}

impl<J: Job> WorkerHandle<J> {
    /// Serialize `job`, spawn its worker process, and wire the three
    /// queues. Transitions `new → starting → running`.
    #[instrument(skip(job))]
    pub async fn start(job: J) -> Result<Self, HandleError> {
        let job_value = serde_json::to_value(&job).map_err(HandleError::Serialize)?;
        let process = WorkerProcess::spawn()?;
        let (child, stdin, stdout) = process.split();
        Ok(Self::wire(job_value, child, stdin, stdout))
    }

    /// Wire a handle around an already-running process's stdio.
    ///
    /// Split out of [`WorkerHandle::start`] so tests can drive the
    /// reader/writer protocol over `tokio::io::duplex` streams against
    /// a real but otherwise-unrelated child process (used only for its
    /// kill/wait semantics), instead of a re-exec that would require an
    /// actual `labor_engine::run_worker_entrypoint`-dispatching binary.
    fn wire<R, W>(job_value: serde_json::Value, child: ChildHandle, mut stdin: W, mut stdout: R) -> Self
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Envelope>();
        let (terminal_tx, terminal_rx) = mpsc::unbounded_channel::<Envelope>();
        let (listen_tx, listen_rx) = mpsc::unbounded_channel::<serde_json::Value>();

        let reader = tokio::spawn(async move {
            loop {
                let frame: Envelope = match labor_wire::read_framed(&mut stdout).await {
                    Ok(frame) => frame,
                    Err(_) => break,
                };
                match frame.kind {
                    FrameKind::Listen => {
                        if listen_tx.send(frame.payload).is_err() {
                            break;
                        }
                    }
                    FrameKind::Result | FrameKind::Error => {
                        let _ = terminal_tx.send(frame);
                        break;
                    }
                    FrameKind::Tell | FrameKind::Stop => {}
                }
            }
        });

        let writer = tokio::spawn(async move {
            if labor_wire::write_framed(&mut stdin, &job_value).await.is_err() {
                return;
            }
            while let Some(envelope) = outbound_rx.recv().await {
                if labor_wire::write_framed(&mut stdin, &envelope).await.is_err() {
                    break;
                }
            }
        });

        info!("worker handle started");
        Self {
            state: Mutex::new(WorkerState::Running),
            process: Mutex::new(Some(child)),
            outbound_tx,
            terminal_rx: Mutex::new(terminal_rx),
            terminal: Mutex::new(None),
            listen_rx: Mutex::new(listen_rx),
            timers: Mutex::new(HashMap::new()),
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            stop_sent: AtomicBool::new(false),
            _output: PhantomData,
        }
    }

    /// Convenience: `start()` + `wait()` + `result()` (spec.md §6).
    pub async fn run(job: J) -> Result<WorkerOutcome<J::Output>, HandleError> {
        let handle = Self::start(job).await?;
        Ok(handle.result().await?)
    }

    /// Non-blocking: sets the stop flag by sending a `Stop` envelope.
    /// Idempotent — a second call is a no-op.
    pub async fn stop(&self) {
        if self.stop_sent.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.outbound_tx.send(Envelope::stop()).is_err() {
            return;
        }
        let mut state = self.state.lock().await;
        if *state == WorkerState::Running {
            *state = WorkerState::Draining;
        }
    }

    /// Enqueue a value onto `tell_queue` (non-blocking).
    pub fn tell(&self, value: serde_json::Value) -> Result<(), ProcessError> {
        self.outbound_tx
            .send(Envelope::tell(value))
            .map_err(|_| ProcessError::Endpoint("worker stdin channel closed".into()))
    }

    /// Block until the worker's own `tell()` delivers a value, or the
    /// deadline elapses (spec.md §4.2 `listen(timeout?)`).
    pub async fn listen(&self, timeout: Option<Duration>) -> Option<serde_json::Value> {
        let mut listen_rx = self.listen_rx.lock().await;
        match timeout {
            Some(d) => tokio::time::timeout(d, listen_rx.recv()).await.ok().flatten(),
            None => listen_rx.recv().await,
        }
    }

    /// Force-terminate the worker process. No cleanup runs in the
    /// worker; `result()` afterward yields [`WorkerOutcome::NoResult`].
    #[instrument(skip(self))]
    pub async fn kill(&self) {
        if let Some(mut process) = self.process.lock().await.take() {
            if let Err(err) = process.kill().await {
                warn!(%err, "error killing worker process");
            }
        }
        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }
        if let Some(writer) = self.writer.lock().await.take() {
            writer.abort();
        }
        *self.state.lock().await = WorkerState::Killed;
    }

    /// Drain at most one message from `result_queue` with `timeout`,
    /// then join the worker process. MUST drain before join (spec.md
    /// §4.2, §5 "deadlock-avoidance invariants") — the worker cancels
    /// its feeders only after its own write completes, so joining
    /// first could stall forever behind an unconsumed channel write.
    ///
    /// Returns whether the process has exited.
    #[instrument(skip(self))]
    pub async fn wait(&self, timeout: Option<Duration>) -> bool {
        if self.terminal.lock().await.is_none() {
            let mut terminal_rx = self.terminal_rx.lock().await;
            let envelope = match timeout {
                Some(d) => tokio::time::timeout(d, terminal_rx.recv()).await.ok().flatten(),
                None => terminal_rx.recv().await,
            };
            if let Some(envelope) = envelope {
                if let Some(timers) = envelope.timers.clone() {
                    *self.timers.lock().await = timers;
                }
                *self.terminal.lock().await = Some(envelope);
            }
        }

        let mut process_guard = self.process.lock().await;
        let Some(process) = process_guard.as_mut() else {
            return true;
        };
        let joined = match timeout {
            Some(d) => tokio::time::timeout(d, process.wait()).await.is_ok(),
            None => {
                let _ = process.wait().await;
                true
            }
        };
        if joined {
            *process_guard = None;
            *self.state.lock().await = WorkerState::Finished;
        }
        joined
    }

    /// `wait()`, then decode the drained terminal message (spec.md
    /// §4.2 `result()`).
    pub async fn result(&self) -> Result<WorkerOutcome<J::Output>, ProcessError> {
        self.wait(None).await;
        let terminal = self.terminal.lock().await.clone();
        match terminal {
            None => Ok(WorkerOutcome::NoResult),
            Some(envelope) => match envelope.kind {
                FrameKind::Result => {
                    let value: J::Output =
                        serde_json::from_value(envelope.payload).map_err(|e| {
                            ProcessError::Deserialization { path: "result".into(), cause: e.to_string() }
                        })?;
                    Ok(WorkerOutcome::Success(value))
                }
                FrameKind::Error => {
                    let err: ProcessError = serde_json::from_value(envelope.payload)
                        .map_err(|e| ProcessError::Deserialization {
                            path: "error".into(),
                            cause: e.to_string(),
                        })?;
                    Err(err)
                }
                FrameKind::Tell | FrameKind::Listen | FrameKind::Stop => Ok(WorkerOutcome::NoResult),
            },
        }
    }

    /// Best-effort attempt count. Only populated once a terminal
    /// `error` message has arrived — the wire protocol has no
    /// dedicated channel for streaming `current_run` while a worker is
    /// still running, so a successful run's attempt count is only
    /// knowable from the `full_run` timer's sample count, not from
    /// this accessor. Documented limitation; see `DESIGN.md`.
    pub async fn current_run(&self) -> Option<u32> {
        match self.terminal.lock().await.as_ref() {
            Some(envelope) if envelope.kind == FrameKind::Error => {
                let err: ProcessError = serde_json::from_value(envelope.payload.clone()).ok()?;
                err.current_run()
            }
            _ => None,
        }
    }

    pub async fn is_alive(&self) -> bool {
        !matches!(*self.state.lock().await, WorkerState::Finished | WorkerState::Killed)
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.lock().await
    }

    pub async fn timers(&self) -> HashMap<String, TimerSummary> {
        self.timers.lock().await.clone()
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
