// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process spawn/kill glue for the worker control plane (C4, spec.md §4.2,
//! §5).
//!
//! A worker is the current executable re-exec'd with [`WORKER_MODE_ENV`]
//! set; the host binary checks that env var at the top of its own `main`
//! and dispatches into `labor_engine::run_worker_entrypoint` instead of
//! its normal startup path. Grounded on the teacher's
//! `tokio::process::Command` + piped-stdio + reaper-task shape in
//! `crates/daemon/src/adapters/agent/coop/spawn.rs`.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tracing::{info, warn};

/// Env var a re-exec'd worker process checks to know it should run the
/// worker entrypoint instead of the host binary's normal `main`.
pub const WORKER_MODE_ENV: &str = "LABOR_WORKER_MODE";

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to resolve the current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("failed to spawn worker process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("spawned worker process has no piped stdin/stdout")]
    MissingStdio,
}

/// A spawned worker process and its framed stdio pipes.
///
/// `stdin`/`stdout` are taken out of the child immediately so callers can
/// hand them to `labor-wire`'s framed reader/writer tasks without holding
/// a borrow of the whole [`WorkerProcess`].
pub struct WorkerProcess {
    child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
}

impl WorkerProcess {
    /// Re-exec the current binary as a worker.
    ///
    /// Inherits the parent's environment plus `WORKER_MODE_ENV=1`, pipes
    /// stdin/stdout (the framed result/tell/listen/stop channel) and
    /// inherits stderr so worker panics/logs still reach the parent's
    /// terminal. `kill_on_drop` guards against an orphaned worker process
    /// if the handle is dropped without an explicit `kill`/`wait`.
    pub fn spawn() -> Result<Self, SpawnError> {
        let exe = std::env::current_exe().map_err(SpawnError::CurrentExe)?;
        let mut command = tokio::process::Command::new(exe);
        command.env(WORKER_MODE_ENV, "1");
        Self::spawn_command(command)
    }

    /// Spawn `command` with piped stdin/stdout and inherited stderr.
    ///
    /// Split out of [`WorkerProcess::spawn`] so tests (in this crate and
    /// in `labor-runtime`) can exercise the piping/kill mechanics against
    /// an arbitrary command instead of a re-exec of the test binary
    /// itself, which wouldn't know to dispatch into
    /// `labor_engine::run_worker_entrypoint`.
    pub fn spawn_command(mut command: tokio::process::Command) -> Result<Self, SpawnError> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(SpawnError::Spawn)?;
        let stdin = child.stdin.take().ok_or(SpawnError::MissingStdio)?;
        let stdout = child.stdout.take().ok_or(SpawnError::MissingStdio)?;
        info!(pid = child.id(), "spawned worker process");
        Ok(Self { child, stdin, stdout })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Send `SIGTERM` directly to the worker process.
    ///
    /// The normal cooperative `stop()` path (spec.md §4.2) writes a
    /// `Stop` frame over the same framed stdin the job's `tell` messages
    /// use; this exists as a belt-and-suspenders fallback for a worker
    /// whose stdin-reader task has itself wedged.
    pub fn send_sigterm(&self) {
        let Some(pid) = self.child.id() else { return };
        if let Err(err) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            warn!(pid, %err, "failed to send SIGTERM to worker process");
        }
    }

    /// Force-terminate the process. Preemptive — no cleanup runs in the
    /// worker (spec.md §5 "kill() is preemptive: no cleanup runs").
    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }

    /// Join the process, returning its exit status.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Split into a [`ChildHandle`] (kill/wait/signal) and the owned
    /// stdio pipes, so a caller can hand stdin/stdout to independent
    /// reader/writer tasks while keeping the handle to join or kill the
    /// process from a third place — `labor-runtime`'s `WorkerHandle`
    /// needs exactly this three-way split.
    pub fn split(self) -> (ChildHandle, ChildStdin, ChildStdout) {
        (ChildHandle { child: self.child }, self.stdin, self.stdout)
    }
}

/// The process-control half of a [`WorkerProcess`] after [`WorkerProcess::split`].
pub struct ChildHandle {
    child: Child,
}

impl ChildHandle {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn send_sigterm(&self) {
        let Some(pid) = self.child.id() else { return };
        if let Err(err) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            warn!(pid, %err, "failed to send SIGTERM to worker process");
        }
    }

    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }

    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
