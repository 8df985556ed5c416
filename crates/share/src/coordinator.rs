// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Shared-State Coordinator's serialized request loop and its
//! Unix-socket listener (spec.md §4.4, §6).
//!
//! One task owns a [`CoordinatorState`] exclusively and drains a
//! `mpsc` channel against it one message at a time — the same
//! single-owner-task shape the teacher's `listener::run` accept loop
//! uses for its own authoritative state, adapted here from "one accept
//! loop, shared state behind a lock" to "one accept loop, state behind
//! a channel" since linearizability per name (spec.md §4.4.1) is
//! easier to get right as "only one task ever touches `CoordinatorState`"
//! than as a mutex a dozen connection tasks contend over.
//!
//! A [`CoordinatorHandle`] reaches this task two ways: in-process,
//! directly (used by [`crate::share::Share`] when the caller lives in
//! the same process the Coordinator task runs in — typically the
//! parent), or remotely, via [`serve_unix`]'s accept loop translating
//! wire [`CoordinatorRequest`]s from a worker-side proxy into the same
//! channel.

use std::collections::HashMap;
use std::path::Path;

use labor_core::ReconnectRegistry;
use labor_wire::{CoordinatorRequest, CoordinatorResponse, ProtocolError};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::state::CoordinatorState;
use crate::value::ShareValue;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Get { name: String, member: String, reply: Reply<Result<serde_json::Value, labor_core::error::ProcessError>> },
    Call { name: String, member: String, args: serde_json::Value, reply: Reply<Result<serde_json::Value, labor_core::error::ProcessError>> },
    Set { name: String, value: ShareValue, reply: Reply<Result<(), labor_core::error::ProcessError>> },
    Delete { name: String, reply: Reply<Result<(), labor_core::error::ProcessError>> },
    Clear { reply: Reply<()> },
    ReconnectAll { reply: Reply<HashMap<String, serde_json::Value>> },
    Stop { reply: Reply<()> },
}

/// A live Coordinator task. Cloning is cheap — every clone shares the
/// same underlying channel and therefore the same serialized state.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Command>,
}

#[derive(Debug, thiserror::Error)]
#[error("shared-state coordinator has stopped")]
pub struct CoordinatorStopped;

impl CoordinatorHandle {
    pub async fn get(&self, name: impl Into<String>, member: impl Into<String>) -> Result<serde_json::Value, labor_core::error::ProcessError> {
        self.roundtrip(|reply| Command::Get { name: name.into(), member: member.into(), reply })
            .await
            .unwrap_or_else(|e| Err(e.into()))
    }

    pub async fn call(
        &self,
        name: impl Into<String>,
        member: impl Into<String>,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, labor_core::error::ProcessError> {
        self.roundtrip(|reply| Command::Call { name: name.into(), member: member.into(), args, reply })
            .await
            .unwrap_or_else(|e| Err(e.into()))
    }

    pub async fn set(&self, name: impl Into<String>, value: ShareValue) -> Result<(), labor_core::error::ProcessError> {
        self.roundtrip(|reply| Command::Set { name: name.into(), value, reply })
            .await
            .unwrap_or_else(|e| Err(e.into()))
    }

    pub async fn delete(&self, name: impl Into<String>) -> Result<(), labor_core::error::ProcessError> {
        self.roundtrip(|reply| Command::Delete { name: name.into(), reply })
            .await
            .unwrap_or_else(|e| Err(e.into()))
    }

    pub async fn clear(&self) -> Result<(), CoordinatorStopped> {
        self.roundtrip(|reply| Command::Clear { reply }).await
    }

    pub async fn reconnect_all(&self) -> Result<HashMap<String, serde_json::Value>, CoordinatorStopped> {
        self.roundtrip(|reply| Command::ReconnectAll { reply }).await
    }

    /// Stop the Coordinator task. Any handle held after this resolves
    /// will fail every subsequent call with [`CoordinatorStopped`].
    pub async fn stop(&self) -> Result<(), CoordinatorStopped> {
        self.roundtrip(|reply| Command::Stop { reply }).await
    }

    async fn roundtrip<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, CoordinatorStopped> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(build(reply_tx)).map_err(|_| CoordinatorStopped)?;
        reply_rx.await.map_err(|_| CoordinatorStopped)
    }
}

impl From<CoordinatorStopped> for labor_core::error::ProcessError {
    fn from(_: CoordinatorStopped) -> Self {
        labor_core::error::ProcessError::Coordinator("coordinator has stopped".into())
    }
}

/// Spawn the Coordinator task. Returns a handle immediately; the task
/// itself runs until [`CoordinatorHandle::stop`] is called or every
/// handle (and every still-open connection's clone of one) is dropped.
pub fn spawn(registry: ReconnectRegistry) -> (CoordinatorHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(rx, CoordinatorState::with_reconnect_registry(registry)));
    (CoordinatorHandle { tx }, task)
}

async fn run(mut rx: mpsc::UnboundedReceiver<Command>, mut state: CoordinatorState) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Get { name, member, reply } => {
                let _ = reply.send(state.get(&name, &member));
            }
            Command::Call { name, member, args, reply } => {
                let _ = reply.send(state.call(&name, &member, args));
            }
            Command::Set { name, value, reply } => {
                let _ = reply.send(state.set(name, value));
            }
            Command::Delete { name, reply } => {
                let _ = reply.send(state.delete(&name));
            }
            Command::Clear { reply } => {
                state.clear();
                let _ = reply.send(());
            }
            Command::ReconnectAll { reply } => {
                let _ = reply.send(state.reconnect_all());
            }
            Command::Stop { reply } => {
                let _ = reply.send(());
                break;
            }
        }
    }
    info!("shared-state coordinator stopped");
}

/// Accept loop for remote (cross-process) proxies. Each connection gets
/// its own task reading [`CoordinatorRequest`] frames and translating
/// them into calls against `handle` — grounded on the teacher's
/// `listener::run`: one `tokio::spawn` per accepted connection, each
/// handling exactly its own socket until the peer disconnects.
#[instrument(skip(handle))]
pub async fn serve_unix(path: impl AsRef<Path> + std::fmt::Debug, handle: CoordinatorHandle) -> std::io::Result<()> {
    let path = path.as_ref();
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let listener = UnixListener::bind(path)?;
    info!(?path, "shared-state coordinator listening");
    loop {
        let (stream, _addr) = listener.accept().await?;
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_connection(stream, handle).await {
                if !matches!(err, ProtocolError::ConnectionClosed) {
                    warn!(%err, "shared-state coordinator connection ended with an error");
                }
            }
        });
    }
}

async fn serve_connection(mut stream: UnixStream, handle: CoordinatorHandle) -> Result<(), ProtocolError> {
    loop {
        let request: CoordinatorRequest = labor_wire::read_framed(&mut stream).await?;
        let response = dispatch(&handle, request).await;
        labor_wire::write_framed(&mut stream, &response).await?;
    }
}

pub(crate) async fn dispatch(handle: &CoordinatorHandle, request: CoordinatorRequest) -> CoordinatorResponse {
    match request {
        CoordinatorRequest::Get { name, member } => match handle.get(name, member).await {
            Ok(payload) => CoordinatorResponse::Value { payload },
            Err(err) => CoordinatorResponse::error(err.to_string()),
        },
        CoordinatorRequest::Call { name, member, args } => match handle.call(name, member, args).await {
            Ok(payload) => CoordinatorResponse::Value { payload },
            Err(err) => CoordinatorResponse::error(err.to_string()),
        },
        CoordinatorRequest::Set { name, value } => {
            match handle.set(name, ShareValue::from_wire(value)).await {
                Ok(()) => CoordinatorResponse::Ack,
                Err(err) => CoordinatorResponse::error(err.to_string()),
            }
        }
        CoordinatorRequest::Delete { name } => match handle.delete(name).await {
            Ok(()) => CoordinatorResponse::Ack,
            Err(err) => CoordinatorResponse::error(err.to_string()),
        },
        CoordinatorRequest::Clear => match handle.clear().await {
            Ok(()) => CoordinatorResponse::Ack,
            Err(err) => CoordinatorResponse::error(err.to_string()),
        },
        CoordinatorRequest::ReconnectAll => match handle.reconnect_all().await {
            Ok(values) => CoordinatorResponse::Map { values },
            Err(err) => CoordinatorResponse::error(err.to_string()),
        },
        CoordinatorRequest::Stop { deadline } => {
            let stop = handle.stop();
            let result = match deadline {
                Some(d) => tokio::time::timeout(d, stop).await.map_err(|_| CoordinatorStopped).and_then(|r| r),
                None => stop.await,
            };
            match result {
                Ok(()) => CoordinatorResponse::Ack,
                Err(_) => CoordinatorResponse::Timeout,
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
