// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client side of the Shared-State Coordinator protocol (spec.md
//! §4.4.4 "proxies").
//!
//! A [`Proxy`] is how code that does not itself own the Coordinator task
//! reaches it: [`Proxy::local`] for another task in the same process
//! (skips the socket entirely — [`crate::coordinator::dispatch`] runs
//! in-line), [`Proxy::connect`] for a worker process that only has a
//! filesystem path to a running [`crate::coordinator::serve_unix`]
//! listener. Both expose the same typed methods so a work unit's code
//! never needs to know which one it was handed.

use std::path::Path;

use labor_core::error::ProcessError;
use labor_wire::{CoordinatorRequest, CoordinatorResponse, ProtocolError};
use tokio::net::UnixStream;
use tokio::sync::Mutex;

use crate::coordinator::{dispatch, CoordinatorHandle};
use crate::value::ShareValue;

/// A handle to a Coordinator, reachable either in-process or over a
/// Unix socket.
pub enum Proxy {
    Local(CoordinatorHandle),
    Remote(Mutex<UnixStream>),
}

impl Proxy {
    pub fn local(handle: CoordinatorHandle) -> Self {
        Proxy::Local(handle)
    }

    /// Connect to a Coordinator listening at `path`. One connection is
    /// reused for every call on this `Proxy` — requests on a single
    /// socket are answered strictly in order, so no request-ID
    /// correlation is needed, but only one request may be in flight at
    /// a time per `Proxy` (the internal lock enforces this).
    pub async fn connect(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let stream = UnixStream::connect(path).await?;
        Ok(Proxy::Remote(Mutex::new(stream)))
    }

    pub async fn get(&self, name: impl Into<String>, member: impl Into<String>) -> Result<serde_json::Value, ProcessError> {
        match self.roundtrip(CoordinatorRequest::Get { name: name.into(), member: member.into() }).await? {
            CoordinatorResponse::Value { payload } => Ok(payload),
            other => Err(unexpected_or_error(other)),
        }
    }

    pub async fn call(
        &self,
        name: impl Into<String>,
        member: impl Into<String>,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ProcessError> {
        match self.roundtrip(CoordinatorRequest::Call { name: name.into(), member: member.into(), args }).await? {
            CoordinatorResponse::Value { payload } => Ok(payload),
            other => Err(unexpected_or_error(other)),
        }
    }

    /// Assign a primitive value. Tracked objects can only be assigned
    /// from the process that owns the Coordinator task directly (see
    /// [`ShareValue::tracked`]) — a remote `Proxy` can only ever send
    /// JSON over the wire.
    pub async fn set_primitive(&self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Result<(), ProcessError> {
        match self.roundtrip(CoordinatorRequest::Set { name: name.into(), value: value.into() }).await? {
            CoordinatorResponse::Ack => Ok(()),
            other => Err(unexpected_or_error(other)),
        }
    }

    /// Assign a tracked object. Only meaningful against [`Proxy::Local`]
    /// — a [`Proxy::Remote`] rejects this immediately, since a
    /// `Box<dyn SharedObject>` cannot be serialized across the socket.
    pub async fn set_tracked(&self, name: impl Into<String>, value: ShareValue) -> Result<(), ProcessError> {
        match self {
            Proxy::Local(handle) => handle.set(name, value).await,
            Proxy::Remote(_) => Err(ProcessError::Coordinator(
                "a tracked object can only be assigned from the process hosting the coordinator".into(),
            )),
        }
    }

    pub async fn delete(&self, name: impl Into<String>) -> Result<(), ProcessError> {
        match self.roundtrip(CoordinatorRequest::Delete { name: name.into() }).await? {
            CoordinatorResponse::Ack => Ok(()),
            other => Err(unexpected_or_error(other)),
        }
    }

    pub async fn clear(&self) -> Result<(), ProcessError> {
        match self.roundtrip(CoordinatorRequest::Clear).await? {
            CoordinatorResponse::Ack => Ok(()),
            other => Err(unexpected_or_error(other)),
        }
    }

    pub async fn reconnect_all(&self) -> Result<std::collections::HashMap<String, serde_json::Value>, ProcessError> {
        match self.roundtrip(CoordinatorRequest::ReconnectAll).await? {
            CoordinatorResponse::Map { values } => Ok(values),
            other => Err(unexpected_or_error(other)),
        }
    }

    pub async fn stop(&self, deadline: Option<std::time::Duration>) -> Result<(), ProcessError> {
        match self.roundtrip(CoordinatorRequest::Stop { deadline }).await? {
            CoordinatorResponse::Ack => Ok(()),
            CoordinatorResponse::Timeout => Err(ProcessError::Coordinator("stop timed out".into())),
            other => Err(unexpected_or_error(other)),
        }
    }

    async fn roundtrip(&self, request: CoordinatorRequest) -> Result<CoordinatorResponse, ProcessError> {
        match self {
            Proxy::Local(handle) => Ok(dispatch(handle, request).await),
            Proxy::Remote(stream) => {
                let mut stream = stream.lock().await;
                labor_wire::write_framed(&mut *stream, &request).await.map_err(wire_error)?;
                labor_wire::read_framed(&mut *stream).await.map_err(wire_error)
            }
        }
    }
}

fn wire_error(err: ProtocolError) -> ProcessError {
    ProcessError::Coordinator(err.to_string())
}

fn unexpected_or_error(response: CoordinatorResponse) -> ProcessError {
    match response {
        CoordinatorResponse::Error { message } => ProcessError::Coordinator(message),
        CoordinatorResponse::Timeout => ProcessError::Coordinator("coordinator request timed out".into()),
        other => ProcessError::Coordinator(format!("unexpected coordinator response: {other:?}")),
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
