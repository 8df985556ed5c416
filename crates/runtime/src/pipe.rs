// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Pipe Primitive (C1, spec.md §4.5).
//!
//! `Pipe::pair` hands back two [`Endpoint`]s sharing one duplex (or
//! one-way) channel: the first is the anchor, pinned forever to
//! whichever side created it; the second is the point, transferable
//! exactly once (e.g. moved into a work unit about to be dispatched to
//! a worker). Built on the same bounded-`mpsc` backpressure model the
//! rest of the workspace already uses for framed stdio, generalized to
//! an arbitrary pair of ends instead of one fixed parent/worker leg.
//!
//! Values cross the channel JSON-encoded rather than moved directly —
//! this keeps `send`'s failure mode (an unserializable value) distinct
//! from a closed/full channel, matching the teacher's pattern of
//! catching encode errors at the boundary rather than deep in a queue.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("the anchor endpoint of a pipe cannot be transferred or unlocked")]
    AnchorPinned,
    #[error("endpoint has already been transferred once")]
    AlreadyTransferred,
    #[error("pipe is closed")]
    Closed,
    #[error("endpoint is send-only")]
    SendOnly,
    #[error("endpoint is recv-only")]
    RecvOnly,
    #[error("failed to serialize pipe value: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to deserialize pipe value: {0}")]
    Deserialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Anchor,
    Point,
}

struct Shared {
    closed: AtomicBool,
}

/// What [`Endpoint::recv`] got: a decoded value, the closed-and-drained
/// sentinel, or a deadline expiring first (spec.md §4.5 "`recv()`
/// blocks; optional deadline variant returns a sentinel on timeout").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvOutcome<T> {
    Value(T),
    Closed,
    TimedOut,
}

/// One side of a [`Pipe`] pair (spec.md §3 "Pipe Endpoint").
///
/// The anchor and the point share this same type, distinguished only
/// by an internal `role` set at [`Pipe::pair`] time: every operation is
/// identical modulo what pinning and direction allow.
pub struct Endpoint<T> {
    role: Role,
    tx: Option<mpsc::Sender<Vec<u8>>>,
    rx: Option<mpsc::Receiver<Vec<u8>>>,
    shared: Arc<Shared>,
    locked: bool,
    _marker: PhantomData<fn() -> T>,
}

pub struct Pipe;

impl Pipe {
    /// Create a pair of endpoints. `one_way` makes the anchor send-only
    /// and the point recv-only; otherwise both ends are duplex.
    pub fn pair<T>(one_way: bool) -> (Endpoint<T>, Endpoint<T>)
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let shared = Arc::new(Shared { closed: AtomicBool::new(false) });
        let (anchor_to_point_tx, anchor_to_point_rx) = mpsc::channel(CHANNEL_CAPACITY);

        if one_way {
            let anchor = Endpoint {
                role: Role::Anchor,
                tx: Some(anchor_to_point_tx),
                rx: None,
                shared: shared.clone(),
                locked: false,
                _marker: PhantomData,
            };
            let point = Endpoint {
                role: Role::Point,
                tx: None,
                rx: Some(anchor_to_point_rx),
                shared,
                locked: false,
                _marker: PhantomData,
            };
            return (anchor, point);
        }

        let (point_to_anchor_tx, point_to_anchor_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let anchor = Endpoint {
            role: Role::Anchor,
            tx: Some(anchor_to_point_tx),
            rx: Some(point_to_anchor_rx),
            shared: shared.clone(),
            locked: false,
            _marker: PhantomData,
        };
        let point = Endpoint {
            role: Role::Point,
            tx: Some(point_to_anchor_tx),
            rx: Some(anchor_to_point_rx),
            shared,
            locked: false,
            _marker: PhantomData,
        };
        (anchor, point)
    }
}

impl<T> Endpoint<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Hand this endpoint onward — e.g. moving the point into a work
    /// unit about to be dispatched to a worker. The anchor can never be
    /// transferred (spec.md §4.5, Testable Property #12); the point can
    /// be transferred exactly once, after which it is locked and a
    /// second attempt raises [`EndpointError::AlreadyTransferred`].
    pub fn transfer(mut self) -> Result<Self, EndpointError> {
        match self.role {
            Role::Anchor => Err(EndpointError::AnchorPinned),
            Role::Point if self.locked => Err(EndpointError::AlreadyTransferred),
            Role::Point => {
                self.locked = true;
                Ok(self)
            }
        }
    }

    /// Reverse a point's transferred-lock, e.g. once it has arrived at
    /// its destination and is ready for a further hand-off. Raises on
    /// the anchor, which is never unlocked (spec.md §3 endpoint ops).
    pub fn unlock(&mut self) -> Result<(), EndpointError> {
        match self.role {
            Role::Anchor => Err(EndpointError::AnchorPinned),
            Role::Point => {
                self.locked = false;
                Ok(())
            }
        }
    }

    /// Non-blocking up to the channel's buffer; blocks only once the
    /// buffer is saturated (spec.md §4.5).
    pub async fn send(&self, value: T) -> Result<(), EndpointError> {
        if self.is_closed() {
            return Err(EndpointError::Closed);
        }
        let tx = self.tx.as_ref().ok_or(EndpointError::RecvOnly)?;
        let bytes = serde_json::to_vec(&value).map_err(EndpointError::Serialize)?;
        tx.send(bytes).await.map_err(|_| EndpointError::Closed)
    }

    /// Block until a value arrives, the pipe closes, or (if `deadline`
    /// is set) the deadline elapses first.
    pub async fn recv(&mut self, deadline: Option<Duration>) -> Result<RecvOutcome<T>, EndpointError> {
        let closed = self.is_closed();
        let rx = self.rx.as_mut().ok_or(EndpointError::SendOnly)?;

        let bytes = if closed {
            rx.try_recv().ok()
        } else {
            match deadline {
                Some(d) => match tokio::time::timeout(d, rx.recv()).await {
                    Ok(bytes) => bytes,
                    Err(_) => return Ok(RecvOutcome::TimedOut),
                },
                None => rx.recv().await,
            }
        };

        match bytes {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(EndpointError::Deserialize)?;
                Ok(RecvOutcome::Value(value))
            }
            None => Ok(RecvOutcome::Closed),
        }
    }

    /// Idempotent. After close, `send` raises; `recv` still drains
    /// whatever was already buffered before returning the closed
    /// sentinel (spec.md §4.5).
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "pipe_tests.rs"]
mod tests;
