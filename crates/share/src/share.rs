// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public Shared-State Item façade (spec.md §3 "Shared-State Item",
//! §4.4.5 "Lifecycle", §6 "`Share()` constructor").
//!
//! [`Share`] is what a Work Unit's lifecycle methods actually hold: a
//! thin handle around a [`Proxy`], indifferent to whether the
//! Coordinator it talks to runs in this same process ([`Share::start`])
//! or was started by the parent and is only reachable over a socket
//! ([`Share::connect`]).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use labor_core::error::ProcessError;
use labor_core::ReconnectRegistry;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::coordinator::{self, CoordinatorHandle};
use crate::object::SharedObject;
use crate::proxy::Proxy;
use crate::value::ShareValue;

struct GlobalCoordinator {
    handle: CoordinatorHandle,
    #[allow(dead_code)]
    coordinator_task: JoinHandle<()>,
    listener_task: JoinHandle<()>,
}

/// Process-wide holder for a Coordinator started by this process
/// (spec.md §9 "model as a process-wide holder initialized on first
/// `Share()` use and torn down on explicit `stop()`"). Guarded by a
/// plain `parking_lot::Mutex` rather than a `OnceLock` because, unlike
/// most global-registry patterns, this one is explicitly re-armable:
/// `stop()` clears it and a later `start()` may install a fresh one.
static GLOBAL: Mutex<Option<Arc<GlobalCoordinator>>> = Mutex::new(None);

/// A handle to one shared-state namespace.
pub struct Share {
    proxy: Proxy,
}

impl Share {
    /// Start a Coordinator in this process, bind its Unix-socket
    /// listener at `socket_path`, and install it as this process's
    /// shared-state registry. Typically called once, by whatever
    /// process constructs the Work Units (spec.md §4.4.5 `start`:
    /// "spawn coordinator; install a process-wide registry so proxies
    /// constructed in any worker can find it").
    pub async fn start(
        socket_path: impl Into<PathBuf>,
        registry: ReconnectRegistry,
    ) -> std::io::Result<Self> {
        let socket_path = socket_path.into();
        let (handle, coordinator_task) = coordinator::spawn(registry);

        let listener_handle = handle.clone();
        let listener_path = socket_path.clone();
        let listener_task = tokio::spawn(async move {
            if let Err(err) = coordinator::serve_unix(listener_path, listener_handle).await {
                warn!(%err, "shared-state coordinator listener exited");
            }
        });

        *GLOBAL.lock() = Some(Arc::new(GlobalCoordinator { handle: handle.clone(), coordinator_task, listener_task }));
        Ok(Self { proxy: Proxy::local(handle) })
    }

    /// Connect a proxy to a Coordinator already running elsewhere —
    /// typically inside a worker, given the socket path the parent's
    /// `Share::start` was bound to.
    pub async fn connect(socket_path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self { proxy: Proxy::connect(socket_path).await? })
    }

    /// A proxy to the Coordinator this process itself started, if
    /// `start()` has been called and `stop()` has not since reset it.
    pub fn current() -> Option<Self> {
        let handle = GLOBAL.lock().as_ref().map(|g| g.handle.clone())?;
        Some(Self { proxy: Proxy::local(handle) })
    }

    pub async fn set(&self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Result<(), ProcessError> {
        self.proxy.set_primitive(name, value).await
    }

    /// Assign a tracked object. Only valid against a `Share` obtained
    /// from `start()`/`current()` in the Coordinator's own process
    /// (spec.md §4.4.3: the authoritative instance is constructed where
    /// it is assigned) — a `connect()`ed remote `Share` rejects this.
    pub async fn set_tracked(&self, name: impl Into<String>, object: impl SharedObject) -> Result<(), ProcessError> {
        self.proxy.set_tracked(name, ShareValue::tracked(object)).await
    }

    /// Read the whole value stored at `name`.
    pub async fn get(&self, name: impl Into<String>) -> Result<serde_json::Value, ProcessError> {
        self.proxy.get(name, String::new()).await
    }

    /// Read one member of the tracked object stored at `name`.
    pub async fn get_member(
        &self,
        name: impl Into<String>,
        member: impl Into<String>,
    ) -> Result<serde_json::Value, ProcessError> {
        self.proxy.get(name, member).await
    }

    /// Invoke a member of the tracked object stored at `name`.
    pub async fn call(
        &self,
        name: impl Into<String>,
        member: impl Into<String>,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ProcessError> {
        self.proxy.call(name, member, args).await
    }

    pub async fn delete(&self, name: impl Into<String>) -> Result<(), ProcessError> {
        self.proxy.delete(name).await
    }

    /// Drop every tracked name (spec.md §4.4.5 `clear`).
    pub async fn clear(&self) -> Result<(), ProcessError> {
        self.proxy.clear().await
    }

    /// Resolve every placeholder currently held in shared state against
    /// the registry the Coordinator was started with (spec.md §4.4.1
    /// `RECONNECT_ALL`).
    pub async fn reconnect_all(&self) -> Result<HashMap<String, serde_json::Value>, ProcessError> {
        self.proxy.reconnect_all().await
    }

    /// Stop the Coordinator (spec.md §4.4.5 `stop(deadline)`). Tears
    /// down the process-wide registry if this process is the one that
    /// started it; idempotent if called twice or if this `Share` never
    /// owned a Coordinator to begin with.
    pub async fn stop(&self, deadline: Option<Duration>) -> Result<(), ProcessError> {
        self.proxy.stop(deadline).await?;
        if let Some(global) = GLOBAL.lock().take() {
            global.listener_task.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "share_tests.rs"]
mod tests;
