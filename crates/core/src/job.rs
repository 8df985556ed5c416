// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Job` trait: a user-defined work unit.
//!
//! A work unit is modeled as a record of optional lifecycle hooks with one
//! mandatory hook (`run`), rather than a class hierarchy a host language
//! would use for duck-typed dispatch — this crate is used across a process
//! boundary by a statically compiled binary, so there's no need (and no
//! safe way) to walk a user object's fields generically. Each hook gets a
//! default no-op implementation; only `run` must be overridden.

use crate::config::ProcessConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error as StdError;

/// Boxed dynamic error returned from a lifecycle hook.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A user-defined unit of work run inside an isolated worker process.
///
/// Implementors provide state (`Self`) that is serialized once to start
/// the worker and deserialized inside it; `Output` is the serialized
/// result handed back through the result queue.
pub trait Job: Serialize + DeserializeOwned + Send + 'static {
    /// The value produced by a successful run, sent back to the parent.
    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Process configuration for this work unit (runs/lives/timeouts).
    ///
    /// Read once by the engine before entering `PreRun`; later mutation
    /// from inside the worker has no effect on the running lifecycle.
    fn config(&self) -> ProcessConfig {
        ProcessConfig::default()
    }

    /// Runs once per iteration, before `run`. Defaults to a no-op.
    fn prerun(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// The mandatory section. Mutates `self` in place.
    fn run(&mut self) -> Result<(), BoxError>;

    /// Runs once per iteration, after `run`. Defaults to a no-op.
    ///
    /// Whether the engine loops back to `prerun` or proceeds to
    /// `onfinish` is decided by the stop conditions (stop signal, `runs`,
    /// `join_in`), not by this hook's return value.
    fn postrun(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs exactly once on the success path, producing the final result.
    fn onfinish(&mut self) -> Result<Self::Output, BoxError>;

    /// Runs exactly once on the error path, after lives are exhausted or a
    /// terminal-section failure occurred. Defaults to propagating the
    /// original cause: implementors that want to recover and still
    /// produce an `Output` should override this.
    fn error(&mut self, cause: BoxError) -> Result<Self::Output, BoxError> {
        Err(cause)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
