// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process error taxonomy (spec.md §4.7, §7).
//!
//! Every failure the engine surfaces across the process boundary is one
//! of these variants. `section` and `current_run` are preserved exactly
//! once across serialization so the parent can re-raise the structured
//! wrapper intact (spec.md §4.7 "Propagation rule").

use crate::section::Section;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A lifecycle section failed with a user-supplied cause.
///
/// The original `std::error::Error` cause can't cross the process
/// boundary as a trait object, so it is flattened to its `Display`
/// text (and, where available, its source chain) at the point the
/// worker serializes the error message — matching spec.md's "traceback
/// preserved as an opaque field".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CauseText {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_chain: Vec<String>,
}

impl CauseText {
    pub fn from_std(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut source_chain = Vec::new();
        let mut cur = err.source();
        while let Some(s) = cur {
            source_chain.push(s.to_string());
            cur = s.source();
        }
        Self { message: err.to_string(), source_chain }
    }
}

impl std::fmt::Display for CauseText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Root of the process error hierarchy (spec.md §4.7).
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProcessError {
    #[error("prerun failed at run {current_run}: {cause}")]
    PreRun { current_run: u32, cause: CauseText },

    #[error("run failed at run {current_run}: {cause}")]
    Run { current_run: u32, cause: CauseText },

    #[error("postrun failed at run {current_run}: {cause}")]
    PostRun { current_run: u32, cause: CauseText },

    #[error("onfinish failed at run {current_run}: {cause}")]
    OnFinish { current_run: u32, cause: CauseText },

    #[error("result handler failed at run {current_run}: {cause}")]
    Result { current_run: u32, cause: CauseText },

    #[error("error handler failed at run {current_run}: {cause}")]
    ErrorHandler { current_run: u32, cause: CauseText },

    #[error("section {section} timed out after {timeout_secs:.3}s at run {current_run}")]
    Timeout { section: Section, timeout_secs: f64, current_run: u32 },

    #[error("waiting for a result timed out")]
    ResultTimeout,

    #[error("shared-state coordinator error: {0}")]
    Coordinator(String),

    #[error("pipe endpoint misuse: {0}")]
    Endpoint(String),

    #[error("serialization failed for {type_name} at {path}")]
    Serialization { type_name: String, path: String },

    #[error("deserialization failed at {path}: {cause}")]
    Deserialization { path: String, cause: String },
}

impl ProcessError {
    /// Build the section-scoped wrapper for a given section.
    ///
    /// Panics if `section` is `Result`/`Error` and the caller meant to use
    /// a different constructor — callers should match on `Section` and
    /// route `OnFinish`/`Result`/`Error` wrapping explicitly, since those
    /// three fold different hook failures into distinct variants.
    pub fn for_retryable_section(
        section: Section,
        current_run: u32,
        cause: CauseText,
    ) -> Self {
        match section {
            Section::PreRun => ProcessError::PreRun { current_run, cause },
            Section::Run => ProcessError::Run { current_run, cause },
            Section::PostRun => ProcessError::PostRun { current_run, cause },
            Section::OnFinish | Section::Result | Section::Error => {
                unreachable!("{section} is not a retryable section")
            }
        }
    }

    pub fn timeout(section: Section, timeout: Duration, current_run: u32) -> Self {
        ProcessError::Timeout { section, timeout_secs: timeout.as_secs_f64(), current_run }
    }

    /// The section this error originated in, if any (infrastructural
    /// variants like `Coordinator`/`Endpoint` have none).
    pub fn section(&self) -> Option<Section> {
        match self {
            ProcessError::PreRun { .. } => Some(Section::PreRun),
            ProcessError::Run { .. } => Some(Section::Run),
            ProcessError::PostRun { .. } => Some(Section::PostRun),
            ProcessError::OnFinish { .. } => Some(Section::OnFinish),
            ProcessError::Result { .. } => Some(Section::Result),
            ProcessError::ErrorHandler { .. } => Some(Section::Error),
            ProcessError::Timeout { section, .. } => Some(*section),
            _ => None,
        }
    }

    pub fn current_run(&self) -> Option<u32> {
        match self {
            ProcessError::PreRun { current_run, .. }
            | ProcessError::Run { current_run, .. }
            | ProcessError::PostRun { current_run, .. }
            | ProcessError::OnFinish { current_run, .. }
            | ProcessError::Result { current_run, .. }
            | ProcessError::ErrorHandler { current_run, .. }
            | ProcessError::Timeout { current_run, .. } => Some(*current_run),
            _ => None,
        }
    }

    /// Whether a failure in this error's section is retried when lives remain.
    pub fn is_retryable(&self) -> bool {
        self.section().map(|s| !s.is_terminal_on_failure()).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
