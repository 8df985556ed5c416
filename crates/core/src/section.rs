// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle section names.

use serde::{Deserialize, Serialize};

/// One named step of a [`Job`](crate::job::Job)'s lifecycle.
///
/// `Run` is the only section every work unit must implement; the rest
/// default to no-ops (see the `Job` trait). `Result` and `Error` are
/// terminal: a failure there is never retried regardless of lives
/// remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "prerun")]
    PreRun,
    #[serde(rename = "run")]
    Run,
    #[serde(rename = "postrun")]
    PostRun,
    #[serde(rename = "onfinish")]
    OnFinish,
    #[serde(rename = "result")]
    Result,
    #[serde(rename = "error")]
    Error,
}

impl Section {
    /// All sections that are retried when the job has lives remaining.
    pub const RETRYABLE: [Section; 3] = [Section::PreRun, Section::Run, Section::PostRun];

    /// Whether a failure in this section is terminal regardless of `lives`.
    pub fn is_terminal_on_failure(self) -> bool {
        !Self::RETRYABLE.contains(&self)
    }
}

crate::simple_display! {
    Section {
        PreRun => "prerun",
        Run => "run",
        PostRun => "postrun",
        OnFinish => "onfinish",
        Result => "result",
        Error => "error",
    }
}

#[cfg(test)]
#[path = "section_tests.rs"]
mod tests;
