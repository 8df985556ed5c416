// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The section timer facade (spec.md §2, §3).
//!
//! The engine times each lifecycle section with a [`SectionTimer`] and
//! keeps one per [`Section`] plus an aggregate `full_run` timer in a
//! [`TimerSet`]. A section that fails must not contribute a sample —
//! its in-flight measurement is [`SectionTimer::discard`]ed rather than
//! stopped.
//!
//! Timers work in [`Instant`] rather than against the [`Clock`] trait
//! directly, so callers pass `clock.now()` in — keeping the timer itself
//! independent of which clock implementation is driving the engine.

use crate::section::Section;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Summary statistics over every completed sample a timer has recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerSummary {
    pub count: u64,
    pub total: Duration,
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl TimerSummary {
    fn empty() -> Self {
        Self { count: 0, total: Duration::ZERO, mean: Duration::ZERO, min: Duration::ZERO, max: Duration::ZERO }
    }
}

/// Timer for one section. Holds completed samples plus an optional
/// in-flight start instant.
///
/// Not `Clone`: an in-flight timer has at most one owner (the engine's
/// current iteration), matching spec.md's "opaque interface the engine
/// uses to time sections" — nothing else should be able to fork a
/// running measurement.
#[derive(Debug, Default)]
pub struct SectionTimer {
    samples: Vec<Duration>,
    running_since: Option<Instant>,
}

impl SectionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin timing at `now`. Calling `start` while already running
    /// restarts the measurement, discarding the prior in-flight start.
    pub fn start(&mut self, now: Instant) {
        self.running_since = Some(now);
    }

    /// Stop the in-flight measurement as of `now` and record it as a
    /// completed sample. No-op if the timer was not running.
    pub fn stop(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.samples.push(now.saturating_duration_since(since));
        }
    }

    /// Abandon the in-flight measurement without recording a sample.
    ///
    /// Used when the timed section failed: spec.md's invariant that a
    /// failed section must not contribute a sample to its timer.
    pub fn discard(&mut self) {
        self.running_since = None;
    }

    /// Add an externally-measured duration directly as a completed sample,
    /// without an in-flight start/stop pair.
    pub fn add_time(&mut self, elapsed: Duration) {
        self.samples.push(elapsed);
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn summary(&self) -> TimerSummary {
        if self.samples.is_empty() {
            return TimerSummary::empty();
        }
        let count = self.samples.len() as u64;
        let total: Duration = self.samples.iter().sum();
        let mean = total / count as u32;
        #[allow(clippy::expect_used)]
        let min = *self.samples.iter().min().expect("samples checked non-empty above");
        #[allow(clippy::expect_used)]
        let max = *self.samples.iter().max().expect("samples checked non-empty above");
        TimerSummary { count, total, mean, min, max }
    }
}

/// One [`SectionTimer`] per lifecycle section, plus an aggregate timer for
/// the full prerun+run+postrun iteration (spec.md §3 "Section Timers").
#[derive(Debug)]
pub struct TimerSet {
    per_section: HashMap<Section, SectionTimer>,
    full_run: SectionTimer,
}

impl Default for TimerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSet {
    pub fn new() -> Self {
        let mut per_section = HashMap::new();
        for section in [
            Section::PreRun,
            Section::Run,
            Section::PostRun,
            Section::OnFinish,
            Section::Result,
            Section::Error,
        ] {
            per_section.insert(section, SectionTimer::new());
        }
        Self { per_section, full_run: SectionTimer::new() }
    }

    pub fn section(&mut self, section: Section) -> &mut SectionTimer {
        self.per_section
            .entry(section)
            .or_insert_with(SectionTimer::new)
    }

    pub fn full_run(&mut self) -> &mut SectionTimer {
        &mut self.full_run
    }

    pub fn summary_for(&self, section: Section) -> TimerSummary {
        self.per_section.get(&section).map(SectionTimer::summary).unwrap_or_else(TimerSummary::empty)
    }

    pub fn full_run_summary(&self) -> TimerSummary {
        self.full_run.summary()
    }

    /// All summaries keyed by section name, plus `"full_run"`, ready to
    /// embed in the wire envelope's `timers` field.
    pub fn snapshot(&self) -> HashMap<String, TimerSummary> {
        let mut out: HashMap<String, TimerSummary> = self
            .per_section
            .iter()
            .map(|(section, timer)| (section.to_string(), timer.summary()))
            .collect();
        out.insert("full_run".to_string(), self.full_run.summary());
        out
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
