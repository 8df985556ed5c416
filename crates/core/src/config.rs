// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration for a work unit's lifecycle.

use crate::section::Section;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of lifecycle iterations, or no limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunLimit {
    Bounded(u32),
    Unbounded,
}

impl RunLimit {
    pub fn is_reached(self, current_run: u32) -> bool {
        match self {
            RunLimit::Bounded(max) => current_run >= max,
            RunLimit::Unbounded => false,
        }
    }
}

/// Maximum wall-clock budget for a worker's lifetime, or no limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JoinBudget {
    Bounded(Duration),
    Unbounded,
}

/// Errors raised when building or mutating a [`ProcessConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("runs must be a positive integer or unbounded, got {0}")]
    InvalidRuns(u32),
    #[error("lives must be >= 1, got {0}")]
    InvalidLives(u32),
    #[error("timeout for section {0} must be a positive duration")]
    InvalidTimeout(Section),
    #[error("process config cannot be mutated after the worker has started")]
    MutationAfterStart,
}

/// Configuration governing one work unit's process lifecycle.
///
/// Mutable only until the owning [`ProcessConfig::lock`] call is made,
/// which the worker handle invokes the moment `start()` is called
/// (spec.md §3 "may only be mutated during construction of the Work Unit").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    runs: RunLimit,
    join_in: JoinBudget,
    lives: u32,
    timeouts: HashMap<Section, Duration>,
    #[serde(skip, default)]
    locked: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            runs: RunLimit::Unbounded,
            join_in: JoinBudget::Unbounded,
            lives: 1,
            timeouts: HashMap::new(),
            locked: false,
        }
    }
}

impl ProcessConfig {
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder::default()
    }

    pub fn runs(&self) -> RunLimit {
        self.runs
    }

    pub fn join_in(&self) -> JoinBudget {
        self.join_in
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn timeout_for(&self, section: Section) -> Option<Duration> {
        self.timeouts.get(&section).copied()
    }

    /// Called by the worker handle at `start()`. Idempotent.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Set the max iteration count after construction.
    ///
    /// Rejected once the config is locked (spec.md §3 invariant).
    pub fn set_runs(&mut self, runs: RunLimit) -> Result<(), ConfigError> {
        self.reject_if_locked()?;
        self.runs = runs;
        Ok(())
    }

    pub fn set_lives(&mut self, lives: u32) -> Result<(), ConfigError> {
        self.reject_if_locked()?;
        if lives == 0 {
            return Err(ConfigError::InvalidLives(lives));
        }
        self.lives = lives;
        Ok(())
    }

    pub fn set_timeout(
        &mut self,
        section: Section,
        timeout: Duration,
    ) -> Result<(), ConfigError> {
        self.reject_if_locked()?;
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(section));
        }
        self.timeouts.insert(section, timeout);
        Ok(())
    }

    fn reject_if_locked(&self) -> Result<(), ConfigError> {
        if self.locked {
            return Err(ConfigError::MutationAfterStart);
        }
        Ok(())
    }
}

/// Builder for [`ProcessConfig`], used at work-unit construction time.
#[derive(Debug, Default)]
pub struct ProcessConfigBuilder {
    runs: RunLimit2,
    join_in: JoinBudget2,
    lives: Option<u32>,
    timeouts: HashMap<Section, Duration>,
}

// Small internal helpers so the builder can distinguish "not yet set" (use
// the default) from an explicit choice, without making `RunLimit`/`JoinBudget`
// themselves carry an `Unset` variant that would leak into the public API.
#[derive(Default)]
enum RunLimit2 {
    #[default]
    Default,
    Explicit(RunLimit),
}

#[derive(Default)]
enum JoinBudget2 {
    #[default]
    Default,
    Explicit(JoinBudget),
}

impl ProcessConfigBuilder {
    pub fn runs(mut self, runs: u32) -> Result<Self, ConfigError> {
        if runs == 0 {
            return Err(ConfigError::InvalidRuns(runs));
        }
        self.runs = RunLimit2::Explicit(RunLimit::Bounded(runs));
        Ok(self)
    }

    pub fn unbounded_runs(mut self) -> Self {
        self.runs = RunLimit2::Explicit(RunLimit::Unbounded);
        self
    }

    pub fn join_in(mut self, budget: Duration) -> Self {
        self.join_in = JoinBudget2::Explicit(JoinBudget::Bounded(budget));
        self
    }

    pub fn lives(mut self, lives: u32) -> Result<Self, ConfigError> {
        if lives == 0 {
            return Err(ConfigError::InvalidLives(lives));
        }
        self.lives = Some(lives);
        Ok(self)
    }

    pub fn timeout(mut self, section: Section, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(section));
        }
        self.timeouts.insert(section, timeout);
        Ok(self)
    }

    pub fn build(self) -> ProcessConfig {
        let defaults = ProcessConfig::default();
        ProcessConfig {
            runs: match self.runs {
                RunLimit2::Default => defaults.runs,
                RunLimit2::Explicit(r) => r,
            },
            join_in: match self.join_in {
                JoinBudget2::Default => defaults.join_in,
                JoinBudget2::Explicit(j) => j,
            },
            lives: self.lives.unwrap_or(defaults.lives),
            timeouts: self.timeouts,
            locked: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
