// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::section::Section;
use std::time::Duration;

#[test]
fn defaults_are_unbounded_runs_one_life() {
    let cfg = ProcessConfig::default();
    assert_eq!(cfg.runs(), RunLimit::Unbounded);
    assert_eq!(cfg.lives(), 1);
    assert!(!cfg.is_locked());
}

#[test]
fn builder_rejects_zero_runs() {
    assert!(matches!(
        ProcessConfig::builder().runs(0),
        Err(ConfigError::InvalidRuns(0))
    ));
}

#[test]
fn builder_rejects_zero_lives() {
    assert!(matches!(
        ProcessConfig::builder().lives(0),
        Err(ConfigError::InvalidLives(0))
    ));
}

#[test]
fn builder_rejects_zero_timeout() {
    assert!(matches!(
        ProcessConfig::builder().timeout(Section::Run, Duration::ZERO),
        Err(ConfigError::InvalidTimeout(Section::Run))
    ));
}

#[test]
fn builder_builds_expected_config() {
    let cfg = ProcessConfig::builder()
        .runs(3)
        .unwrap()
        .lives(2)
        .unwrap()
        .timeout(Section::PreRun, Duration::from_millis(100))
        .unwrap()
        .build();
    assert_eq!(cfg.runs(), RunLimit::Bounded(3));
    assert_eq!(cfg.lives(), 2);
    assert_eq!(cfg.timeout_for(Section::PreRun), Some(Duration::from_millis(100)));
    assert_eq!(cfg.timeout_for(Section::Run), None);
}

#[test]
fn mutation_before_start_is_permitted() {
    let mut cfg = ProcessConfig::default();
    assert!(cfg.set_lives(5).is_ok());
    assert_eq!(cfg.lives(), 5);
}

#[test]
fn mutation_after_lock_is_rejected() {
    let mut cfg = ProcessConfig::default();
    cfg.lock();
    assert_eq!(cfg.set_lives(5), Err(ConfigError::MutationAfterStart));
    assert_eq!(
        cfg.set_runs(RunLimit::Bounded(3)),
        Err(ConfigError::MutationAfterStart)
    );
    assert_eq!(
        cfg.set_timeout(Section::Run, Duration::from_secs(1)),
        Err(ConfigError::MutationAfterStart)
    );
}

#[test]
fn run_limit_is_reached() {
    assert!(!RunLimit::Unbounded.is_reached(1_000_000));
    assert!(RunLimit::Bounded(3).is_reached(3));
    assert!(RunLimit::Bounded(3).is_reached(4));
    assert!(!RunLimit::Bounded(3).is_reached(2));
}

#[test]
fn lock_is_idempotent() {
    let mut cfg = ProcessConfig::default();
    cfg.lock();
    cfg.lock();
    assert!(cfg.is_locked());
}
