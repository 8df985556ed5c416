// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn fresh_timer_summary_is_zeroed() {
    let timer = SectionTimer::new();
    let summary = timer.summary();
    assert_eq!(summary.count, 0);
    assert_eq!(summary.total, Duration::ZERO);
}

#[test]
fn start_stop_records_one_sample() {
    let mut timer = SectionTimer::new();
    let t0 = Instant::now();
    timer.start(t0);
    assert!(timer.is_running());
    timer.stop(t0 + Duration::from_millis(50));
    assert!(!timer.is_running());

    let summary = timer.summary();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.total, Duration::from_millis(50));
    assert_eq!(summary.mean, Duration::from_millis(50));
    assert_eq!(summary.min, Duration::from_millis(50));
    assert_eq!(summary.max, Duration::from_millis(50));
}

#[test]
fn discard_drops_in_flight_measurement() {
    let mut timer = SectionTimer::new();
    timer.start(Instant::now());
    timer.discard();
    assert!(!timer.is_running());
    assert_eq!(timer.summary().count, 0);
}

#[test]
fn stop_without_start_is_a_noop() {
    let mut timer = SectionTimer::new();
    timer.stop(Instant::now());
    assert_eq!(timer.summary().count, 0);
}

#[test]
fn summary_aggregates_multiple_samples() {
    let mut timer = SectionTimer::new();
    timer.add_time(Duration::from_millis(10));
    timer.add_time(Duration::from_millis(30));
    timer.add_time(Duration::from_millis(20));

    let summary = timer.summary();
    assert_eq!(summary.count, 3);
    assert_eq!(summary.total, Duration::from_millis(60));
    assert_eq!(summary.mean, Duration::from_millis(20));
    assert_eq!(summary.min, Duration::from_millis(10));
    assert_eq!(summary.max, Duration::from_millis(30));
}

#[test]
fn restarting_a_running_timer_discards_the_prior_start() {
    let mut timer = SectionTimer::new();
    let t0 = Instant::now();
    timer.start(t0);
    timer.start(t0 + Duration::from_millis(100));
    timer.stop(t0 + Duration::from_millis(110));

    let summary = timer.summary();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.total, Duration::from_millis(10));
}

#[test]
fn timer_set_has_an_entry_for_every_section_and_full_run() {
    let mut set = TimerSet::new();
    for section in [
        Section::PreRun,
        Section::Run,
        Section::PostRun,
        Section::OnFinish,
        Section::Result,
        Section::Error,
    ] {
        assert_eq!(set.summary_for(section).count, 0);
    }
    assert_eq!(set.full_run_summary().count, 0);
    set.section(Section::Run).add_time(Duration::from_millis(5));
    assert_eq!(set.summary_for(Section::Run).count, 1);
}

#[test]
fn failed_section_does_not_contribute_a_sample() {
    let mut set = TimerSet::new();
    let timer = set.section(Section::PreRun);
    timer.start(Instant::now());
    timer.discard();
    assert_eq!(set.summary_for(Section::PreRun).count, 0);
}

#[test]
fn snapshot_includes_full_run_key() {
    let mut set = TimerSet::new();
    set.full_run().add_time(Duration::from_millis(42));
    let snapshot = set.snapshot();
    assert_eq!(snapshot.get("full_run").unwrap().total, Duration::from_millis(42));
    assert!(snapshot.contains_key("run"));
    assert!(snapshot.contains_key("prerun"));
}
