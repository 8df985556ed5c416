// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-worker lifecycle state machine (C3, spec.md §4.1).
//!
//! ```text
//!  ENTER → PRERUN →(ok)→ RUN →(ok)→ POSTRUN →(ok, continue)→ PRERUN
//!                                                  (ok, stop)→ ONFINISH
//!    any section raises → CRASH → (lives-1 ≥ 1)? PRERUN : ONFINISH(error-path)
//!  ONFINISH →(success path)→ RESULT → SEND result → EXIT
//!  ONFINISH →(error path)→ ERROR  → SEND error  → EXIT
//! ```

use labor_core::config::{JoinBudget, ProcessConfig, RunLimit};
use labor_core::error::{CauseText, ProcessError};
use labor_core::job::{BoxError, Job};
use labor_core::section::Section;
use labor_core::timer::TimerSet;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Outcome of running a work unit's full lifecycle to completion.
pub enum LifecycleOutcome<T> {
    Success(T),
    Failure(ProcessError),
}

/// A reason the lifecycle should stop iterating and move to `onfinish`,
/// evaluated at the top of every iteration per spec.md §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Signal,
    RunsExhausted,
    JoinInExceeded,
}

fn stop_condition(
    stop_signal: bool,
    config: &ProcessConfig,
    current_run: u32,
    started_at: Instant,
) -> Option<StopReason> {
    if stop_signal {
        return Some(StopReason::Signal);
    }
    if config.runs().is_reached(current_run) {
        return Some(StopReason::RunsExhausted);
    }
    if let JoinBudget::Bounded(budget) = config.join_in() {
        if started_at.elapsed() >= budget {
            return Some(StopReason::JoinInExceeded);
        }
    }
    None
}

/// Drive `job` through its full lifecycle, returning either the decoded
/// success value or the terminal [`ProcessError`].
///
/// `stop_signal` is polled at the top of every iteration (spec.md §4.1
/// stop condition (a)); callers pass a closure so the signal source
/// (an atomic flag, a `tokio::sync::Notify`, ...) stays up to the caller.
#[instrument(skip(job, timers, stop_signal), fields(section = tracing::field::Empty))]
pub async fn run_lifecycle<J, S>(
    job: &mut J,
    timers: &mut TimerSet,
    mut stop_signal: S,
) -> LifecycleOutcome<J::Output>
where
    J: Job,
    S: FnMut() -> bool,
{
    let config = job.config();
    let started_at = Instant::now();
    // `current_run` counts completed prerun+run+postrun iterations —
    // exactly what `runs` bounds (spec.md §3 "Process Config") and what
    // spec.md's retry semantics (§4.1 "preserve ... `current_run`") and
    // Testable Property #3 require: a same-iteration retry must leave it
    // unchanged. It only advances on the `Ok` arm below; a failed attempt
    // is retried at the same `attempt_run` until it succeeds or lives run
    // out, never bumping this counter in between.
    let mut current_run: u32 = 0;
    let mut lives_remaining = config.lives();

    loop {
        if let Some(reason) = stop_condition(stop_signal(), &config, current_run, started_at) {
            info!(?reason, current_run, "stop condition reached, transitioning to onfinish");
            return finish(job, timers, current_run, None).await;
        }

        let attempt_run = current_run + 1;
        let iteration_started = Instant::now();
        let iteration_result = run_iteration(job, &config, timers, attempt_run).await;

        match iteration_result {
            Ok(()) => {
                current_run = attempt_run;
                timers.full_run().add_time(iteration_started.elapsed());
            }
            Err(err) => {
                if lives_remaining > 1 {
                    lives_remaining -= 1;
                    warn!(
                        attempt_run,
                        lives_remaining,
                        error = %err,
                        "retryable section failed, restarting at prerun"
                    );
                    continue;
                }
                warn!(attempt_run, error = %err, "lives exhausted, transitioning to onfinish error path");
                return finish(job, timers, attempt_run, Some(err)).await;
            }
        }
    }
}

/// One PRERUN → RUN → POSTRUN pass.
async fn run_iteration<J: Job>(
    job: &mut J,
    config: &ProcessConfig,
    timers: &mut TimerSet,
    current_run: u32,
) -> Result<(), ProcessError> {
    run_hook(job, Section::PreRun, config, timers, current_run, |j| j.prerun()).await?;
    run_hook(job, Section::Run, config, timers, current_run, |j| j.run()).await?;
    run_hook(job, Section::PostRun, config, timers, current_run, |j| j.postrun()).await?;
    Ok(())
}

/// Call one of `Job`'s synchronous hooks, honoring its configured
/// timeout if any.
///
/// The hook closure receives `&mut J` rather than consuming it: each
/// call completes (or times out) before the next begins, so `job` is
/// never concurrently accessed.
async fn run_hook<J, F>(
    job: &mut J,
    section: Section,
    config: &ProcessConfig,
    timers: &mut TimerSet,
    current_run: u32,
    hook: F,
) -> Result<(), ProcessError>
where
    J: Job,
    F: FnOnce(&mut J) -> Result<(), BoxError>,
{
    // A worker process runs exactly one job, so blocking its single task
    // for the duration of a hook costs nothing a re-exec'd process wasn't
    // already going to spend. Timeout enforcement is therefore
    // detection-only: the elapsed time is checked once the hook returns,
    // never preemptive — spec.md §5 acknowledges this limitation for any
    // host that can't interrupt synchronous user code without `unsafe`.
    let timeout = config.timeout_for(section);
    timers.section(section).start(Instant::now());

    let deadline = timeout.map(|t| Instant::now() + t);
    let result = hook(job);
    let timed_out = deadline.is_some_and(|d| Instant::now() >= d);

    if timed_out {
        timers.section(section).discard();
        return Err(ProcessError::timeout(section, timeout.unwrap_or_default(), current_run));
    }

    match result {
        Ok(()) => {
            timers.section(section).stop(Instant::now());
            Ok(())
        }
        Err(cause) => {
            timers.section(section).discard();
            Err(ProcessError::for_retryable_section(
                section,
                current_run,
                CauseText::from_std(cause.as_ref()),
            ))
        }
    }
}

async fn finish<J: Job>(
    job: &mut J,
    timers: &mut TimerSet,
    current_run: u32,
    crash: Option<ProcessError>,
) -> LifecycleOutcome<J::Output> {
    match crash {
        None => {
            timers.section(Section::OnFinish).start(Instant::now());
            match job.onfinish() {
                Ok(value) => {
                    timers.section(Section::OnFinish).stop(Instant::now());
                    LifecycleOutcome::Success(value)
                }
                Err(cause) => {
                    timers.section(Section::OnFinish).discard();
                    LifecycleOutcome::Failure(ProcessError::OnFinish {
                        current_run,
                        cause: CauseText::from_std(cause.as_ref()),
                    })
                }
            }
        }
        Some(err) => {
            timers.section(Section::Error).start(Instant::now());
            match job.error(Box::new(ProcessErrorAsStd(err.clone()))) {
                Ok(value) => {
                    timers.section(Section::Error).stop(Instant::now());
                    LifecycleOutcome::Success(value)
                }
                Err(_recovery_failed) => {
                    timers.section(Section::Error).discard();
                    LifecycleOutcome::Failure(err)
                }
            }
        }
    }
}

/// Adapts a [`ProcessError`] to `std::error::Error` so it can be handed
/// to [`Job::error`], which takes a [`BoxError`].
#[derive(Debug)]
struct ProcessErrorAsStd(ProcessError);

impl std::fmt::Display for ProcessErrorAsStd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ProcessErrorAsStd {}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
