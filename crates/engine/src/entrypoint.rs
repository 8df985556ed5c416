// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker process entrypoint (spec.md §2 "the process entrypoint a
//! host binary calls into").
//!
//! A host binary that re-execs itself as a worker (see `labor-adapters`)
//! calls [`run_worker_entrypoint`] once stdin/stdout are the framed pipes
//! wired to the parent's `labor-runtime::WorkerHandle`. It reads the
//! serialized work unit as the first framed message on stdin, runs the
//! autoreconnect adapter (C8), drives the lifecycle state machine (C3),
//! and writes exactly one terminal `result`/`error` envelope to stdout
//! before returning — spec.md §4.1 "Result transmission".

use crate::context::WorkerIo;
use crate::lifecycle::{run_lifecycle, LifecycleOutcome};
use crate::reconnect::{Reconnectable, ReconnectRegistry};
use labor_core::error::{CauseText, ProcessError};
use labor_core::job::Job;
use labor_core::timer::TimerSet;
use labor_wire::{Envelope, FrameKind, ProtocolError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

/// Run one work unit's full lifecycle against framed stdin/stdout streams.
///
/// `stdin` carries exactly one raw (non-enveloped) frame up front — the
/// serialized `J` — followed by zero or more `Tell`/`Stop` envelopes.
/// `stdout` carries zero or more `Listen` envelopes (the job's own
/// `tell()` calls) followed by exactly one terminal `Result`/`Error`
/// envelope.
#[instrument(skip(stdin, stdout, registry))]
pub async fn run_worker_entrypoint<J, R, W>(
    mut stdin: R,
    mut stdout: W,
    registry: ReconnectRegistry,
) -> Result<(), ProtocolError>
where
    J: Job + Reconnectable,
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let job_value: serde_json::Value = labor_wire::read_framed(&mut stdin).await?;
    let mut job: J = serde_json::from_value(job_value).map_err(ProtocolError::Decode)?;

    let stop_signal = Arc::new(AtomicBool::new(false));
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Envelope>();
    let (io, inbound_tx) = WorkerIo::new(outbound_tx.clone());
    let io = Arc::new(io);

    // stdin reader: routes `Tell` frames (parent telling the worker) to
    // `listen()` inside job hooks, and `Stop` frames to the cooperative
    // stop flag. Aborted once the result is sent — spec.md §4.1 "cancels
    // feeders on tell_queue and listen_queue ... MUST NOT cancel the
    // result feeder".
    let reader_stop = Arc::clone(&stop_signal);
    let reader = tokio::spawn(async move {
        loop {
            let frame: Envelope = match labor_wire::read_framed(&mut stdin).await {
                Ok(frame) => frame,
                Err(_) => break,
            };
            match frame.kind {
                FrameKind::Tell => {
                    if inbound_tx.send(frame.payload).is_err() {
                        break;
                    }
                }
                FrameKind::Stop => {
                    reader_stop.store(true, Ordering::SeqCst);
                }
                FrameKind::Result | FrameKind::Error | FrameKind::Listen => {
                    // Not valid on this direction; ignore rather than crash the worker.
                }
            }
        }
    });

    // stdout writer: drains every frame the job's `tell()` calls push
    // (the `Listen` queue, from the parent's point of view) plus the
    // final result/error.
    let writer = tokio::spawn(async move {
        while let Some(envelope) = outbound_rx.recv().await {
            if labor_wire::write_framed(&mut stdout, &envelope).await.is_err() {
                break;
            }
        }
    });

    // spec.md §4.6: unresolvable placeholders fail before the first
    // `prerun`, attributed to the prerun section, consuming a life — the
    // same lives-aware retry rule `run_lifecycle` applies to any other
    // prerun failure (spec.md §4.1), not a single unconditional attempt.
    let mut lives_remaining = job.config().lives();
    loop {
        match job.reconnect(&registry) {
            Ok(()) => break,
            Err(cause) if lives_remaining > 1 => {
                lives_remaining -= 1;
                warn!(error = %cause, lives_remaining, "autoreconnect failed before prerun, retrying");
                continue;
            }
            Err(cause) => {
                warn!(error = %cause, "autoreconnect failed before prerun, lives exhausted");
                let process_err = ProcessError::PreRun {
                    current_run: 0,
                    cause: CauseText::from_std(cause.as_ref()),
                };
                send_terminal_error(&outbound_tx, &process_err, &TimerSet::new());
                return finish(reader, writer, outbound_tx).await;
            }
        }
    }

    let mut timers = TimerSet::new();
    let lifecycle = run_lifecycle(&mut job, &mut timers, {
        let stop_signal = Arc::clone(&stop_signal);
        move || stop_signal.load(Ordering::SeqCst)
    });
    let outcome = io.scope(lifecycle).await;

    match outcome {
        LifecycleOutcome::Success(value) => {
            let payload = serde_json::to_value(&value).unwrap_or(serde_json::Value::Null);
            let _ = outbound_tx.send(Envelope::result(payload, timers.snapshot()));
        }
        LifecycleOutcome::Failure(err) => {
            send_terminal_error(&outbound_tx, &err, &timers);
        }
    }

    finish(reader, writer, outbound_tx).await
}

fn send_terminal_error(
    outbound_tx: &mpsc::UnboundedSender<Envelope>,
    err: &ProcessError,
    timers: &TimerSet,
) {
    let payload = serde_json::to_value(err).unwrap_or(serde_json::Value::Null);
    let _ = outbound_tx.send(Envelope::error(payload, timers.snapshot()));
}

async fn finish(
    reader: tokio::task::JoinHandle<()>,
    writer: tokio::task::JoinHandle<()>,
    outbound_tx: mpsc::UnboundedSender<Envelope>,
) -> Result<(), ProtocolError> {
    reader.abort();
    drop(outbound_tx);
    let _ = writer.await;
    info!("worker entrypoint exiting");
    Ok(())
}

#[cfg(test)]
#[path = "entrypoint_tests.rs"]
mod tests;
