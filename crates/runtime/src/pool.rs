// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Pool Dispatcher (C5, spec.md §4.3).
//!
//! Fans a list of inputs out over a bounded number of concurrent
//! workers using a [`tokio::sync::Semaphore`] for the concurrency cap
//! and a [`tokio::task::JoinSet`] to recover results either in input
//! order (`map`/`imap`) or completion order (`unordered_map`/
//! `unordered_imap`) — the same semaphore-gated spawn shape the pack's
//! worker-pool examples use, generalized from a fixed background-task
//! pool to an arbitrary per-call item list.
//!
//! "Work unit or plain callable" polymorphism (spec.md §4.3) isn't
//! special-cased here: callers pass an `async fn(I) -> Result<O,
//! PoolError>` either way, whether its body is a pure computation or a
//! `WorkerHandle::run(constructed_job).await`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("star() input is not a sequence: {0}")]
    NotASequence(serde_json::Value),
    #[error("failed to encode a star() argument: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Worker(#[from] labor_core::error::ProcessError),
    #[error("pool worker task panicked: {0}")]
    WorkerPanicked(String),
}

/// Bridges a statically-typed tuple or a dynamic `serde_json::Value`
/// array into the positional-argument list `star()` dispatch passes to
/// the work function (spec.md §4.3 `star` modifier, Testable Property
/// #8). A non-array `Value` is rejected with [`PoolError::NotASequence`]
/// — tuples can't fail this check, the compiler already guarantees
/// their arity.
pub trait StarItem {
    fn into_args(self) -> Result<Vec<serde_json::Value>, PoolError>;
}

impl StarItem for serde_json::Value {
    fn into_args(self) -> Result<Vec<serde_json::Value>, PoolError> {
        match self {
            serde_json::Value::Array(items) => Ok(items),
            other => Err(PoolError::NotASequence(other)),
        }
    }
}

macro_rules! impl_star_item_for_tuple {
    ($($t:ident),+) => {
        impl<$($t: Serialize),+> StarItem for ($($t,)+) {
            fn into_args(self) -> Result<Vec<serde_json::Value>, PoolError> {
                #[allow(non_snake_case)]
                let ($($t,)+) = self;
                Ok(vec![$(serde_json::to_value($t).map_err(PoolError::Serialize)?),+])
            }
        }
    };
}

impl_star_item_for_tuple!(A, B);
impl_star_item_for_tuple!(A, B, C);
impl_star_item_for_tuple!(A, B, C, D);

struct Indexed<O> {
    index: usize,
    result: Result<O, PoolError>,
}

/// An incremental result stream returned by [`Pool::imap`] /
/// [`Pool::unordered_imap`] (spec.md §4.3 "Incremental? yes").
pub struct PoolStream<O> {
    rx: mpsc::Receiver<Result<O, PoolError>>,
}

impl<O> PoolStream<O> {
    pub async fn next(&mut self) -> Option<Result<O, PoolError>> {
        self.rx.recv().await
    }
}

/// A bounded set of concurrent workers dispatching over an input list.
#[derive(Debug, Clone, Copy)]
pub struct Pool {
    workers: usize,
}

impl Pool {
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    /// A platform-reasonable worker count (spec.md §4.3 `workers`
    /// default), used by [`Pool::default`].
    pub fn default_workers() -> usize {
        std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(1)
    }

    async fn spawn_indexed<I, O, F, Fut>(&self, f: Arc<F>, items: Vec<I>) -> JoinSet<Indexed<O>>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut set = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let f = f.clone();
            set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => f(item).await,
                    Err(_) => Err(PoolError::WorkerPanicked("pool semaphore closed".into())),
                };
                Indexed { index, result }
            });
        }
        set
    }

    /// Blocking, input order (spec.md §4.3 `map`; Testable Property #7).
    /// On the first failure in input-order position, returns that error;
    /// other already-spawned items keep running to completion in the
    /// background rather than being cancelled (spec.md §4.3 failure
    /// policy: "MUST NOT drop silently").
    pub async fn map<I, O, F, Fut>(&self, f: F, items: Vec<I>) -> Result<Vec<O>, PoolError>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        let mut all = drain_indexed(self.spawn_indexed(Arc::new(f), items).await).await;
        all.sort_by_key(|indexed| indexed.index);
        all.into_iter().map(|indexed| indexed.result).collect()
    }

    /// Blocking, completion order (spec.md §4.3 `unordered_map`). On
    /// the first failure pulled off in completion order, returns that
    /// error.
    pub async fn unordered_map<I, O, F, Fut>(&self, f: F, items: Vec<I>) -> Result<Vec<O>, PoolError>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        let all = drain_indexed(self.spawn_indexed(Arc::new(f), items).await).await;
        all.into_iter().map(|indexed| indexed.result).collect()
    }

    /// Streaming, input order (spec.md §4.3 `imap`). Out-of-order
    /// completions are buffered until the items ahead of them arrive,
    /// so the stream only ever advances in input order.
    pub fn imap<I, O, F, Fut>(&self, f: F, items: Vec<I>) -> PoolStream<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        let pool = *self;
        let (tx, rx) = mpsc::channel(items.len().max(1));
        tokio::spawn(async move {
            let mut set = pool.spawn_indexed(Arc::new(f), items).await;
            let mut pending: BTreeMap<usize, Result<O, PoolError>> = BTreeMap::new();
            let mut next_index = 0usize;
            while let Some(joined) = set.join_next().await {
                let indexed = match joined {
                    Ok(indexed) => indexed,
                    Err(join_err) => {
                        Indexed { index: next_index, result: Err(PoolError::WorkerPanicked(join_err.to_string())) }
                    }
                };
                pending.insert(indexed.index, indexed.result);
                while let Some(result) = pending.remove(&next_index) {
                    if tx.send(result).await.is_err() {
                        return;
                    }
                    next_index += 1;
                }
            }
        });
        PoolStream { rx }
    }

    /// Streaming, completion order (spec.md §4.3 `unordered_imap`).
    pub fn unordered_imap<I, O, F, Fut>(&self, f: F, items: Vec<I>) -> PoolStream<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        let pool = *self;
        let (tx, rx) = mpsc::channel(items.len().max(1));
        tokio::spawn(async move {
            let mut set = pool.spawn_indexed(Arc::new(f), items).await;
            while let Some(joined) = set.join_next().await {
                let result = match joined {
                    Ok(indexed) => indexed.result,
                    Err(join_err) => Err(PoolError::WorkerPanicked(join_err.to_string())),
                };
                if tx.send(result).await.is_err() {
                    break;
                }
            }
        });
        PoolStream { rx }
    }

    /// `star().map(...)` (spec.md §4.3, Testable Property #8): each
    /// item is unpacked into positional arguments before `f` runs.
    /// Rejects the whole call up front if any item isn't a sequence.
    pub async fn star_map<T, O, F, Fut>(&self, f: F, items: Vec<T>) -> Result<Vec<O>, PoolError>
    where
        T: StarItem + Send + 'static,
        O: Send + 'static,
        F: Fn(Vec<serde_json::Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        self.map(f, unpack_all(items)?).await
    }

    pub async fn star_unordered_map<T, O, F, Fut>(&self, f: F, items: Vec<T>) -> Result<Vec<O>, PoolError>
    where
        T: StarItem + Send + 'static,
        O: Send + 'static,
        F: Fn(Vec<serde_json::Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        self.unordered_map(f, unpack_all(items)?).await
    }

    pub fn star_imap<T, O, F, Fut>(&self, f: F, items: Vec<T>) -> Result<PoolStream<O>, PoolError>
    where
        T: StarItem + Send + 'static,
        O: Send + 'static,
        F: Fn(Vec<serde_json::Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        Ok(self.imap(f, unpack_all(items)?))
    }

    pub fn star_unordered_imap<T, O, F, Fut>(&self, f: F, items: Vec<T>) -> Result<PoolStream<O>, PoolError>
    where
        T: StarItem + Send + 'static,
        O: Send + 'static,
        F: Fn(Vec<serde_json::Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, PoolError>> + Send + 'static,
    {
        Ok(self.unordered_imap(f, unpack_all(items)?))
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(Self::default_workers())
    }
}

fn unpack_all<T: StarItem>(items: Vec<T>) -> Result<Vec<Vec<serde_json::Value>>, PoolError> {
    items.into_iter().map(StarItem::into_args).collect()
}

async fn drain_indexed<O>(mut set: JoinSet<Indexed<O>>) -> Vec<Indexed<O>> {
    let mut all = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(indexed) => all.push(indexed),
            Err(join_err) => all.push(Indexed {
                index: usize::MAX,
                result: Err(PoolError::WorkerPanicked(join_err.to_string())),
            }),
        }
    }
    all
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
