// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Buffers finished execution records and bulk-inserts them into the log
//! store. Ingestion never blocks the scheduler: the handle's `append` is a
//! `try_send`, and a full ingress channel drops the record rather than
//! backing up the dispatch loop.

use std::{sync::Arc, time::Duration};

use chrono::{Duration as ChronoDuration, Utc};
use cronmesh_error::Result;
use cronmesh_logstore::LogStore;
use cronmesh_model::JobLog;
use cronmesh_task::{Task, TaskContext};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::metrics;

pub const LOG_INGRESS_CAPACITY: usize = 1000;

/// Cheap, cloneable sender half handed to the scheduler.
#[derive(Clone)]
pub struct LogSinkHandle {
    tx: mpsc::Sender<JobLog>,
}

impl LogSinkHandle {
    pub fn append(&self, log: JobLog) {
        if self.tx.try_send(log).is_err() {
            metrics::LOG_INGRESS_DROPPED.inc();
            warn!("log ingress channel full, dropping execution record");
        }
    }
}

/// Owns the ingress channel's receive half and the buffering loop. Started
/// once per worker; the returned `JoinHandle` runs for the worker's life.
pub struct LogSink;

impl LogSink {
    #[must_use]
    pub fn start(
        store: Arc<dyn LogStore>,
        batch_size: usize,
        commit_timeout: Duration,
    ) -> (LogSinkHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(LOG_INGRESS_CAPACITY);
        let handle = tokio::spawn(run_loop(store, rx, batch_size.max(1), commit_timeout));
        (LogSinkHandle { tx }, handle)
    }

    /// Synchronously flushes the current batch (best-effort) and stops the
    /// sink. Drops every live sender clone, which closes the ingress
    /// channel and lets `run_loop`'s `None` branch flush what's buffered
    /// before it returns, then waits for that to actually happen. Callers
    /// must have dropped every other clone of the sink's senders first —
    /// otherwise the channel stays open and this waits forever.
    pub async fn stop(handle: LogSinkHandle, join_handle: JoinHandle<()>) {
        drop(handle);
        if let Err(err) = join_handle.await {
            tracing::warn!(%err, "log sink task panicked during shutdown");
        }
    }
}

async fn run_loop(
    store: Arc<dyn LogStore>,
    mut rx: mpsc::Receiver<JobLog>,
    batch_size: usize,
    commit_timeout: Duration,
) {
    let mut buffer = Vec::with_capacity(batch_size);
    let mut ticker = tokio::time::interval(commit_timeout);
    ticker.tick().await;

    loop {
        tokio::select! {
            received = rx.recv() => {
                match received {
                    Some(log) => {
                        buffer.push(log);
                        if buffer.len() >= batch_size {
                            flush(&store, &mut buffer).await;
                        }
                    }
                    None => {
                        flush(&store, &mut buffer).await;
                        return;
                    }
                }
            }
            _ = ticker.tick() => {
                flush(&store, &mut buffer).await;
            }
        }
    }
}

async fn flush(store: &Arc<dyn LogStore>, buffer: &mut Vec<JobLog>) {
    if buffer.is_empty() {
        return;
    }
    let batch = std::mem::take(buffer);
    let count = batch.len();
    if let Err(err) = store.insert_many(batch).await {
        metrics::LOG_FLUSH_FAILURES.inc();
        warn!(%err, count, "failed to flush log batch, discarding");
    }
}

/// Daily sweep dropping log records older than the configured retention
/// window. Runs once at startup (via `on_start`) and again on every firing
/// of its cron trigger.
pub struct RetentionSweep {
    store: Arc<dyn LogStore>,
    retention_days: i64,
}

impl RetentionSweep {
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>, retention_days: i64) -> Self {
        Self { store, retention_days: retention_days.max(1) }
    }

    async fn sweep(&self) -> Result<()> {
        let cutoff = Utc::now() - ChronoDuration::days(self.retention_days);
        let removed = self.store.delete_older_than(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, cutoff = %cutoff, "swept expired job logs");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Task for RetentionSweep {
    async fn on_start(&mut self, _ctx: &TaskContext) -> Result<()> { self.sweep().await }

    async fn work(&mut self, _ctx: &TaskContext) -> Result<()> { self.sweep().await }
}
