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

//! Wires the worker's components together: [`crate::JobCache`] feeds
//! [`crate::Scheduler`], [`crate::Register`] and the job-cache resync both
//! ride the shared [`TaskManager`], and [`crate::LogSink`] drains whatever
//! the scheduler finishes.

use std::{sync::Arc, time::Duration};

use cronmesh_error::Result;
use cronmesh_executor::Executor;
use cronmesh_kv::KvGateway;
use cronmesh_lock::JobLock;
use cronmesh_logstore::LogStore;
use cronmesh_task::{Task, TaskContext, TaskManager, TaskManagerConfig};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    job_cache::JobCache,
    log_sink::{LogSink, LogSinkHandle},
    register::Register,
    scheduler::Scheduler,
};

/// Daily retention sweep fires at 03:00 local-naive time; the cron engine
/// only understands UTC-agnostic wall-clock fields, so this is whatever
/// timezone the host is configured with.
const RETENTION_SWEEP_CRON: &str = "0 0 3 * * *";

pub struct WorkerRuntimeConfig {
    pub worker_id: String,
    pub heartbeat_interval: Duration,
    pub job_lock_ttl_seconds: i64,
    pub job_event_capacity: usize,
    pub job_cache_resync_interval: Duration,
    pub log_batch_size: usize,
    pub log_commit_timeout: Duration,
    pub log_retention_days: i64,
}

/// Owns every background task and channel a worker process runs. Dropping
/// it leaks the spawned tasks; call [`WorkerRuntime::shutdown`] instead.
pub struct WorkerRuntime {
    tasks: TaskManager,
    cancel: CancellationToken,
    job_cache_handle: JoinHandle<()>,
    log_sink: LogSinkHandle,
    log_sink_handle: JoinHandle<()>,
    scheduler_handle: JoinHandle<Result<()>>,
}

impl WorkerRuntime {
    pub async fn start(
        kv: Arc<dyn KvGateway>,
        log_store: Arc<dyn LogStore>,
        config: WorkerRuntimeConfig,
    ) -> Result<Self> {
        let mut tasks = TaskManager::start(TaskManagerConfig::default())?;

        let register = Register::new(kv.clone(), config.worker_id.clone(), config.heartbeat_interval);
        tasks.task(register).name("worker-register").interval(config.heartbeat_interval).spawn();

        let (job_cache, events_rx, job_cache_handle) =
            JobCache::start(kv.clone(), config.job_event_capacity).await?;

        tasks
            .task(ResyncTask(job_cache.clone()))
            .name("job-cache-resync")
            .interval(config.job_cache_resync_interval)
            .spawn();

        let (logs, log_sink_handle) =
            LogSink::start(log_store.clone(), config.log_batch_size, config.log_commit_timeout);

        let retention = crate::log_sink::RetentionSweep::new(log_store, config.log_retention_days);
        tasks
            .task(retention)
            .name("log-retention-sweep")
            .cron(RETENTION_SWEEP_CRON)
            .map_err(|err| {
                cronmesh_error::FatalSnafu { reason: format!("invalid retention sweep schedule: {err}") }
                    .build()
            })?
            .spawn();

        let (results_tx, results_rx) = mpsc::channel(cronmesh_executor::RESULT_CHANNEL_CAPACITY);
        let executor = Arc::new(Executor::new(results_tx));
        let job_lock = Arc::new(JobLock::new(kv.clone(), config.job_lock_ttl_seconds));

        let scheduler = Scheduler::new(kv, executor, job_lock, logs.clone(), config.worker_id);
        let cancel = CancellationToken::new();
        let scheduler_handle = tokio::spawn(scheduler.run(events_rx, results_rx, cancel.clone()));

        Ok(Self { tasks, cancel, job_cache_handle, log_sink: logs, log_sink_handle, scheduler_handle })
    }

    /// Stops the dispatch loop, drains the task manager, and waits for the
    /// log sink to flush its final batch before exiting.
    ///
    /// The scheduler holds the other live clone of the log sink's sender; it
    /// is dropped when `scheduler_handle` completes, so awaiting it first is
    /// what lets [`LogSink::stop`] actually close the ingress channel below
    /// rather than hang waiting on a sender this runtime doesn't own.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        if let Err(err) = self.scheduler_handle.await {
            error!(%err, "scheduler task panicked during shutdown");
        }
        self.job_cache_handle.abort();
        LogSink::stop(self.log_sink, self.log_sink_handle).await;
        self.tasks.shutdown().await
    }
}

struct ResyncTask(JobCache);

#[async_trait::async_trait]
impl Task for ResyncTask {
    async fn work(&mut self, _ctx: &TaskContext) -> Result<()> { self.0.resync().await }
}
