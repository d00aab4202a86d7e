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

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use cronmesh_error::Result;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    builder::{TaskBuilder, TriggerNotSet},
    config::TaskManagerConfig,
    context::TaskContext,
    driver::TriggerDriver,
    handle::TaskHandle,
    id::TaskId,
    metrics::{
        TASK_ACTIVE, TASK_ERRORS, TASK_EXECUTIONS, TASK_EXECUTION_DURATION_SECONDS,
        TASK_EXECUTION_ERRORS, TASK_SHUTDOWN_ERRORS, TASK_STARTED, TASK_START_ERRORS, TASK_STOPPED,
    },
    task::Task,
    trigger::Trigger,
};

/// Owns the lifetime of every [`Task`] spawned through it. The master and
/// worker runtimes each hold exactly one: the master's drives nothing today
/// but is kept for symmetry, the worker's drives the heartbeat (register.rs)
/// and the log-sink commit/retention timers (logsink.rs).
pub struct TaskManager {
    cancel_token:     CancellationToken,
    shutdown_timeout: std::time::Duration,
    joins:            JoinSet<Result<()>>,
}

impl TaskManager {
    /// # Errors
    ///
    /// Never actually fails today; returns `Result` so adding fallible setup
    /// later (e.g. validating `config`) does not change the signature.
    pub fn start(config: TaskManagerConfig) -> Result<Self> {
        Ok(TaskManager {
            cancel_token:     CancellationToken::new(),
            shutdown_timeout: config.shutdown_timeout(),
            joins:            JoinSet::new(),
        })
    }

    /// Begins configuring a task. Nothing runs until [`TaskBuilder::spawn`]
    /// is called.
    pub fn task<T>(&mut self, task: T) -> TaskBuilder<'_, T, TriggerNotSet>
    where
        T: Task,
    {
        TaskBuilder::new(self, task)
    }

    pub(crate) fn spawn_task<T>(&mut self, mut task: T, name: &'static str, trigger: Trigger) -> TaskHandle
    where
        T: Task,
    {
        let id = TaskId::new();
        let paused = Arc::new(AtomicBool::new(false));
        let paused_for_task = paused.clone();
        let ctx = TaskContext::new(name, self.cancel_token.child_token());

        let job = async move {
            info!(task = name, "task starting");
            TASK_STARTED.with_label_values(&[name]).inc();
            TASK_ACTIVE.with_label_values(&[name]).set(1);

            if let Err(err) = task.on_start(&ctx).await {
                error!(task = name, %err, "task failed during on_start");
                TASK_START_ERRORS.with_label_values(&[name]).inc();
                TASK_ACTIVE.with_label_values(&[name]).set(0);
                return Err(err);
            }

            let result = Self::run_loop(&mut task, &ctx, &paused_for_task, trigger, name).await;

            if let Err(err) = task.on_shutdown(&ctx).await {
                error!(task = name, %err, "task failed during on_shutdown");
                TASK_SHUTDOWN_ERRORS.with_label_values(&[name]).inc();
            }

            match &result {
                Ok(()) => {
                    info!(task = name, "task stopped");
                    TASK_STOPPED.with_label_values(&[name]).inc();
                }
                Err(err) => {
                    error!(task = name, %err, "task stopped with error");
                    TASK_ERRORS.with_label_values(&[name]).inc();
                }
            }
            TASK_ACTIVE.with_label_values(&[name]).set(0);
            result
        };

        self.joins.spawn(job);
        TaskHandle::new(id, name, paused)
    }

    async fn run_loop<T>(
        task: &mut T,
        ctx: &TaskContext,
        paused: &Arc<AtomicBool>,
        trigger: Trigger,
        name: &'static str,
    ) -> Result<()>
    where
        T: Task,
    {
        let mut driver = TriggerDriver::from_trigger(trigger);
        loop {
            if !driver.wait_next(ctx).await {
                return Ok(());
            }
            if paused.load(Ordering::Acquire) {
                continue;
            }

            let start = std::time::Instant::now();
            match task.work(ctx).await {
                Ok(()) => {
                    TASK_EXECUTIONS.with_label_values(&[name]).inc();
                    TASK_EXECUTION_DURATION_SECONDS
                        .with_label_values(&[name])
                        .observe(start.elapsed().as_secs_f64());
                }
                Err(err) => {
                    TASK_EXECUTION_ERRORS.with_label_values(&[name]).inc();
                    return Err(err);
                }
            }
        }
    }

    /// Cancels every task and waits up to the configured shutdown timeout
    /// for them to finish; anything still running past that is aborted.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("shutting down task manager");
        self.cancel_token.cancel();

        let deadline = tokio::time::Instant::now() + self.shutdown_timeout;
        let mut aborted = 0u32;
        let mut total = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            tokio::select! {
                result = self.joins.join_next() => {
                    match result {
                        Some(Ok(_)) => total += 1,
                        Some(Err(err)) => {
                            total += 1;
                            if err.is_cancelled() {
                                aborted += 1;
                            } else {
                                error!(%err, "join error during shutdown");
                            }
                        }
                        None => break,
                    }
                }
                () = tokio::time::sleep(remaining) => {
                    error!(timeout = ?self.shutdown_timeout, "shutdown timeout reached, aborting remaining tasks");
                    self.joins.abort_all();
                    while let Some(result) = self.joins.join_next().await {
                        total += 1;
                        if let Err(err) = result && err.is_cancelled() {
                            aborted += 1;
                        }
                    }
                    break;
                }
            }
        }

        if aborted > 0 {
            error!(stopped = total - aborted, aborted, "task manager shutdown complete");
        } else {
            info!(stopped = total, "task manager shutdown complete");
        }
        Ok(())
    }
}
