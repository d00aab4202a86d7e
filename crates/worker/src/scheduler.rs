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

//! The worker's dispatch loop: a plan table built from [`crate::JobCache`]
//! events, an in-flight table of running jobs, and a single-threaded
//! `tokio::select!` over four sources (job events, execution results, a
//! 100ms tick, and kill requests). Nothing here runs on more than one task
//! at a time, so the plan and in-flight tables need no locking.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use cronmesh_error::Result;
use cronmesh_executor::Executor;
use cronmesh_kv::{KvGateway, WatchEventKind};
use cronmesh_lock::{JobLock, LockOutcome};
use cronmesh_model::{keys, CompiledCron, ExecuteInfo, JobEvent, JobLog, SchedulePlan};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{log_sink::LogSinkHandle, metrics};

pub struct Scheduler {
    kv: Arc<dyn KvGateway>,
    executor: Arc<Executor>,
    job_lock: Arc<JobLock>,
    logs: LogSinkHandle,
    worker_id: String,
    plans: HashMap<String, SchedulePlan>,
    in_flight: HashMap<String, ExecuteInfo>,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        kv: Arc<dyn KvGateway>,
        executor: Arc<Executor>,
        job_lock: Arc<JobLock>,
        logs: LogSinkHandle,
        worker_id: String,
    ) -> Self {
        Self { kv, executor, job_lock, logs, worker_id, plans: HashMap::new(), in_flight: HashMap::new() }
    }

    /// Drives the dispatch loop until `cancel` fires. `events` carries job
    /// definition deltas, `results` carries finished executions.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<JobEvent>,
        mut results: mpsc::Receiver<cronmesh_model::ExecuteResult>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut kill_watch = self.kv.watch_prefix(keys::KILL_PREFIX).await?;
        let mut tick = tokio::time::interval(Duration::from_millis(100));

        loop {
            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                Some(event) = events.recv() => self.on_job_event(event),
                Some(result) = results.recv() => self.on_result(result),
                Some(kill) = kill_watch.recv() => self.on_kill_event(&kill),
                _ = tick.tick() => self.on_tick().await,
                else => return Ok(()),
            }
        }
    }

    /// Cancels a running job's execution scope. `NotFound` if nothing with
    /// that name is in flight.
    pub fn kill(&self, job_name: &str) -> Result<()> { self.executor.kill(job_name) }

    fn on_job_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Save(job) => {
                if job.disabled {
                    self.plans.remove(&job.name);
                    return;
                }
                let parsed = match CompiledCron::parse(&job.cron_expr) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        warn!(job = %job.name, %err, "dropping job with unparseable cron expression");
                        self.plans.remove(&job.name);
                        return;
                    }
                };
                let next_fire_at = match parsed.next_after(Utc::now()) {
                    Ok(next) => next,
                    Err(err) => {
                        warn!(job = %job.name, %err, "could not compute next occurrence");
                        return;
                    }
                };
                self.plans.insert(job.name.clone(), SchedulePlan { job, parsed_expr: parsed, next_fire_at });
            }
            // The in-flight run, if any, is left alone — only future
            // dispatches stop.
            JobEvent::Delete(job) => {
                self.plans.remove(&job.name);
            }
        }
    }

    async fn on_tick(&mut self) {
        let now = Utc::now();
        let due: Vec<String> =
            self.plans.iter().filter(|(_, plan)| plan.is_due(now)).map(|(name, _)| name.clone()).collect();

        for name in due {
            self.try_start(&name).await;
            if let Some(plan) = self.plans.get_mut(&name) {
                match plan.parsed_expr.next_after(now) {
                    Ok(next) => plan.next_fire_at = next,
                    Err(err) => {
                        warn!(job = %name, %err, "could not advance schedule, dropping plan");
                        self.plans.remove(&name);
                    }
                }
            }
        }
    }

    async fn try_start(&mut self, name: &str) {
        if self.in_flight.contains_key(name) {
            return;
        }
        let Some(plan) = self.plans.get(name) else { return };
        let job = plan.job.clone();
        let planned_fire_at = plan.next_fire_at;

        match self.job_lock.try_lock(name).await {
            Ok(LockOutcome::Acquired(guard)) => {
                let info = ExecuteInfo {
                    job,
                    planned_fire_at,
                    actual_dispatch_at: Utc::now(),
                    cancel_scope: CancellationToken::new(),
                };
                self.in_flight.insert(name.to_string(), info.clone());
                self.executor.execute(info);
                metrics::JOBS_DISPATCHED.inc();

                // Held only long enough to decide who dispatches; the run
                // itself is not protected by this lock.
                if let Err(err) = guard.unlock().await {
                    warn!(job = name, %err, "failed to release dispatch lock");
                }
            }
            Ok(LockOutcome::HeldElsewhere) => {
                metrics::JOBS_LOCK_CONTENDED.inc();
            }
            Err(err) => {
                warn!(job = name, %err, "dispatch lock attempt failed");
            }
        }
    }

    fn on_result(&mut self, result: cronmesh_model::ExecuteResult) {
        let Some(info) = self.in_flight.remove(&result.job_name) else {
            warn!(job = %result.job_name, "execution result for a job with no in-flight entry");
            return;
        };
        let log = JobLog::from_result(
            &info.job.command,
            info.planned_fire_at,
            info.actual_dispatch_at,
            &self.worker_id,
            result,
        );
        self.logs.append(log);
    }

    fn on_kill_event(&mut self, event: &cronmesh_kv::WatchEvent) {
        if !matches!(event.kind, WatchEventKind::Put) {
            return;
        }
        let Some(name) = keys::strip_prefix(&event.key, keys::KILL_PREFIX) else { return };
        if let Err(err) = self.kill(name) {
            warn!(job = name, %err, "kill request for a job with no in-flight execution");
        }
    }
}
