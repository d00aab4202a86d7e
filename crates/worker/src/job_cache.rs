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

use std::sync::Arc;

use cronmesh_error::Result;
use cronmesh_kv::{KvGateway, WatchEventKind};
use cronmesh_model::{keys, Job, JobEvent};
use dashmap::DashMap;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::metrics;

/// Mirrors `/cron/jobs/*` into an in-memory concurrent map and turns watch
/// deltas into [`JobEvent`]s for the scheduler. Construction does a full
/// scan before opening the watch, so the scheduler always starts from a
/// complete view.
#[derive(Clone)]
pub struct JobCache {
    jobs: Arc<DashMap<String, Job>>,
    kv: Arc<dyn KvGateway>,
    events_tx: mpsc::Sender<JobEvent>,
}

impl JobCache {
    /// Returns the cache, the event receiver the scheduler drains, and the
    /// watch-consumer task's handle (kept alive for the life of the worker,
    /// not normally awaited).
    pub async fn start(
        kv: Arc<dyn KvGateway>,
        event_capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<JobEvent>, JoinHandle<()>)> {
        let jobs = Arc::new(DashMap::new());
        for entry in kv.scan_prefix(keys::JOBS_PREFIX).await? {
            if let Some(name) = keys::strip_prefix(&entry.key, keys::JOBS_PREFIX) {
                match decode(&entry.value) {
                    Ok(job) => {
                        jobs.insert(name.to_string(), job);
                    }
                    Err(err) => warn!(name, %err, "skipping undecodable job record on cache init"),
                }
            }
        }

        let (tx, rx) = mpsc::channel(event_capacity);
        let mut watch = kv.watch_prefix(keys::JOBS_PREFIX).await?;

        let task_jobs = jobs.clone();
        let task_tx = tx.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = watch.recv().await {
                let Some(name) = keys::strip_prefix(&event.key, keys::JOBS_PREFIX) else { continue };
                let job_event = match event.kind {
                    WatchEventKind::Put => match decode(&event.value) {
                        Ok(job) => {
                            task_jobs.insert(name.to_string(), job.clone());
                            Some(JobEvent::Save(job))
                        }
                        Err(err) => {
                            warn!(name, %err, "skipping undecodable job watch event");
                            None
                        }
                    },
                    WatchEventKind::Delete => {
                        task_jobs.remove(name).map(|(_, job)| JobEvent::Delete(job))
                    }
                };

                if let Some(job_event) = job_event {
                    if task_tx.try_send(job_event).is_err() {
                        metrics::JOB_EVENTS_DROPPED.inc();
                        warn!(name, "job event channel full, dropping event");
                    }
                }
            }
        });

        Ok((Self { jobs, kv, events_tx: tx }, rx, handle))
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Job> { self.jobs.iter().map(|entry| entry.value().clone()).collect() }

    /// Re-scans `/cron/jobs/` and reconciles the map against it, emitting a
    /// synthetic `Save`/`Delete` for anything that drifted — this is what
    /// heals a `JobEvent` the bounded channel dropped on the floor.
    pub async fn resync(&self) -> Result<()> {
        let entries = self.kv.scan_prefix(keys::JOBS_PREFIX).await?;
        let mut seen = std::collections::HashSet::with_capacity(entries.len());

        for entry in entries {
            let Some(name) = keys::strip_prefix(&entry.key, keys::JOBS_PREFIX) else { continue };
            seen.insert(name.to_string());
            let Ok(job) = decode(&entry.value) else { continue };

            let changed = self.jobs.get(name).map_or(true, |existing| *existing.value() != job);
            self.jobs.insert(name.to_string(), job.clone());
            if changed {
                self.emit(JobEvent::Save(job)).await;
            }
        }

        let stale: Vec<String> =
            self.jobs.iter().map(|entry| entry.key().clone()).filter(|name| !seen.contains(name)).collect();
        for name in stale {
            if let Some((_, job)) = self.jobs.remove(&name) {
                self.emit(JobEvent::Delete(job)).await;
            }
        }
        Ok(())
    }

    async fn emit(&self, event: JobEvent) {
        if self.events_tx.try_send(event).is_err() {
            metrics::JOB_EVENTS_DROPPED.inc();
            warn!("job event channel full, dropping resync-generated event");
        }
    }
}

fn decode(bytes: &[u8]) -> Result<Job> {
    serde_json::from_slice(bytes).map_err(|err| {
        cronmesh_error::SerializationSnafu { key: "job".to_string(), detail: err.to_string() }.build()
    })
}
