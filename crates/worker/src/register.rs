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

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use cronmesh_error::{Result, SerializationSnafu};
use cronmesh_kv::KvGateway;
use cronmesh_model::{keys, WorkerInfo};
use cronmesh_task::{Task, TaskContext};
use sysinfo::System;

/// Publishes this worker's liveness record. `id` is operator-assigned;
/// `hostname` is captured once at startup. CPU/memory sampling is
/// best-effort: a failure to read them never blocks registration.
pub struct Register {
    kv: Arc<dyn KvGateway>,
    id: String,
    hostname: String,
    lease_ttl_seconds: i64,
    system: System,
}

impl Register {
    #[must_use]
    pub fn new(kv: Arc<dyn KvGateway>, id: String, heartbeat_interval: Duration) -> Self {
        let lease_ttl_seconds = (2 * heartbeat_interval.as_secs() as i64).max(5);
        let hostname = System::host_name().unwrap_or_else(|| "unknown".to_string());
        Self { kv, id, hostname, lease_ttl_seconds, system: System::new() }
    }

    /// Serializes the current `WorkerInfo` and writes it under a fresh
    /// lease with TTL `max(5s, 2 * heartbeatInterval)`. Safe to call any
    /// number of times; it always leaves exactly one registration.
    pub async fn do_register(&mut self) -> Result<()> {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let cpu_usage = f64::from(self.system.global_cpu_usage());
        let mem_usage = if self.system.total_memory() == 0 {
            0.0
        } else {
            self.system.used_memory() as f64 / self.system.total_memory() as f64 * 100.0
        };

        let info = WorkerInfo {
            id: self.id.clone(),
            hostname: self.hostname.clone(),
            cpu_usage,
            mem_usage,
            last_seen_ms: Utc::now().timestamp_millis(),
        };

        let bytes = serde_json::to_vec(&info).map_err(|err| {
            SerializationSnafu { key: info.id.clone(), detail: err.to_string() }.build()
        })?;

        let lease_id = self.kv.grant_lease(self.lease_ttl_seconds).await?;
        self.kv.put_with_lease(&keys::worker_key(&self.id), bytes, lease_id).await
    }
}

#[async_trait::async_trait]
impl Task for Register {
    async fn on_start(&mut self, _ctx: &TaskContext) -> Result<()> { self.do_register().await }

    async fn work(&mut self, _ctx: &TaskContext) -> Result<()> { self.do_register().await }
}
