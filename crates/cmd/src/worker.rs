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

use cronmesh_config::Config;
use cronmesh_kv::{EtcdGateway, KvGateway};
use cronmesh_logstore::{LogStore, MongoLogStore};
use cronmesh_worker::{WorkerRuntime, WorkerRuntimeConfig};
use snafu::{ResultExt, Whatever};
use tracing::info;

use crate::shutdown::wait_for_shutdown_signal;

/// Depth of the job-event channel between the job cache and the scheduler.
const JOB_EVENT_CAPACITY: usize = 1000;

pub async fn run(config: Config) -> Result<(), Whatever> {
    let kv: Arc<dyn KvGateway> = Arc::new(
        EtcdGateway::connect(&config.etcd_endpoints)
            .await
            .whatever_context("failed to connect to etcd")?
            .with_timeout(config.etcd_dial_timeout),
    );
    let log_store: Arc<dyn LogStore> =
        Arc::new(MongoLogStore::connect(&config.mongo_uri, &config.mongo_database).await.whatever_context(
            "failed to connect to mongo",
        )?);

    let runtime_config = WorkerRuntimeConfig {
        worker_id: config.worker_id.clone(),
        heartbeat_interval: config.heartbeat_interval,
        job_lock_ttl_seconds: config.job_lock_ttl_seconds,
        job_event_capacity: JOB_EVENT_CAPACITY,
        job_cache_resync_interval: config.job_cache_resync_interval,
        log_batch_size: config.log_batch_size,
        log_commit_timeout: config.log_commit_timeout,
        log_retention_days: config.log_retention_days,
    };

    let runtime =
        WorkerRuntime::start(kv, log_store, runtime_config).await.whatever_context("failed to start worker runtime")?;
    info!(worker_id = %config.worker_id, "worker runtime is up");

    wait_for_shutdown_signal().await;
    info!("worker shutting down");
    runtime.shutdown().await.whatever_context("worker runtime failed to stop cleanly")?;
    Ok(())
}
