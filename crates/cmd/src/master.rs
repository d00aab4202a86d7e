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
use cronmesh_logstore::{LogManager, MongoLogStore};
use cronmesh_master::{JobRegistry, WorkerRegistry};
use cronmesh_server::http::{AppState, RestServerConfig, start_control_api};
use snafu::{ResultExt, Whatever};
use tracing::info;

use crate::shutdown::wait_for_shutdown_signal;

pub async fn run(config: Config) -> Result<(), Whatever> {
    let kv: Arc<dyn KvGateway> = Arc::new(
        EtcdGateway::connect(&config.etcd_endpoints)
            .await
            .whatever_context("failed to connect to etcd")?
            .with_timeout(config.etcd_dial_timeout),
    );

    let (worker_registry, _worker_watch) =
        WorkerRegistry::start(kv.clone()).await.whatever_context("failed to start worker registry")?;

    let log_store =
        Arc::new(MongoLogStore::connect(&config.mongo_uri, &config.mongo_database).await.whatever_context(
            "failed to connect to mongo",
        )?);

    let state = AppState {
        jobs: Arc::new(JobRegistry::new(kv)),
        workers: Arc::new(worker_registry),
        logs: Arc::new(LogManager::new(log_store)),
    };

    let rest_config = RestServerConfig { bind_address: config.api_bind_address.clone(), ..RestServerConfig::default() };
    let mut handle =
        start_control_api(rest_config, state).await.whatever_context("failed to start control API")?;
    handle.wait_for_start().await.whatever_context("control API failed to start")?;
    info!(bind_address = %config.api_bind_address, "master control API is up");

    wait_for_shutdown_signal().await;
    info!("master shutting down");
    handle.shutdown();
    handle.wait_for_stop().await.whatever_context("control API failed to stop cleanly")?;
    Ok(())
}
