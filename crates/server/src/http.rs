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

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use cronmesh_api::{Envelope, JobRequest, JobSearchQuery, LogListQuery, LogStatisticsQuery, Page};
use cronmesh_logstore::LogManager;
use cronmesh_master::{JobRegistry, WorkerRegistry};
use cronmesh_model::Job;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use snafu::ResultExt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::{
    NetworkError, ParseAddressSnafu, Result, ServiceHandler,
    error::{ApiError, ApiResult},
};

/// Default maximum HTTP request body size, in bytes (100 MB).
pub const DEFAULT_MAX_HTTP_BODY_SIZE: usize = 100 * 1024 * 1024;

/// Configuration for the control-API HTTP server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, SmartDefault, bon::Builder)]
pub struct RestServerConfig {
    #[default = "127.0.0.1:8080"]
    pub bind_address: String,
    #[default(_code = "DEFAULT_MAX_HTTP_BODY_SIZE")]
    pub max_body_size_bytes: usize,
    #[default = true]
    pub enable_cors: bool,
}

/// Everything the route handlers need, shared behind `Arc`s so the struct
/// stays cheap to clone into each request.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobRegistry>,
    pub workers: Arc<WorkerRegistry>,
    pub logs: Arc<LogManager>,
}

/// Starts the control-API server and returns a handle for managing its
/// lifecycle.
///
/// # Errors
/// Returns an error if `config.bind_address` cannot be parsed.
pub async fn start_control_api(config: RestServerConfig, state: AppState) -> Result<ServiceHandler> {
    let bind_addr = config
        .bind_address
        .parse::<std::net::SocketAddr>()
        .context(ParseAddressSnafu { addr: config.bind_address.clone() })?;

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", job_routes().merge(worker_routes()).merge(log_routes()))
        .layer(DefaultBodyLimit::max(config.max_body_size_bytes))
        .with_state(state);

    if config.enable_cors {
        router = router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    let cancellation_token = CancellationToken::new();
    let (join_handle, started_rx) = {
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let cancellation_token = cancellation_token.clone();
        let join_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(bind_addr).await.unwrap();
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    info!("control API (on {}) started", bind_addr);
                    let _ = started_tx.send(());
                    cancellation_token.cancelled().await;
                    info!("control API (on {}) received shutdown signal", bind_addr);
                })
                .await;
            info!("control API (on {}) task completed: {:?}", bind_addr, result);
        });
        (join_handle, started_rx)
    };

    Ok(ServiceHandler { join_handle, cancellation_token, started_rx: Some(started_rx) })
}

async fn health_check() -> impl IntoResponse { (StatusCode::OK, "OK") }

async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(%err, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    (StatusCode::OK, String::from_utf8_lossy(&buffer).into_owned())
}

fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/search", get(search_jobs))
        .route("/jobs/{name}", get(get_job).put(update_job).delete(delete_job))
        .route("/jobs/{name}/enable", post(enable_job))
        .route("/jobs/{name}/disable", post(disable_job))
        .route("/jobs/{name}/kill", post(kill_job))
}

fn worker_routes() -> Router<AppState> {
    Router::new().route("/workers", get(list_workers)).route("/workers/stats", get(worker_stats))
}

fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/{name}/logs", get(list_logs))
        .route("/jobs/{name}/logs/latest", get(latest_log))
        .route("/jobs/{name}/logs/statistics", get(log_statistics))
}

async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> ApiResult<Json<Envelope<Job>>> {
    let job = state.jobs.save(request.into_job()).await.map_err(ApiError::from)?;
    Ok(Json(Envelope::ok(job)))
}

async fn update_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<JobRequest>,
) -> ApiResult<Json<Envelope<Job>>> {
    let mut job = request.into_job();
    job.name = name;
    if let Ok(existing) = state.jobs.get(&job.name).await {
        job.created_at = existing.created_at;
    }
    let saved = state.jobs.save(job).await.map_err(ApiError::from)?;
    Ok(Json(Envelope::ok(saved)))
}

async fn delete_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<()>>> {
    state.jobs.delete(&name).await.map_err(ApiError::from)?;
    Ok(Json(Envelope::ok(())))
}

async fn get_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<Job>>> {
    Ok(Json(Envelope::ok(state.jobs.get(&name).await.map_err(ApiError::from)?)))
}

async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<Job>>>> {
    Ok(Json(Envelope::ok(state.jobs.list().await.map_err(ApiError::from)?)))
}

async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobSearchQuery>,
) -> ApiResult<Json<Envelope<Vec<Job>>>> {
    Ok(Json(Envelope::ok(state.jobs.search(&query.keyword).await.map_err(ApiError::from)?)))
}

async fn enable_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<Job>>> {
    Ok(Json(Envelope::ok(state.jobs.enable(&name).await.map_err(ApiError::from)?)))
}

async fn disable_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<Job>>> {
    Ok(Json(Envelope::ok(state.jobs.disable(&name).await.map_err(ApiError::from)?)))
}

async fn kill_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<()>>> {
    state.jobs.request_kill(&name).await.map_err(ApiError::from)?;
    Ok(Json(Envelope::ok(())))
}

async fn list_workers(State(state): State<AppState>) -> impl IntoResponse {
    Json(Envelope::ok(state.workers.list().await))
}

async fn worker_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(Envelope::ok(state.workers.stats().await))
}

async fn list_logs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<LogListQuery>,
) -> ApiResult<Json<Envelope<Page<cronmesh_model::JobLog>>>> {
    let (items, total) = state.logs.list(&name, query.page, query.page_size).await.map_err(ApiError::from)?;
    Ok(Json(Envelope::ok(Page::new(items, total))))
}

async fn latest_log(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Envelope<cronmesh_model::JobLog>>> {
    Ok(Json(Envelope::ok(state.logs.get_latest(&name).await.map_err(ApiError::from)?)))
}

async fn log_statistics(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<LogStatisticsQuery>,
) -> ApiResult<Json<Envelope<cronmesh_logstore::LogStatistics>>> {
    Ok(Json(Envelope::ok(state.logs.statistics(&name, query.days).await.map_err(ApiError::from)?)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cronmesh_kv::KvGateway;
    use cronmesh_logstore::LogStore;
    use cronmesh_model::JobLog;

    use super::*;

    fn get_available_port_blocking() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[derive(Default)]
    struct FakeKv {
        entries: tokio::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl KvGateway for FakeKv {
        async fn get(&self, key: &str) -> cronmesh_error::Result<Option<cronmesh_kv::KeyValue>> {
            Ok(self.entries.lock().await.get(key).map(|value| cronmesh_kv::KeyValue {
                key: key.to_string(),
                value: value.clone(),
                mod_revision: 1,
            }))
        }

        async fn scan_prefix(&self, prefix: &str) -> cronmesh_error::Result<Vec<cronmesh_kv::KeyValue>> {
            Ok(self
                .entries
                .lock()
                .await
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, value)| cronmesh_kv::KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                    mod_revision: 1,
                })
                .collect())
        }

        async fn put(&self, key: &str, value: Vec<u8>) -> cronmesh_error::Result<()> {
            self.entries.lock().await.insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> cronmesh_error::Result<i64> {
            Ok(i64::from(self.entries.lock().await.remove(key).is_some()))
        }

        async fn delete_prefix(&self, _prefix: &str) -> cronmesh_error::Result<i64> { Ok(0) }

        async fn grant_lease(&self, _ttl_seconds: i64) -> cronmesh_error::Result<i64> { Ok(1) }

        async fn put_with_lease(
            &self,
            key: &str,
            value: Vec<u8>,
            _lease_id: i64,
        ) -> cronmesh_error::Result<()> {
            self.put(key, value).await
        }

        async fn keep_alive(
            &self,
            _lease_id: i64,
        ) -> cronmesh_error::Result<tokio::sync::mpsc::Receiver<cronmesh_error::Result<()>>> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        }

        async fn revoke(&self, _lease_id: i64) -> cronmesh_error::Result<()> { Ok(()) }

        async fn try_acquire(
            &self,
            _key: &str,
            _value: Vec<u8>,
            _lease_id: i64,
        ) -> cronmesh_error::Result<bool> {
            Ok(true)
        }

        async fn watch_prefix(
            &self,
            _prefix: &str,
        ) -> cronmesh_error::Result<tokio::sync::mpsc::Receiver<cronmesh_kv::WatchEvent>> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        }
    }

    #[derive(Default)]
    struct FakeLogStore {
        logs: tokio::sync::Mutex<Vec<JobLog>>,
    }

    #[async_trait::async_trait]
    impl LogStore for FakeLogStore {
        async fn insert_many(&self, mut logs: Vec<JobLog>) -> cronmesh_error::Result<()> {
            self.logs.lock().await.append(&mut logs);
            Ok(())
        }

        async fn find(&self, job_name: &str, skip: u64, limit: i64) -> cronmesh_error::Result<Vec<JobLog>> {
            let logs = self.logs.lock().await;
            Ok(logs
                .iter()
                .filter(|log| log.job_name == job_name)
                .cloned()
                .skip(skip as usize)
                .take(limit as usize)
                .collect())
        }

        async fn count(&self, job_name: &str) -> cronmesh_error::Result<u64> {
            Ok(self.logs.lock().await.iter().filter(|log| log.job_name == job_name).count() as u64)
        }

        async fn find_latest(&self, job_name: &str) -> cronmesh_error::Result<Option<JobLog>> {
            Ok(self.logs.lock().await.iter().find(|log| log.job_name == job_name).cloned())
        }

        async fn find_since(
            &self,
            job_name: &str,
            _since: chrono::DateTime<chrono::Utc>,
        ) -> cronmesh_error::Result<Vec<JobLog>> {
            self.find(job_name, 0, i64::MAX).await
        }

        async fn delete_older_than(
            &self,
            _cutoff: chrono::DateTime<chrono::Utc>,
        ) -> cronmesh_error::Result<u64> {
            Ok(0)
        }
    }

    async fn test_state() -> AppState {
        let kv: Arc<dyn KvGateway> = Arc::new(FakeKv::default());
        let (workers, _watch) = WorkerRegistry::start(kv.clone()).await.unwrap();
        AppState {
            jobs: Arc::new(JobRegistry::new(kv)),
            workers: Arc::new(workers),
            logs: Arc::new(LogManager::new(Arc::new(FakeLogStore::default()))),
        }
    }

    #[tokio::test]
    async fn control_api_serves_health_and_job_crud() {
        let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();

        let port = get_available_port_blocking();
        let config = RestServerConfig { bind_address: format!("127.0.0.1:{port}"), ..RestServerConfig::default() };
        let mut handler = start_control_api(config, test_state().await).await.unwrap();
        handler.wait_for_start().await.unwrap();

        let client = reqwest::Client::new();
        let response = client.get(format!("http://127.0.0.1:{port}/health")).send().await.unwrap();
        assert_eq!(response.status(), 200);

        let response = client
            .post(format!("http://127.0.0.1:{port}/api/v1/jobs"))
            .json(&serde_json::json!({"name": "greet", "command": "echo hi", "cronExpr": "* * * * * *"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let response = client.get(format!("http://127.0.0.1:{port}/api/v1/jobs/greet")).send().await.unwrap();
        assert_eq!(response.status(), 200);
        let envelope: Envelope<Job> = response.json().await.unwrap();
        assert_eq!(envelope.code, 0);
        assert_eq!(envelope.data.name, "greet");

        let response =
            client.post(format!("http://127.0.0.1:{port}/api/v1/jobs/greet/disable")).send().await.unwrap();
        assert_eq!(response.status(), 200);

        let response = client.get(format!("http://127.0.0.1:{port}/metrics")).send().await.unwrap();
        assert_eq!(response.status(), 200);

        handler.shutdown();
        handler.wait_for_stop().await.unwrap();
    }
}
