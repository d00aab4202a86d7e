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

use std::{collections::HashMap, sync::Arc};

use cronmesh_error::Result;
use cronmesh_kv::{KvGateway, WatchEventKind};
use cronmesh_model::{keys, WorkerInfo};
use serde::Serialize;
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WorkerStats {
    pub count: usize,
    pub avg_cpu_usage: f64,
    pub avg_mem_usage: f64,
}

/// Read-only, watch-driven mirror of `/cron/workers/*`. Many readers (the
/// HTTP API), one writer (the background watch task), so access is
/// read/write-lock guarded rather than per-entry concurrent.
pub struct WorkerRegistry {
    workers: Arc<RwLock<HashMap<String, WorkerInfo>>>,
}

impl WorkerRegistry {
    /// Snapshots the current worker set, then spawns a task that keeps it
    /// current from `/cron/workers/*`'s watch. The returned handle is not
    /// awaited by callers — it outlives `self` for the life of the process.
    pub async fn start(kv: Arc<dyn KvGateway>) -> Result<(Self, JoinHandle<()>)> {
        let initial = kv.scan_prefix(keys::WORKERS_PREFIX).await?;
        let mut snapshot = HashMap::new();
        for entry in initial {
            if let Some(id) = keys::strip_prefix(&entry.key, keys::WORKERS_PREFIX) {
                match decode(&entry.value) {
                    Ok(info) => {
                        snapshot.insert(id.to_string(), info);
                    }
                    Err(err) => warn!(id, %err, "skipping undecodable worker record"),
                }
            }
        }

        let workers = Arc::new(RwLock::new(snapshot));
        let mut watch = kv.watch_prefix(keys::WORKERS_PREFIX).await?;

        let task_workers = workers.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = watch.recv().await {
                let Some(id) = keys::strip_prefix(&event.key, keys::WORKERS_PREFIX) else { continue };
                match event.kind {
                    WatchEventKind::Put => match decode(&event.value) {
                        Ok(info) => {
                            task_workers.write().await.insert(id.to_string(), info);
                        }
                        Err(err) => warn!(id, %err, "skipping undecodable worker watch event"),
                    },
                    WatchEventKind::Delete => {
                        task_workers.write().await.remove(id);
                    }
                }
            }
        });

        Ok((Self { workers }, handle))
    }

    pub async fn list(&self) -> Vec<WorkerInfo> { self.workers.read().await.values().cloned().collect() }

    pub async fn get(&self, id: &str) -> Option<WorkerInfo> { self.workers.read().await.get(id).cloned() }

    pub async fn stats(&self) -> WorkerStats {
        let workers = self.workers.read().await;
        let count = workers.len();
        if count == 0 {
            return WorkerStats::default();
        }
        let (cpu_sum, mem_sum) =
            workers.values().fold((0.0, 0.0), |(cpu, mem), w| (cpu + w.cpu_usage, mem + w.mem_usage));
        WorkerStats {
            count,
            avg_cpu_usage: cpu_sum / count as f64,
            avg_mem_usage: mem_sum / count as f64,
        }
    }
}

fn decode(bytes: &[u8]) -> Result<WorkerInfo> {
    serde_json::from_slice(bytes).map_err(|err| {
        cronmesh_error::SerializationSnafu { key: "worker".to_string(), detail: err.to_string() }.build()
    })
}

#[cfg(test)]
mod tests {
    use cronmesh_kv::{KeyValue, WatchEvent};
    use tokio::sync::{mpsc, Mutex};

    use super::*;

    struct FakeKv {
        initial: Vec<KeyValue>,
        watch_tx: Mutex<Option<mpsc::Sender<WatchEvent>>>,
    }

    #[async_trait::async_trait]
    impl KvGateway for FakeKv {
        async fn get(&self, _key: &str) -> Result<Option<KeyValue>> { Ok(None) }

        async fn scan_prefix(&self, _prefix: &str) -> Result<Vec<KeyValue>> { Ok(self.initial.clone()) }

        async fn put(&self, _key: &str, _value: Vec<u8>) -> Result<()> { Ok(()) }

        async fn delete(&self, _key: &str) -> Result<i64> { Ok(0) }

        async fn delete_prefix(&self, _prefix: &str) -> Result<i64> { Ok(0) }

        async fn grant_lease(&self, _ttl_seconds: i64) -> Result<i64> { Ok(1) }

        async fn put_with_lease(&self, _key: &str, _value: Vec<u8>, _lease_id: i64) -> Result<()> {
            Ok(())
        }

        async fn keep_alive(&self, _lease_id: i64) -> Result<mpsc::Receiver<Result<()>>> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn revoke(&self, _lease_id: i64) -> Result<()> { Ok(()) }

        async fn try_acquire(&self, _key: &str, _value: Vec<u8>, _lease_id: i64) -> Result<bool> {
            Ok(true)
        }

        async fn watch_prefix(&self, _prefix: &str) -> Result<mpsc::Receiver<WatchEvent>> {
            let (tx, rx) = mpsc::channel(8);
            *self.watch_tx.lock().await = Some(tx);
            Ok(rx)
        }
    }

    fn worker_info(id: &str) -> WorkerInfo {
        WorkerInfo { id: id.to_string(), hostname: "host".to_string(), cpu_usage: 1.0, mem_usage: 2.0, last_seen_ms: 0 }
    }

    #[tokio::test]
    async fn start_snapshots_existing_workers() {
        let kv = Arc::new(FakeKv {
            initial: vec![KeyValue {
                key: keys::worker_key("w1"),
                value: serde_json::to_vec(&worker_info("w1")).unwrap(),
                mod_revision: 1,
            }],
            watch_tx: Mutex::new(None),
        });
        let (registry, _handle) = WorkerRegistry::start(kv).await.unwrap();
        assert_eq!(registry.list().await.len(), 1);
        assert!(registry.get("w1").await.is_some());
    }

    #[tokio::test]
    async fn watch_put_and_delete_update_the_snapshot() {
        let kv = Arc::new(FakeKv { initial: vec![], watch_tx: Mutex::new(None) });
        let (registry, _handle) = WorkerRegistry::start(kv.clone()).await.unwrap();

        let tx = kv.watch_tx.lock().await.clone().unwrap();
        tx.send(WatchEvent {
            kind: WatchEventKind::Put,
            key: keys::worker_key("w1"),
            value: serde_json::to_vec(&worker_info("w1")).unwrap(),
        })
        .await
        .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(registry.get("w1").await.is_some());

        tx.send(WatchEvent { kind: WatchEventKind::Delete, key: keys::worker_key("w1"), value: vec![] })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(registry.get("w1").await.is_none());
    }
}
