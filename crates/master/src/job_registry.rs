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

use chrono::Utc;
use cronmesh_error::{InvalidInputSnafu, NotFoundSnafu, Result, SerializationSnafu};
use cronmesh_kv::KvGateway;
use cronmesh_model::{keys, Job};

/// Default TTL for kill-marker keys: long enough for every worker to see
/// them on its next heartbeat-scale watch delivery, short enough that a
/// stuck marker self-heals.
const KILL_MARKER_TTL_SECONDS: i64 = 5;

/// CRUD over job definitions plus kill-marker publication. The only writer
/// of `/cron/jobs/*`.
pub struct JobRegistry {
    kv: Arc<dyn KvGateway>,
}

impl JobRegistry {
    #[must_use]
    pub fn new(kv: Arc<dyn KvGateway>) -> Self { Self { kv } }

    /// Validates `name`/`command`/`cronExpr` are non-empty, stamps
    /// `created_at` if zero, and always refreshes `updated_at`.
    pub async fn save(&self, mut job: Job) -> Result<Job> {
        if job.name.trim().is_empty() || job.command.trim().is_empty() || job.cron_expr.trim().is_empty() {
            return InvalidInputSnafu {
                reason: "name, command, and cronExpr must be non-empty",
            }
            .fail();
        }

        let now = Utc::now().timestamp();
        if job.created_at == 0 {
            job.created_at = now;
        }
        job.updated_at = now;

        self.kv.put(&keys::job_key(&job.name), encode(&job)?).await?;
        Ok(job)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let deleted = self.kv.delete(&keys::job_key(name)).await?;
        if deleted == 0 {
            return NotFoundSnafu { operation: "delete", key: name.to_string() }.fail();
        }
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<Job> {
        let entry = self
            .kv
            .get(&keys::job_key(name))
            .await?
            .ok_or_else(|| NotFoundSnafu { operation: "get", key: name.to_string() }.build())?;
        decode(&entry.value)
    }

    pub async fn list(&self) -> Result<Vec<Job>> {
        let entries = self.kv.scan_prefix(keys::JOBS_PREFIX).await?;
        entries.iter().map(|entry| decode(&entry.value)).collect()
    }

    /// Empty `keyword` returns every job.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Job>> {
        Ok(self.list().await?.into_iter().filter(|job| job.matches_keyword(keyword)).collect())
    }

    pub async fn disable(&self, name: &str) -> Result<Job> { self.set_disabled(name, true).await }

    pub async fn enable(&self, name: &str) -> Result<Job> { self.set_disabled(name, false).await }

    async fn set_disabled(&self, name: &str, disabled: bool) -> Result<Job> {
        let mut job = self.get(name).await?;
        job.disabled = disabled;
        job.updated_at = Utc::now().timestamp();
        self.kv.put(&keys::job_key(name), encode(&job)?).await?;
        Ok(job)
    }

    /// Writes an empty-valued, short-TTL kill marker at `/cron/kill/<name>`.
    /// Workers watching that prefix cancel any locally-running instance.
    pub async fn request_kill(&self, name: &str) -> Result<()> {
        let lease_id = self.kv.grant_lease(KILL_MARKER_TTL_SECONDS).await?;
        self.kv.put_with_lease(&keys::kill_key(name), Vec::new(), lease_id).await
    }
}

fn encode(job: &Job) -> Result<Vec<u8>> {
    serde_json::to_vec(job)
        .map_err(|err| SerializationSnafu { key: job.name.clone(), detail: err.to_string() }.build())
}

fn decode(bytes: &[u8]) -> Result<Job> {
    serde_json::from_slice(bytes).map_err(|err| {
        SerializationSnafu { key: "job".to_string(), detail: err.to_string() }.build()
    })
}

#[cfg(test)]
mod tests {
    use cronmesh_kv::{KeyValue, WatchEvent};
    use tokio::sync::{mpsc, Mutex};

    use super::*;

    #[derive(Default)]
    struct FakeKv {
        entries: Mutex<std::collections::HashMap<String, Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl KvGateway for FakeKv {
        async fn get(&self, key: &str) -> Result<Option<KeyValue>> {
            Ok(self.entries.lock().await.get(key).map(|value| KeyValue {
                key: key.to_string(),
                value: value.clone(),
                mod_revision: 1,
            }))
        }

        async fn scan_prefix(&self, prefix: &str) -> Result<Vec<KeyValue>> {
            Ok(self
                .entries
                .lock()
                .await
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, value)| KeyValue { key: key.clone(), value: value.clone(), mod_revision: 1 })
                .collect())
        }

        async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
            self.entries.lock().await.insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<i64> {
            Ok(i64::from(self.entries.lock().await.remove(key).is_some()))
        }

        async fn delete_prefix(&self, _prefix: &str) -> Result<i64> { Ok(0) }

        async fn grant_lease(&self, _ttl_seconds: i64) -> Result<i64> { Ok(1) }

        async fn put_with_lease(&self, key: &str, value: Vec<u8>, _lease_id: i64) -> Result<()> {
            self.put(key, value).await
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
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    fn job(name: &str) -> Job {
        Job {
            name: name.to_string(),
            command: "echo hi".to_string(),
            cron_expr: "* * * * * *".to_string(),
            timeout: 0,
            disabled: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn save_then_get_round_trips_with_stamped_timestamps() {
        let registry = JobRegistry::new(Arc::new(FakeKv::default()));
        let saved = registry.save(job("greet")).await.unwrap();
        assert!(saved.created_at > 0);

        let fetched = registry.get("greet").await.unwrap();
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn save_then_delete_then_get_is_not_found() {
        let registry = JobRegistry::new(Arc::new(FakeKv::default()));
        registry.save(job("greet")).await.unwrap();
        registry.delete("greet").await.unwrap();
        assert!(registry.get("greet").await.is_err());
    }

    #[tokio::test]
    async fn disable_then_enable_round_trips() {
        let registry = JobRegistry::new(Arc::new(FakeKv::default()));
        registry.save(job("greet")).await.unwrap();

        let disabled = registry.disable("greet").await.unwrap();
        assert!(disabled.disabled);

        let enabled = registry.enable("greet").await.unwrap();
        assert!(!enabled.disabled);
    }

    #[tokio::test]
    async fn save_rejects_empty_fields() {
        let registry = JobRegistry::new(Arc::new(FakeKv::default()));
        let mut bad = job("greet");
        bad.command = String::new();
        assert!(registry.save(bad).await.is_err());
    }
}
