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

use chrono::{Duration, Utc};
use cronmesh_error::{NotFoundSnafu, Result};
use cronmesh_model::JobLog;

use crate::store::LogStore;

/// Upper bound on `pageSize`; requests above it are silently clamped.
pub const MAX_PAGE_SIZE: i64 = 200;
const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LogStatistics {
    pub total_count: u64,
    pub success_count: u64,
    pub fail_count: u64,
    pub timeout_count: u64,
    pub avg_duration_seconds: f64,
}

/// Query surface for the API layer, built over a [`LogStore`].
pub struct LogManager {
    store: Arc<dyn LogStore>,
}

impl LogManager {
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>) -> Self { Self { store } }

    /// Returns `(records, total)`. `page <= 0` is treated as `1`; `page_size
    /// <= 0` falls back to a default; anything above [`MAX_PAGE_SIZE`] is
    /// clamped down to it.
    pub async fn list(&self, job_name: &str, page: i64, page_size: i64) -> Result<(Vec<JobLog>, u64)> {
        let page = if page <= 0 { 1 } else { page };
        let page_size = if page_size <= 0 { DEFAULT_PAGE_SIZE } else { page_size.min(MAX_PAGE_SIZE) };
        let skip = u64::try_from((page - 1) * page_size).unwrap_or(0);

        let records = self.store.find(job_name, skip, page_size).await?;
        let total = self.store.count(job_name).await?;
        Ok((records, total))
    }

    pub async fn get_latest(&self, job_name: &str) -> Result<JobLog> {
        self.store
            .find_latest(job_name)
            .await?
            .ok_or_else(|| NotFoundSnafu { operation: "get_latest", key: job_name.to_string() }.build())
    }

    pub async fn statistics(&self, job_name: &str, days: i64) -> Result<LogStatistics> {
        let since = Utc::now() - Duration::days(days.max(0));
        let logs = self.store.find_since(job_name, since).await?;

        let total_count = logs.len() as u64;
        let success_count = logs.iter().filter(|log| log.succeeded()).count() as u64;
        let timeout_count = logs.iter().filter(|log| log.timed_out).count() as u64;
        let fail_count = total_count - success_count;
        let avg_duration_seconds = if total_count == 0 {
            0.0
        } else {
            logs.iter().map(JobLog::duration_seconds).sum::<f64>() / total_count as f64
        };

        Ok(LogStatistics { total_count, success_count, fail_count, timeout_count, avg_duration_seconds })
    }

    pub async fn clean_expired(&self, retention_days: i64) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(retention_days.max(0));
        self.store.delete_older_than(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    #[derive(Default)]
    struct FakeStore {
        logs: std::sync::Mutex<Vec<JobLog>>,
    }

    fn log(job_name: &str, exit_code: i32, timed_out: bool) -> JobLog {
        let now: DateTime<Utc> = Utc::now();
        JobLog {
            job_name: job_name.to_string(),
            command: "echo hi".to_string(),
            output: String::new(),
            error_text: String::new(),
            planned_fire_at: now,
            actual_dispatch_at: now,
            start_at: now,
            end_at: now + chrono::Duration::seconds(2),
            exit_code,
            timed_out,
            worker_id: "w1".to_string(),
        }
    }

    #[async_trait::async_trait]
    impl LogStore for FakeStore {
        async fn insert_many(&self, mut logs: Vec<JobLog>) -> Result<()> {
            self.logs.lock().unwrap().append(&mut logs);
            Ok(())
        }

        async fn find(&self, job_name: &str, skip: u64, limit: i64) -> Result<Vec<JobLog>> {
            let logs = self.logs.lock().unwrap();
            let filtered: Vec<_> =
                logs.iter().filter(|log| job_name.is_empty() || log.job_name == job_name).cloned().collect();
            Ok(filtered.into_iter().skip(skip as usize).take(limit as usize).collect())
        }

        async fn count(&self, job_name: &str) -> Result<u64> {
            let logs = self.logs.lock().unwrap();
            Ok(logs.iter().filter(|log| job_name.is_empty() || log.job_name == job_name).count() as u64)
        }

        async fn find_latest(&self, job_name: &str) -> Result<Option<JobLog>> {
            Ok(self.logs.lock().unwrap().iter().find(|log| log.job_name == job_name).cloned())
        }

        async fn find_since(&self, job_name: &str, _since: DateTime<Utc>) -> Result<Vec<JobLog>> {
            self.find(job_name, 0, i64::MAX).await
        }

        async fn delete_older_than(&self, _cutoff: DateTime<Utc>) -> Result<u64> { Ok(0) }
    }

    #[tokio::test]
    async fn list_clamps_page_and_page_size() {
        let store = Arc::new(FakeStore::default());
        store.insert_many(vec![log("greet", 0, false); 5]).await.unwrap();
        let manager = LogManager::new(store);

        let (records, total) = manager.list("greet", 0, 0).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(records.len(), 5);

        let (records, _) = manager.list("greet", 1, 1_000_000).await.unwrap();
        assert_eq!(records.len(), 5);
    }

    #[tokio::test]
    async fn statistics_aggregate_success_and_failure_counts() {
        let store = Arc::new(FakeStore::default());
        store
            .insert_many(vec![log("greet", 0, false), log("greet", 1, false), log("greet", -1, true)])
            .await
            .unwrap();
        let manager = LogManager::new(store);

        let stats = manager.statistics("greet", 7).await.unwrap();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.fail_count, 2);
        assert_eq!(stats.timeout_count, 1);
        assert!(stats.avg_duration_seconds > 0.0);
    }

    #[tokio::test]
    async fn get_latest_is_not_found_when_empty() {
        let manager = LogManager::new(Arc::new(FakeStore::default()));
        assert!(manager.get_latest("missing").await.is_err());
    }
}
