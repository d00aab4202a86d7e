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

use chrono::{DateTime, Utc};
use cronmesh_error::Result;
use cronmesh_model::JobLog;

/// Append-only job execution log storage: batched insert, filtered scan,
/// count, and time-ranged delete. Never mutates a record after insert.
#[async_trait::async_trait]
pub trait LogStore: Send + Sync {
    async fn insert_many(&self, logs: Vec<JobLog>) -> Result<()>;

    /// `job_name` empty means "all jobs". Ordered by `start_at` descending.
    async fn find(&self, job_name: &str, skip: u64, limit: i64) -> Result<Vec<JobLog>>;

    async fn count(&self, job_name: &str) -> Result<u64>;

    async fn find_latest(&self, job_name: &str) -> Result<Option<JobLog>>;

    /// All records for `job_name` (empty = all jobs) with `start_at >= since`.
    async fn find_since(&self, job_name: &str, since: DateTime<Utc>) -> Result<Vec<JobLog>>;

    /// Deletes every record with `end_at < cutoff`, returning the count
    /// removed. Filtered on completion rather than start so a long-running
    /// job that started outside the retention window but finished inside it
    /// is kept.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
