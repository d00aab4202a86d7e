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

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use cronmesh_error::Result;
use cronmesh_kv::KvGateway;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

/// A held job lock. Dropping it without calling [`unlock`](Self::unlock)
/// aborts the renewal task but leaves the key for the lease TTL to expire —
/// callers on the dispatch path always call `unlock` immediately after
/// deciding to start.
pub struct JobLockGuard {
    kv: Arc<dyn KvGateway>,
    key: String,
    lease_id: i64,
    held: Arc<AtomicBool>,
    renewal: Option<JoinHandle<()>>,
}

impl JobLockGuard {
    pub(crate) fn new(
        kv: Arc<dyn KvGateway>,
        key: String,
        lease_id: i64,
        mut renewals: mpsc::Receiver<Result<()>>,
    ) -> Self {
        let held = Arc::new(AtomicBool::new(true));
        let held_for_task = held.clone();
        let job_key = key.clone();
        let renewal = tokio::spawn(async move {
            while let Some(ack) = renewals.recv().await {
                if let Err(err) = ack {
                    warn!(key = %job_key, error = %err, "lease renewal failed, releasing lock");
                    held_for_task.store(false, Ordering::Release);
                    return;
                }
            }
            held_for_task.store(false, Ordering::Release);
        });

        Self { kv, key, lease_id, held, renewal: Some(renewal) }
    }

    #[must_use]
    pub fn is_held(&self) -> bool { self.held.load(Ordering::Acquire) }

    /// Deletes the lock key and revokes its lease. Safe to call even after
    /// the renewal task has already given up on the lock.
    pub async fn unlock(mut self) -> Result<()> {
        if let Some(renewal) = self.renewal.take() {
            renewal.abort();
        }
        self.kv.delete(&self.key).await?;
        self.kv.revoke(self.lease_id).await
    }
}

impl Drop for JobLockGuard {
    fn drop(&mut self) {
        if let Some(renewal) = self.renewal.take() {
            renewal.abort();
        }
    }
}
