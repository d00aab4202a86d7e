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

//! Per-(worker, job) distributed mutual exclusion, wrapping
//! [`cronmesh_kv::KvGateway`]'s CAS-put and lease renewal. The scheduler
//! holds this lock only long enough to decide who dispatches a run — see
//! `cronmesh-worker`'s scheduler for the dispatch-then-release flow.

mod guard;
mod outcome;

use std::{sync::Arc, time::Duration};

use cronmesh_error::{Result, TimeoutSnafu};
use cronmesh_kv::KvGateway;
use cronmesh_model::keys;

pub use guard::JobLockGuard;
pub use outcome::LockOutcome;

pub struct JobLock {
    kv: Arc<dyn KvGateway>,
    ttl_seconds: i64,
}

impl JobLock {
    #[must_use]
    pub fn new(kv: Arc<dyn KvGateway>, ttl_seconds: i64) -> Self {
        Self { kv, ttl_seconds: ttl_seconds.max(1) }
    }

    /// Attempts to acquire `/cron/lock/<job_name>` once. On success, spawns
    /// a background task that renews the backing lease until the guard is
    /// dropped or unlocked; a renewal failure flips the guard to
    /// not-held so callers relying on `is_held` notice the loss.
    pub async fn try_lock(&self, job_name: &str) -> Result<LockOutcome> {
        let key = keys::lock_key(job_name);
        let lease_id = self.kv.grant_lease(self.ttl_seconds).await?;

        let acquired = self.kv.try_acquire(&key, Vec::new(), lease_id).await?;
        if !acquired {
            let _ = self.kv.revoke(lease_id).await;
            return Ok(LockOutcome::HeldElsewhere);
        }

        let renewals = self.kv.keep_alive(lease_id).await?;
        let guard = JobLockGuard::new(self.kv.clone(), key, lease_id, renewals);
        Ok(LockOutcome::Acquired(guard))
    }

    /// Single attempt bounded by `bound`. There is no blocking retry —
    /// contention is expected to resolve at the worker's next scheduling
    /// tick.
    pub async fn lock_with_timeout(&self, job_name: &str, bound: Duration) -> Result<LockOutcome> {
        match tokio::time::timeout(bound, self.try_lock(job_name)).await {
            Ok(result) => result,
            Err(_) => TimeoutSnafu {
                operation: "lock_with_timeout",
                key: keys::lock_key(job_name),
            }
            .fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use async_trait::async_trait;
    use cronmesh_kv::{KeyValue, WatchEvent};
    use tokio::sync::{mpsc, Mutex};

    use super::*;

    #[derive(Default)]
    struct FakeKv {
        held_keys: Mutex<std::collections::HashSet<String>>,
        next_lease: AtomicI64,
    }

    #[async_trait]
    impl KvGateway for FakeKv {
        async fn get(&self, _key: &str) -> Result<Option<KeyValue>> { Ok(None) }

        async fn scan_prefix(&self, _prefix: &str) -> Result<Vec<KeyValue>> { Ok(vec![]) }

        async fn put(&self, _key: &str, _value: Vec<u8>) -> Result<()> { Ok(()) }

        async fn delete(&self, key: &str) -> Result<i64> {
            Ok(i64::from(self.held_keys.lock().await.remove(key)))
        }

        async fn delete_prefix(&self, _prefix: &str) -> Result<i64> { Ok(0) }

        async fn grant_lease(&self, _ttl_seconds: i64) -> Result<i64> {
            Ok(self.next_lease.fetch_add(1, Ordering::SeqCst))
        }

        async fn put_with_lease(&self, _key: &str, _value: Vec<u8>, _lease_id: i64) -> Result<()> {
            Ok(())
        }

        async fn keep_alive(&self, _lease_id: i64) -> Result<mpsc::Receiver<Result<()>>> {
            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(async move {
                let _ = tx.send(Ok(())).await;
            });
            Ok(rx)
        }

        async fn revoke(&self, _lease_id: i64) -> Result<()> { Ok(()) }

        async fn try_acquire(&self, key: &str, _value: Vec<u8>, _lease_id: i64) -> Result<bool> {
            Ok(self.held_keys.lock().await.insert(key.to_string()))
        }

        async fn watch_prefix(&self, _prefix: &str) -> Result<mpsc::Receiver<WatchEvent>> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn second_locker_observes_held_elsewhere() {
        let kv = Arc::new(FakeKv::default());
        let lock = JobLock::new(kv, 30);

        let first = lock.try_lock("greet").await.unwrap();
        assert!(matches!(first, LockOutcome::Acquired(_)));

        let second = lock.try_lock("greet").await.unwrap();
        assert!(matches!(second, LockOutcome::HeldElsewhere));
    }

    #[tokio::test]
    async fn unlock_frees_the_key_for_the_next_locker() {
        let kv = Arc::new(FakeKv::default());
        let lock = JobLock::new(kv, 30);

        let LockOutcome::Acquired(guard) = lock.try_lock("greet").await.unwrap() else {
            panic!("expected to acquire the lock");
        };
        guard.unlock().await.unwrap();

        let second = lock.try_lock("greet").await.unwrap();
        assert!(matches!(second, LockOutcome::Acquired(_)));
    }
}
