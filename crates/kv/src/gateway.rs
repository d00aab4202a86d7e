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

use cronmesh_error::Result;
use tokio::sync::mpsc;

use crate::types::{KeyValue, WatchEvent};

/// Everything the rest of cronmesh needs from a strongly-consistent store.
///
/// `cronmesh-master` and `cronmesh-worker` never talk to etcd directly —
/// they go through this trait, so a different backend only has to land one
/// new impl.
#[async_trait::async_trait]
pub trait KvGateway: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<KeyValue>>;

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<KeyValue>>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Returns the number of keys removed (0 or 1).
    async fn delete(&self, key: &str) -> Result<i64>;

    /// Returns the number of keys removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<i64>;

    /// Grants a lease with the given TTL, returning its id.
    async fn grant_lease(&self, ttl_seconds: i64) -> Result<i64>;

    async fn put_with_lease(&self, key: &str, value: Vec<u8>, lease_id: i64) -> Result<()>;

    /// Starts renewing `lease_id` in the background until the returned
    /// receiver is dropped or the lease is lost. Each `Ok(())` on the
    /// channel is one successful renewal; the channel closes when renewal
    /// can no longer be sustained.
    async fn keep_alive(&self, lease_id: i64) -> Result<mpsc::Receiver<Result<()>>>;

    async fn revoke(&self, lease_id: i64) -> Result<()>;

    /// Atomically creates `key` bound to `lease_id` iff it does not already
    /// exist. Used for dispatch locks and kill markers: the lease is
    /// granted first, the key is created only if absent, and the whole
    /// thing is one round trip so two workers racing on the same job never
    /// both win.
    async fn try_acquire(&self, key: &str, value: Vec<u8>, lease_id: i64) -> Result<bool>;

    /// Subscribes to every put/delete under `prefix`, starting now. Callers
    /// own the receiver and must keep polling it; cronmesh never buffers an
    /// unbounded backlog on their behalf.
    async fn watch_prefix(&self, prefix: &str) -> Result<mpsc::Receiver<WatchEvent>>;
}
