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

use std::{future::Future, time::Duration};

use cronmesh_error::{Error, InvalidInputSnafu, Result, TimeoutSnafu, UnavailableSnafu};
use etcd_client::{Client, Compare, CompareOp, EventType, GetOptions, PutOptions, Txn, TxnOp, WatchOptions};
use tokio::sync::mpsc;
use tracing::warn;

use crate::{
    gateway::KvGateway,
    types::{KeyValue, WatchEvent, WatchEventKind},
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const WATCH_CHANNEL_CAPACITY: usize = 256;

/// [`KvGateway`] backed by a real etcd cluster. Every call is wrapped in an
/// internal deadline so a stalled connection surfaces as `Timeout` rather
/// than hanging the caller forever.
pub struct EtcdGateway {
    client: Client,
    timeout: Duration,
}

impl EtcdGateway {
    pub async fn connect(endpoints: &[String]) -> Result<Self> {
        if endpoints.is_empty() {
            return InvalidInputSnafu {
                reason: "at least one etcd endpoint is required",
            }
            .fail();
        }
        let client = Client::connect(endpoints, None)
            .await
            .map_err(|err| unavailable("connect", "", &err))?;
        Ok(Self { client, timeout: DEFAULT_TIMEOUT })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call<F, T>(&self, operation: &'static str, key: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, etcd_client::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(unavailable(operation, key, &err)),
            Err(_) => TimeoutSnafu { operation, key: key.to_string() }.fail(),
        }
    }
}

fn unavailable(operation: &'static str, key: &str, err: &etcd_client::Error) -> Error {
    UnavailableSnafu { operation, key: key.to_string(), detail: err.to_string() }.build()
}

#[async_trait::async_trait]
impl KvGateway for EtcdGateway {
    async fn get(&self, key: &str) -> Result<Option<KeyValue>> {
        let mut client = self.client.clone();
        let resp = self.call("get", key, client.get(key, None)).await?;
        Ok(resp.kvs().first().map(|kv| KeyValue {
            key: key.to_string(),
            value: kv.value().to_vec(),
            mod_revision: kv.mod_revision(),
        }))
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<KeyValue>> {
        let mut client = self.client.clone();
        let opts = GetOptions::new().with_prefix();
        let resp = self.call("scan_prefix", prefix, client.get(prefix, Some(opts))).await?;
        Ok(resp
            .kvs()
            .iter()
            .map(|kv| KeyValue {
                key: String::from_utf8_lossy(kv.key()).into_owned(),
                value: kv.value().to_vec(),
                mod_revision: kv.mod_revision(),
            })
            .collect())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut client = self.client.clone();
        self.call("put", key, client.put(key, value, None)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<i64> {
        let mut client = self.client.clone();
        let resp = self.call("delete", key, client.delete(key, None)).await?;
        Ok(resp.deleted())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<i64> {
        let mut client = self.client.clone();
        let opts = etcd_client::DeleteOptions::new().with_prefix();
        let resp = self.call("delete_prefix", prefix, client.delete(prefix, Some(opts))).await?;
        Ok(resp.deleted())
    }

    async fn grant_lease(&self, ttl_seconds: i64) -> Result<i64> {
        let mut client = self.client.clone();
        let resp = self.call("grant_lease", "", client.lease_grant(ttl_seconds, None)).await?;
        Ok(resp.id())
    }

    async fn put_with_lease(&self, key: &str, value: Vec<u8>, lease_id: i64) -> Result<()> {
        let mut client = self.client.clone();
        let opts = PutOptions::new().with_lease(lease_id);
        self.call("put_with_lease", key, client.put(key, value, Some(opts))).await?;
        Ok(())
    }

    async fn keep_alive(&self, lease_id: i64) -> Result<mpsc::Receiver<Result<()>>> {
        let mut client = self.client.clone();
        let (mut keeper, mut stream) = self
            .call("keep_alive", "", client.lease_keep_alive(lease_id))
            .await?;

        let (tx, rx) = mpsc::channel(8);
        let ttl = self.timeout.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ttl / 2);
            loop {
                ticker.tick().await;
                if let Err(err) = keeper.keep_alive().await {
                    let _ = tx.send(Err(unavailable("keep_alive", "", &err))).await;
                    return;
                }
                match stream.message().await {
                    Ok(Some(_)) => {
                        if tx.send(Ok(())).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => {
                        warn!(lease_id, "etcd keep-alive stream closed");
                        return;
                    }
                    Err(err) => {
                        let _ = tx.send(Err(unavailable("keep_alive", "", &err))).await;
                        return;
                    }
                }
            }
        });
        Ok(rx)
    }

    async fn revoke(&self, lease_id: i64) -> Result<()> {
        let mut client = self.client.clone();
        self.call("revoke", "", client.lease_revoke(lease_id)).await?;
        Ok(())
    }

    async fn try_acquire(&self, key: &str, value: Vec<u8>, lease_id: i64) -> Result<bool> {
        let mut client = self.client.clone();
        let txn = Txn::new()
            .when([Compare::version(key.as_bytes(), CompareOp::Equal, 0)])
            .and_then([TxnOp::put(key, value, Some(PutOptions::new().with_lease(lease_id)))]);
        let resp = self.call("try_acquire", key, client.txn(txn)).await?;
        Ok(resp.succeeded())
    }

    async fn watch_prefix(&self, prefix: &str) -> Result<mpsc::Receiver<WatchEvent>> {
        let mut client = self.client.clone();
        let opts = WatchOptions::new().with_prefix();
        let (_watcher, mut stream) = self
            .call("watch_prefix", prefix, client.watch(prefix, Some(opts)))
            .await?;

        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let prefix = prefix.to_owned();
        tokio::spawn(async move {
            let _watcher = _watcher;
            loop {
                match stream.message().await {
                    Ok(Some(msg)) => {
                        for event in msg.events() {
                            let Some(kv) = event.kv() else { continue };
                            let kind = match event.event_type() {
                                EventType::Put => WatchEventKind::Put,
                                EventType::Delete => WatchEventKind::Delete,
                            };
                            let watch_event = WatchEvent {
                                kind,
                                key: String::from_utf8_lossy(kv.key()).into_owned(),
                                value: kv.value().to_vec(),
                            };
                            if tx.send(watch_event).await.is_err() {
                                return;
                            }
                        }
                    }
                    Ok(None) => {
                        warn!(prefix = %prefix, "etcd watch stream closed");
                        return;
                    }
                    Err(err) => {
                        warn!(prefix = %prefix, error = %err, "etcd watch stream error");
                        return;
                    }
                }
            }
        });
        Ok(rx)
    }
}
