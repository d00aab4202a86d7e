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

//! The KV Gateway: the only place in cronmesh that speaks etcd wire
//! protocol. Everything above this crate (locks, job/worker registries,
//! the worker's job cache) depends on the [`KvGateway`] trait, never on
//! `etcd-client` directly.

mod etcd;
mod gateway;
mod types;

pub use etcd::EtcdGateway;
pub use gateway::KvGateway;
pub use types::{KeyValue, WatchEvent, WatchEventKind};
