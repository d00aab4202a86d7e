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

//! Trigger-driven background tasks shared by the master and worker
//! processes.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use cronmesh_error::Result;
//! use cronmesh_task::{Task, TaskContext, TaskManager, TaskManagerConfig};
//!
//! struct Heartbeat;
//!
//! #[async_trait::async_trait]
//! impl Task for Heartbeat {
//!     async fn work(&mut self, ctx: &TaskContext) -> Result<()> {
//!         println!("{} ticked", ctx.name());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut manager = TaskManager::start(TaskManagerConfig::default()).unwrap();
//!     let handle = manager
//!         .task(Heartbeat)
//!         .name("heartbeat")
//!         .interval(Duration::from_secs(5))
//!         .spawn();
//!     handle.pause();
//!     manager.shutdown().await.unwrap();
//! }
//! ```

mod builder;
mod config;
mod context;
mod driver;
mod err;
mod handle;
mod id;
mod manager;
mod metrics;
mod task;
mod trigger;

pub use builder::{TaskBuilder, TriggerNotSet, TriggerSet};
pub use config::TaskManagerConfig;
pub use context::TaskContext;
pub use err::CronParseError;
pub use handle::TaskHandle;
pub use id::TaskId;
pub use manager::TaskManager;
pub use task::Task;
pub use trigger::Trigger;
