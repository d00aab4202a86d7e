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

//! Data model and KV namespace shared by every other `cronmesh-*` crate.

mod cron;
mod event;
mod execute;
mod job;
mod log;
pub mod keys;
mod plan;
mod worker_info;

pub use cron::CompiledCron;
pub use event::JobEvent;
pub use execute::ExecuteResult;
pub use job::Job;
pub use log::JobLog;
pub use plan::{ExecuteInfo, SchedulePlan};
pub use worker_info::WorkerInfo;
