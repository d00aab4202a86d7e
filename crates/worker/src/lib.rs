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

//! Worker process runtime: job cache, registration, scheduling, and log
//! shipping. [`WorkerRuntime`] ties the pieces together; the individual
//! components are exported for testing and for processes that want to
//! drive them directly.

mod job_cache;
mod log_sink;
mod metrics;
mod register;
mod runtime;
mod scheduler;

pub use job_cache::JobCache;
pub use log_sink::{LogSink, LogSinkHandle, RetentionSweep};
pub use register::Register;
pub use runtime::{WorkerRuntime, WorkerRuntimeConfig};
pub use scheduler::Scheduler;
