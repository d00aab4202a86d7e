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

//! Request/response DTOs for the cronmesh control API. Kept dependency-free
//! of any HTTP framework so the wire shapes can be reused by a future
//! non-REST transport without pulling in axum.

mod envelope;
mod job;
mod log;

pub use cronmesh_logstore::LogStatistics;
pub use cronmesh_master::WorkerStats;
pub use cronmesh_model::{Job, JobLog, WorkerInfo};

pub use crate::{
    envelope::Envelope,
    job::{JobRequest, JobSearchQuery},
    log::{LogListQuery, LogStatisticsQuery, Page},
};
