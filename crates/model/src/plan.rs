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
use tokio_util::sync::CancellationToken;

use crate::{cron::CompiledCron, job::Job};

/// Scheduler-local entry for one enabled, parseable job. Never persisted.
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    pub job: Job,
    pub parsed_expr: CompiledCron,
    pub next_fire_at: DateTime<Utc>,
}

impl SchedulePlan {
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool { self.next_fire_at <= now }
}

/// One in-flight execution, keyed by job name in the scheduler's in-flight
/// table. At most one per job name per worker at any instant.
#[derive(Clone)]
pub struct ExecuteInfo {
    pub job: Job,
    pub planned_fire_at: DateTime<Utc>,
    pub actual_dispatch_at: DateTime<Utc>,
    pub cancel_scope: CancellationToken,
}
