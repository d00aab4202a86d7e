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

use crate::job::Job;

/// Emitted by the worker job cache for every watch delta. Ephemeral — never
/// persisted, consumed once by the scheduler.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Save(Job),
    /// Carries the job as it was last cached, since a KV delete event has no
    /// value to decode.
    Delete(Job),
}

impl JobEvent {
    #[must_use]
    pub fn job(&self) -> &Job {
        match self {
            Self::Save(job) | Self::Delete(job) => job,
        }
    }
}
