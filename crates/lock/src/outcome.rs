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

use crate::guard::JobLockGuard;

/// Result of a single lock attempt. `HeldElsewhere` is an expected,
/// silently-handled outcome — another worker won this tick.
pub enum LockOutcome {
    Acquired(JobLockGuard),
    HeldElsewhere,
}

impl LockOutcome {
    #[must_use]
    pub fn into_guard(self) -> Option<JobLockGuard> {
        match self {
            Self::Acquired(guard) => Some(guard),
            Self::HeldElsewhere => None,
        }
    }
}
