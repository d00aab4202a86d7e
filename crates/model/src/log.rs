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
use serde::{Deserialize, Serialize};

use crate::execute::ExecuteResult;

/// Denormalized execution record, written once by the log sink and never
/// mutated. Indexed `(jobName asc, startAt desc)` in the log store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLog {
    pub job_name: String,
    pub command: String,
    pub output: String,
    pub error_text: String,
    pub planned_fire_at: DateTime<Utc>,
    pub actual_dispatch_at: DateTime<Utc>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub exit_code: i32,
    pub timed_out: bool,
    pub worker_id: String,
}

impl JobLog {
    #[must_use]
    pub fn from_result(
        command: &str,
        planned_fire_at: DateTime<Utc>,
        actual_dispatch_at: DateTime<Utc>,
        worker_id: &str,
        result: ExecuteResult,
    ) -> Self {
        JobLog {
            job_name: result.job_name,
            command: command.to_string(),
            output: result.output,
            error_text: result.error_text,
            planned_fire_at,
            actual_dispatch_at,
            start_at: result.start_at,
            end_at: result.end_at,
            exit_code: result.exit_code,
            timed_out: result.timed_out,
            worker_id: worker_id.to_string(),
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool { self.exit_code == 0 }

    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        (self.end_at - self.start_at).num_milliseconds().max(0) as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_seconds_is_never_negative() {
        let now = Utc::now();
        let log = JobLog {
            job_name:           "j".into(),
            command:            "c".into(),
            output:             String::new(),
            error_text:         String::new(),
            planned_fire_at:    now,
            actual_dispatch_at: now,
            start_at:           now,
            end_at:             now,
            exit_code:          0,
            timed_out:          false,
            worker_id:          "w1".into(),
        };
        assert_eq!(log.duration_seconds(), 0.0);
        assert!(log.succeeded());
    }
}
