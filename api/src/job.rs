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

use cronmesh_model::Job;
use serde::{Deserialize, Serialize};

/// Body for both job creation and job update; the name on the URL path
/// wins over this one when the two are used together.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub name: String,
    pub command: String,
    pub cron_expr: String,
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub disabled: bool,
}

impl JobRequest {
    /// `created_at`/`updated_at` are left at zero; [`cronmesh_master::JobRegistry::save`]
    /// stamps `created_at` only when it's zero and always refreshes
    /// `updated_at`, so the caller decides whether this is a fresh job or
    /// an update by whether it looked the existing one up first.
    #[must_use]
    pub fn into_job(self) -> Job {
        Job {
            name: self.name,
            command: self.command,
            cron_expr: self.cron_expr,
            timeout: self.timeout,
            disabled: self.disabled,
            created_at: 0,
            updated_at: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSearchQuery {
    #[serde(default)]
    pub keyword: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_job_defaults_timestamps_to_zero() {
        let request = JobRequest {
            name: "greet".into(),
            command: "echo hi".into(),
            cron_expr: "* * * * * *".into(),
            timeout: 0,
            disabled: false,
        };
        let job = request.into_job();
        assert_eq!(job.created_at, 0);
        assert_eq!(job.updated_at, 0);
    }

    #[test]
    fn request_deserializes_camel_case_with_defaults() {
        let request: JobRequest =
            serde_json::from_str(r#"{"name":"greet","command":"echo hi","cronExpr":"* * * * * *"}"#).unwrap();
        assert_eq!(request.timeout, 0);
        assert!(!request.disabled);
    }
}
