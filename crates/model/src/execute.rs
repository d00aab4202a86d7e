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

/// What the executor hands back to the scheduler once a run finishes.
#[derive(Debug, Clone)]
pub struct ExecuteResult {
    pub job_name: String,
    pub output: String,
    pub error_text: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub exit_code: i32,
    pub timed_out: bool,
}
