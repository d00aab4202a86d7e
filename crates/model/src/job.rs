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

use serde::{Deserialize, Serialize};

/// A job definition, persisted at `/cron/jobs/<name>`.
///
/// `name` is the immutable identifier; every other field is mutable through
/// the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    pub command: String,
    /// Six-field (seconds-resolution) cron expression.
    pub cron_expr: String,
    /// Wall-clock seconds before the executor cancels the run. `0` means no
    /// timeout.
    pub timeout: u64,
    pub disabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Job {
    #[must_use]
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        if keyword.is_empty() {
            return true;
        }
        let keyword = keyword.to_lowercase();
        self.name.to_lowercase().contains(&keyword) || self.command.to_lowercase().contains(&keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job {
            name:       "greet".into(),
            command:    "echo hi".into(),
            cron_expr:  "* * * * * *".into(),
            timeout:    0,
            disabled:   false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn empty_keyword_matches_everything() { assert!(job().matches_keyword("")); }

    #[test]
    fn keyword_matches_name_or_command_case_insensitively() {
        assert!(job().matches_keyword("GREET"));
        assert!(job().matches_keyword("echo"));
        assert!(!job().matches_keyword("nonexistent"));
    }
}
