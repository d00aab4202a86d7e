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

const DEFAULT_STATISTICS_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStatisticsQuery {
    #[serde(default = "default_statistics_window_days")]
    pub days: i64,
}

impl Default for LogStatisticsQuery {
    fn default() -> Self { Self { days: DEFAULT_STATISTICS_WINDOW_DAYS } }
}

fn default_statistics_window_days() -> i64 { DEFAULT_STATISTICS_WINDOW_DAYS }

/// A page of `items` out of `total` matching records, as returned by
/// [`cronmesh_logstore::LogManager::list`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64) -> Self { Self { items, total } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_query_defaults_to_a_week() {
        let query: LogStatisticsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.days, 7);
    }

    #[test]
    fn list_query_defaults_to_zero_meaning_unpaginated() {
        let query: LogListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.page_size, 0);
    }
}
