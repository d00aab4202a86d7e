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

use std::time::Duration;

/// When a task should run.
///
/// # Examples
///
/// ```rust
/// use std::{str::FromStr, time::Duration};
///
/// use cronmesh_task::Trigger;
///
/// let trigger = Trigger::Interval(Duration::from_secs(5));
/// let cron = croner::Cron::from_str("0 */15 * * * *").unwrap();
/// let trigger = Trigger::Cron(cron);
/// ```
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Fire at a fixed period. Missed ticks are skipped rather than queued.
    Interval(Duration),
    /// Fire at the next occurrence of a six-field (seconds-resolution) cron
    /// expression.
    Cron(croner::Cron),
}
