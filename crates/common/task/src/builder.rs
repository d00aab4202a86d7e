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

//! Type-state builder: a [`Trigger`] must be chosen before `spawn()` is
//! callable, enforced at compile time rather than by a runtime panic.
//!
//! The builder progresses `TriggerNotSet` -> `TriggerSet` -> `spawn()`.

use std::{marker::PhantomData, str::FromStr, time::Duration};

use snafu::ResultExt;

use crate::{err::CronParseError, handle::TaskHandle, manager::TaskManager, task::Task, trigger::Trigger};

/// Initial builder state - no trigger chosen yet.
pub struct TriggerNotSet;
/// A trigger has been chosen; `spawn()` becomes available.
pub struct TriggerSet;

/// Configures and spawns a [`Task`] onto a [`TaskManager`].
///
/// # Example
///
/// ```rust,no_run
/// # use cronmesh_task::{TaskManager, TaskManagerConfig, Task, TaskContext};
/// # use cronmesh_error::Result;
/// # use std::time::Duration;
/// # struct Heartbeat;
/// # #[async_trait::async_trait]
/// # impl Task for Heartbeat {
/// #     async fn work(&mut self, _ctx: &TaskContext) -> Result<()> { Ok(()) }
/// # }
/// # #[tokio::main]
/// # async fn main() {
/// let mut manager = TaskManager::start(TaskManagerConfig::default()).unwrap();
/// let handle = manager.task(Heartbeat).name("heartbeat").interval(Duration::from_secs(5)).spawn();
/// handle.pause();
/// # }
/// ```
pub struct TaskBuilder<'m, T, S> {
    manager: &'m mut TaskManager,
    task:    T,
    name:    Option<&'static str>,
    trigger: Option<Trigger>,
    _state:  PhantomData<S>,
}

impl<'m, T> TaskBuilder<'m, T, TriggerNotSet>
where
    T: Task,
{
    pub(crate) fn new(manager: &'m mut TaskManager, task: T) -> Self {
        TaskBuilder {
            manager,
            task,
            name: None,
            trigger: None,
            _state: PhantomData,
        }
    }

    /// Runs the task at a fixed period. Missed ticks are skipped, never
    /// queued up.
    #[must_use]
    pub fn interval(self, period: Duration) -> TaskBuilder<'m, T, TriggerSet> {
        TaskBuilder {
            manager: self.manager,
            task:    self.task,
            name:    self.name,
            trigger: Some(Trigger::Interval(period)),
            _state:  PhantomData,
        }
    }

    /// Runs the task on a six-field (seconds-resolution) cron schedule.
    ///
    /// # Errors
    ///
    /// Returns [`CronParseError`] if `expr` does not parse.
    pub fn cron(self, expr: &str) -> Result<TaskBuilder<'m, T, TriggerSet>, CronParseError> {
        let cron = croner::Cron::from_str(expr).context(crate::err::InvalidExpressionSnafu)?;
        Ok(TaskBuilder {
            manager: self.manager,
            task:    self.task,
            name:    self.name,
            trigger: Some(Trigger::Cron(cron)),
            _state:  PhantomData,
        })
    }
}

impl<'m, T, S> TaskBuilder<'m, T, S>
where
    T: Task,
{
    /// Sets the task's name, used for logging and as a metrics label.
    /// Defaults to `"unnamed-task"`.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }
}

impl<'m, T> TaskBuilder<'m, T, TriggerSet>
where
    T: Task,
{
    /// Spawns the task and returns a [`TaskHandle`]. The task starts
    /// immediately; the trigger governs the cadence of subsequent runs.
    pub fn spawn(self) -> TaskHandle {
        let name = self.name.unwrap_or("unnamed-task");
        self.manager.spawn_task(self.task, name, self.trigger.expect("trigger set by type-state"))
    }
}
