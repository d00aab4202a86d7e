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

use crate::context::TaskContext;

/// Strategy for waiting out a [`crate::Trigger`] between executions.
pub(crate) enum TriggerDriver {
    Interval(IntervalDriver),
    Cron(CronDriver),
}

impl TriggerDriver {
    pub fn from_trigger(trigger: crate::trigger::Trigger) -> Self {
        match trigger {
            crate::trigger::Trigger::Interval(d) => Self::Interval(IntervalDriver::new(d)),
            crate::trigger::Trigger::Cron(c) => Self::Cron(CronDriver::new(c)),
        }
    }

    /// Waits for the next firing. Returns `false` if the context was
    /// cancelled while waiting, in which case the caller should stop.
    pub async fn wait_next(&mut self, ctx: &TaskContext) -> bool {
        match self {
            Self::Interval(d) => d.wait_next(ctx).await,
            Self::Cron(d) => d.wait_next(ctx).await,
        }
    }
}

pub(crate) struct IntervalDriver {
    interval: tokio::time::Interval,
}

impl IntervalDriver {
    fn new(duration: Duration) -> Self {
        let mut interval = tokio::time::interval(duration);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        Self { interval }
    }

    async fn wait_next(&mut self, ctx: &TaskContext) -> bool {
        tokio::select! {
            _ = self.interval.tick() => true,
            () = ctx.cancelled() => false,
        }
    }
}

pub(crate) struct CronDriver {
    cron: croner::Cron,
}

impl CronDriver {
    const fn new(cron: croner::Cron) -> Self { Self { cron } }

    async fn wait_next(&mut self, ctx: &TaskContext) -> bool {
        let now = chrono::Utc::now();
        let Ok(next) = self.cron.find_next_occurrence(&now, false) else {
            ctx.cancelled().await;
            return false;
        };

        let now = chrono::Utc::now();
        if next > now {
            let duration = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                () = tokio::time::sleep(duration) => true,
                () = ctx.cancelled() => false,
            }
        } else {
            true
        }
    }
}
