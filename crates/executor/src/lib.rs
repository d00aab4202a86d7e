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

//! Runs job commands under a cancellation scope with an optional wall-clock
//! deadline, capturing stdout/stderr and reporting results on a channel the
//! scheduler is never allowed to lose data off of.

mod command;
mod run;

use std::sync::Arc;

use cronmesh_error::{NotFoundSnafu, Result};
use cronmesh_model::{ExecuteInfo, ExecuteResult};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;

/// Default capacity of the result channel between executor tasks and the
/// scheduler. The sender blocks rather than drops once this fills.
pub const RESULT_CHANNEL_CAPACITY: usize = 1000;

pub struct Executor {
    results_tx: mpsc::Sender<ExecuteResult>,
    scopes: Arc<DashMap<String, tokio_util::sync::CancellationToken>>,
}

impl Executor {
    #[must_use]
    pub fn new(results_tx: mpsc::Sender<ExecuteResult>) -> Self {
        Self { results_tx, scopes: Arc::new(DashMap::new()) }
    }

    /// Spawns the subprocess described by `info` as a concurrent task. The
    /// result is sent on the result channel once the child exits, is
    /// cancelled, or times out; the send blocks if the channel is full.
    pub fn execute(&self, info: ExecuteInfo) {
        let job_name = info.job.name.clone();
        self.scopes.insert(job_name.clone(), info.cancel_scope.clone());

        let results_tx = self.results_tx.clone();
        let scopes = self.scopes.clone();
        tokio::spawn(async move {
            let result = run::run_one(&info).await;
            scopes.remove(&job_name);
            if results_tx.send(result).await.is_err() {
                warn!(job = %job_name, "result channel closed, dropping execute result");
            }
        });
    }

    /// Cancels the job's execution scope. Idempotent: cancelling an
    /// already-cancelled token is a no-op.
    pub fn kill(&self, job_name: &str) -> Result<()> {
        match self.scopes.get(job_name) {
            Some(scope) => {
                scope.cancel();
                Ok(())
            }
            None => NotFoundSnafu { operation: "kill", key: job_name.to_string() }.fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cronmesh_model::Job;
    use tokio_util::sync::CancellationToken;

    use super::*;

    fn job(name: &str, command: &str, timeout: u64) -> Job {
        Job {
            name: name.to_string(),
            command: command.to_string(),
            cron_expr: "* * * * * *".to_string(),
            timeout,
            disabled: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn successful_command_reports_zero_exit_code() {
        let (tx, mut rx) = mpsc::channel(8);
        let executor = Executor::new(tx);
        let info = ExecuteInfo {
            job: job("echo", "echo hello", 0),
            planned_fire_at: chrono::Utc::now(),
            actual_dispatch_at: chrono::Utc::now(),
            cancel_scope: CancellationToken::new(),
        };
        executor.execute(info);

        let result = rx.recv().await.expect("result");
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("hello"));
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn timeout_is_reported_on_slow_command() {
        let (tx, mut rx) = mpsc::channel(8);
        let executor = Executor::new(tx);
        let info = ExecuteInfo {
            job: job("slow", "sleep 5", 1),
            planned_fire_at: chrono::Utc::now(),
            actual_dispatch_at: chrono::Utc::now(),
            cancel_scope: CancellationToken::new(),
        };
        executor.execute(info);

        let result = rx.recv().await.expect("result");
        assert!(result.timed_out);
        assert_eq!(result.exit_code, -1);
    }

    #[tokio::test]
    async fn kill_cancels_a_running_job() {
        let (tx, mut rx) = mpsc::channel(8);
        let executor = Executor::new(tx);
        let info = ExecuteInfo {
            job: job("sleeper", "sleep 5", 0),
            planned_fire_at: chrono::Utc::now(),
            actual_dispatch_at: chrono::Utc::now(),
            cancel_scope: CancellationToken::new(),
        };
        executor.execute(info);
        tokio::time::sleep(Duration::from_millis(50)).await;
        executor.kill("sleeper").unwrap();

        let result = rx.recv().await.expect("result");
        assert_eq!(result.error_text, "job execution was cancelled");
    }

    #[tokio::test]
    async fn kill_on_unknown_job_is_not_found() {
        let (tx, _rx) = mpsc::channel(8);
        let executor = Executor::new(tx);
        assert!(executor.kill("missing").is_err());
    }
}
