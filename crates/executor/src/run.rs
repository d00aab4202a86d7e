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

use chrono::Utc;
use cronmesh_model::ExecuteInfo;

use crate::command::build_command;

enum Outcome {
    Cancelled,
    TimedOut,
    Finished(std::io::Result<std::process::Output>),
}

pub(crate) async fn run_one(info: &ExecuteInfo) -> cronmesh_model::ExecuteResult {
    let start_at = Utc::now();
    let job = &info.job;

    let mut cmd = build_command(&job.command);
    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            return cronmesh_model::ExecuteResult {
                job_name:   job.name.clone(),
                output:     String::new(),
                error_text: format!("failed to spawn job: {err}"),
                start_at,
                end_at:     Utc::now(),
                exit_code:  -1,
                timed_out:  false,
            };
        }
    };

    let deadline = (job.timeout > 0).then(|| Duration::from_secs(job.timeout));
    let outcome = race(child, info, deadline).await;

    let end_at = Utc::now();
    match outcome {
        Outcome::Cancelled => cronmesh_model::ExecuteResult {
            job_name: job.name.clone(),
            output: String::new(),
            error_text: "job execution was cancelled".to_string(),
            start_at,
            end_at,
            exit_code: -1,
            timed_out: false,
        },
        Outcome::TimedOut => cronmesh_model::ExecuteResult {
            job_name: job.name.clone(),
            output: String::new(),
            error_text: "job execution timed out".to_string(),
            start_at,
            end_at,
            exit_code: -1,
            timed_out: true,
        },
        Outcome::Finished(Ok(output)) => {
            let exit_code = output.status.code().unwrap_or(-1);
            cronmesh_model::ExecuteResult {
                job_name: job.name.clone(),
                output: String::from_utf8_lossy(&output.stdout).into_owned(),
                error_text: if exit_code == 0 {
                    String::new()
                } else {
                    String::from_utf8_lossy(&output.stderr).into_owned()
                },
                start_at,
                end_at,
                exit_code,
                timed_out: false,
            }
        }
        Outcome::Finished(Err(err)) => cronmesh_model::ExecuteResult {
            job_name: job.name.clone(),
            output: String::new(),
            error_text: err.to_string(),
            start_at,
            end_at,
            exit_code: -1,
            timed_out: false,
        },
    }
}

async fn race(child: tokio::process::Child, info: &ExecuteInfo, deadline: Option<Duration>) -> Outcome {
    let wait = child.wait_with_output();
    match deadline {
        Some(timeout) => {
            tokio::select! {
                () = info.cancel_scope.cancelled() => Outcome::Cancelled,
                () = tokio::time::sleep(timeout) => Outcome::TimedOut,
                output = wait => Outcome::Finished(output),
            }
        }
        None => {
            tokio::select! {
                () = info.cancel_scope.cancelled() => Outcome::Cancelled,
                output = wait => Outcome::Finished(output),
            }
        }
    }
}
