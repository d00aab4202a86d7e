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

use lazy_static::lazy_static;
use prometheus::*;

const TASK_LABEL: &str = "task";

lazy_static! {
    pub static ref TASK_STARTED: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_started_total",
        "Total number of tasks started",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_STOPPED: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_stopped_total",
        "Total number of tasks stopped gracefully",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_ERRORS: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_errors_total",
        "Total number of tasks that stopped due to an error",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_START_ERRORS: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_start_errors_total",
        "Total number of on_start failures",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_SHUTDOWN_ERRORS: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_shutdown_errors_total",
        "Total number of on_shutdown failures",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_EXECUTIONS: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_executions_total",
        "Total number of task work() invocations",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_EXECUTION_ERRORS: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_execution_errors_total",
        "Total number of work() invocations that returned an error",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_PAUSED: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_paused_total",
        "Total number of times a task was paused",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_RESUMED: IntCounterVec = register_int_counter_vec!(
        "cronmesh_task_resumed_total",
        "Total number of times a task was resumed",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_ACTIVE: IntGaugeVec = register_int_gauge_vec!(
        "cronmesh_task_active",
        "Whether a task is currently active (1) or not (0)",
        &[TASK_LABEL]
    )
    .unwrap();
    pub static ref TASK_EXECUTION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "cronmesh_task_execution_duration_seconds",
        "Task work() duration in seconds",
        &[TASK_LABEL]
    )
    .unwrap();
}
