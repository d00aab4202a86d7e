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

lazy_static! {
    pub static ref JOB_EVENTS_DROPPED: IntCounter = register_int_counter!(
        "cronmesh_worker_job_events_dropped_total",
        "Job cache events dropped because the event channel was full"
    )
    .unwrap();
    pub static ref LOG_INGRESS_DROPPED: IntCounter = register_int_counter!(
        "cronmesh_worker_log_ingress_dropped_total",
        "Execution results dropped because the log sink's ingress channel was full"
    )
    .unwrap();
    pub static ref LOG_FLUSH_FAILURES: IntCounter = register_int_counter!(
        "cronmesh_worker_log_flush_failures_total",
        "Log sink batch flushes that failed and were discarded"
    )
    .unwrap();
    pub static ref JOBS_DISPATCHED: IntCounter = register_int_counter!(
        "cronmesh_worker_jobs_dispatched_total",
        "Jobs handed to the executor after winning the dispatch lock"
    )
    .unwrap();
    pub static ref JOBS_LOCK_CONTENDED: IntCounter = register_int_counter!(
        "cronmesh_worker_jobs_lock_contended_total",
        "Dispatch attempts that lost the distributed lock to another worker"
    )
    .unwrap();
}
