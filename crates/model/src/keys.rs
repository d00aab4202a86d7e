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

//! The KV key namespace, centralized so every crate builds keys the same
//! way. Lock markers and kill markers are split into separate namespaces
//! (`/cron/lock/*` vs `/cron/kill/*`) rather than sharing one, since a single
//! namespace leaves a watcher unable to tell "someone holds the lock" apart
//! from "the master wants this job killed".

pub const JOBS_PREFIX: &str = "/cron/jobs/";
pub const WORKERS_PREFIX: &str = "/cron/workers/";
pub const LOCK_PREFIX: &str = "/cron/lock/";
pub const KILL_PREFIX: &str = "/cron/kill/";

#[must_use]
pub fn job_key(name: &str) -> String { format!("{JOBS_PREFIX}{name}") }

#[must_use]
pub fn worker_key(id: &str) -> String { format!("{WORKERS_PREFIX}{id}") }

#[must_use]
pub fn lock_key(job_name: &str) -> String { format!("{LOCK_PREFIX}{job_name}") }

#[must_use]
pub fn kill_key(job_name: &str) -> String { format!("{KILL_PREFIX}{job_name}") }

/// Strips a well-known prefix off a full key, returning the remainder (the
/// job name, worker id, ...). Returns `None` if `key` does not start with
/// `prefix`.
#[must_use]
pub fn strip_prefix<'a>(key: &'a str, prefix: &str) -> Option<&'a str> { key.strip_prefix(prefix) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_roundtrip_through_strip_prefix() {
        let key = job_key("greet");
        assert_eq!(key, "/cron/jobs/greet");
        assert_eq!(strip_prefix(&key, JOBS_PREFIX), Some("greet"));
    }

    #[test]
    fn lock_and_kill_keys_are_namespaced_apart() {
        assert_ne!(lock_key("greet"), kill_key("greet"));
    }
}
