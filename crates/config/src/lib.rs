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

//! One typed config struct shared by the `master` and `worker` subcommands.
//! Callers build a [`Config`] from flags (or take the defaults below), then
//! call [`Config::layered`] to overlay environment variables on top and
//! validate the result in one call. Environment variables are the last word
//! since they're how an orchestrator overrides a container's command line
//! without rewriting it.

use std::time::Duration;

use bon::Builder;
use smart_default::SmartDefault;
use snafu::{ResultExt, Snafu};
use validator::Validate;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    #[snafu(display("invalid configuration: {source}"))]
    Invalid {
        #[snafu(source)]
        source: validator::ValidationErrors,
    },

    #[snafu(display("environment variable {name} could not be parsed: {detail}"))]
    BadEnvVar { name: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything either process needs: both read the whole struct and use only
/// the sections relevant to their role.
#[derive(Debug, Clone, SmartDefault, Builder, Validate)]
pub struct Config {
    #[validate(length(min = 1))]
    #[default(_code = "vec![\"127.0.0.1:2379\".to_string()]")]
    #[builder(default = vec!["127.0.0.1:2379".to_string()])]
    pub etcd_endpoints: Vec<String>,
    #[default(_code = "Duration::from_secs(5)")]
    #[builder(default = Duration::from_secs(5))]
    pub etcd_dial_timeout: Duration,

    #[validate(length(min = 1))]
    #[default = "worker-1"]
    #[builder(default = "worker-1".to_string())]
    pub worker_id: String,
    #[default(_code = "Duration::from_secs(5)")]
    #[builder(default = Duration::from_secs(5))]
    pub heartbeat_interval: Duration,

    #[validate(range(min = 1))]
    #[default = 100]
    #[builder(default = 100)]
    pub log_batch_size: usize,
    #[default(_code = "Duration::from_secs(5)")]
    #[builder(default = Duration::from_secs(5))]
    pub log_commit_timeout: Duration,
    #[validate(range(min = 1))]
    #[default = 30]
    #[builder(default = 30)]
    pub log_retention_days: i64,
    #[default(_code = "Duration::from_secs(300)")]
    #[builder(default = Duration::from_secs(300))]
    pub job_cache_resync_interval: Duration,

    #[validate(range(min = 1))]
    pub executor_threads: Option<usize>,

    #[validate(range(min = 1))]
    #[default = 30]
    #[builder(default = 30)]
    pub job_lock_ttl_seconds: i64,

    #[validate(length(min = 1))]
    #[default = "0.0.0.0:8080"]
    #[builder(default = "0.0.0.0:8080".to_string())]
    pub api_bind_address: String,

    #[validate(length(min = 1))]
    #[default = "mongodb://127.0.0.1:27017"]
    #[builder(default = "mongodb://127.0.0.1:27017".to_string())]
    pub mongo_uri: String,
    #[validate(length(min = 1))]
    #[default = "cronmesh"]
    #[builder(default = "cronmesh".to_string())]
    pub mongo_database: String,
    #[default(_code = "Duration::from_secs(10)")]
    #[builder(default = Duration::from_secs(10))]
    pub mongo_connect_timeout: Duration,
}

impl Config {
    /// Applies the environment overlay over whatever was already set (by
    /// defaults or by a builder caller), then validates.
    pub fn layered(self) -> Result<Self> { self.layered_from(|name| std::env::var(name).ok()) }

    /// Same as [`Self::layered`] but reads variables through `lookup`
    /// instead of the process environment, so the overlay logic is
    /// testable without touching real env state.
    fn layered_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        self.apply_env(&lookup)?;
        self.validate().context(InvalidSnafu)?;
        Ok(self)
    }

    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = env_var(lookup, "CRONMESH_ETCD_ENDPOINTS") {
            self.etcd_endpoints =
                value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
        }
        if let Some(seconds) = env_duration_seconds(lookup, "CRONMESH_ETCD_DIAL_TIMEOUT_SECONDS")? {
            self.etcd_dial_timeout = seconds;
        }
        if let Some(value) = env_var(lookup, "CRONMESH_WORKER_ID") {
            self.worker_id = value;
        }
        if let Some(seconds) = env_duration_seconds(lookup, "CRONMESH_HEARTBEAT_INTERVAL_SECONDS")? {
            self.heartbeat_interval = seconds;
        }
        if let Some(value) = env_number::<usize>(lookup, "CRONMESH_LOG_BATCH_SIZE")? {
            self.log_batch_size = value;
        }
        if let Some(seconds) = env_duration_seconds(lookup, "CRONMESH_LOG_COMMIT_TIMEOUT_SECONDS")? {
            self.log_commit_timeout = seconds;
        }
        if let Some(value) = env_number::<i64>(lookup, "CRONMESH_LOG_RETENTION_DAYS")? {
            self.log_retention_days = value;
        }
        if let Some(seconds) = env_duration_seconds(lookup, "CRONMESH_JOB_CACHE_RESYNC_INTERVAL_SECONDS")? {
            self.job_cache_resync_interval = seconds;
        }
        if let Some(value) = env_number::<usize>(lookup, "CRONMESH_EXECUTOR_THREADS")? {
            self.executor_threads = Some(value);
        }
        if let Some(value) = env_number::<i64>(lookup, "CRONMESH_JOB_LOCK_TTL_SECONDS")? {
            self.job_lock_ttl_seconds = value;
        }
        if let Some(value) = env_var(lookup, "CRONMESH_API_BIND_ADDRESS") {
            self.api_bind_address = value;
        }
        if let Some(value) = env_var(lookup, "CRONMESH_MONGO_URI") {
            self.mongo_uri = value;
        }
        if let Some(value) = env_var(lookup, "CRONMESH_MONGO_DATABASE") {
            self.mongo_database = value;
        }
        if let Some(seconds) = env_duration_seconds(lookup, "CRONMESH_MONGO_CONNECT_TIMEOUT_SECONDS")? {
            self.mongo_connect_timeout = seconds;
        }
        Ok(())
    }
}

fn env_var(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Option<String> {
    lookup(name).filter(|value| !value.is_empty())
}

fn env_number<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(lookup, name) {
        Some(raw) => {
            raw.parse::<T>().map(Some).map_err(|err| ConfigError::BadEnvVar { name, detail: err.to_string() })
        }
        None => Ok(None),
    }
}

fn env_duration_seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>> {
    Ok(env_number::<u64>(lookup, name)?.map(Duration::from_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() { assert!(Config::default().validate().is_ok()); }

    #[test]
    fn layered_overlays_environment_variables() {
        let config = Config::default()
            .layered_from(|name| (name == "CRONMESH_WORKER_ID").then(|| "worker-from-env".to_string()))
            .unwrap();
        assert_eq!(config.worker_id, "worker-from-env");
    }

    #[test]
    fn layered_rejects_an_unparseable_numeric_override() {
        let err = Config::default()
            .layered_from(|name| (name == "CRONMESH_LOG_RETENTION_DAYS").then(|| "not-a-number".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::BadEnvVar { .. }));
    }

    #[test]
    fn builder_flags_beat_defaults_before_the_env_overlay_runs() {
        let config = Config::builder().worker_id("worker-from-flag".to_string()).build();
        assert_eq!(config.worker_id, "worker-from-flag");
    }

    #[test]
    fn empty_worker_id_fails_validation() {
        let config = Config::builder().worker_id(String::new()).build();
        assert!(config.validate().is_err());
    }
}
