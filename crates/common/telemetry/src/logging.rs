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

use std::{io::IsTerminal, sync::Once};

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Output format for log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Machine-parseable, one JSON object per line.
    Json,
    /// Human-readable, for local development.
    #[default]
    Text,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Logging configuration, filled in from [`crate::config`] surfaces (master
/// or worker) and handed to [`init_logging`] once at process start.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, SmartDefault)]
#[serde(default)]
pub struct LoggingOptions {
    /// `EnvFilter` directive string, e.g. `"info,cronmesh_worker=debug"`.
    /// Falls back to `RUST_LOG`, then `"info"`.
    pub level: Option<String>,
    /// Text or JSON output.
    pub format: LogFormat,
    /// Whether to write to stdout. Disabling this without another sink
    /// configured leaves the process silent; callers are expected to keep
    /// this on in practice.
    #[default = true]
    pub stdout: bool,
}

const DEFAULT_LOG_TARGETS: &str = "info";

/// Initialize the global `tracing` subscriber. Safe to call more than once;
/// only the first call takes effect.
///
/// Returns a [`WorkerGuard`] that must be kept alive for the process
/// lifetime — dropping it stops the non-blocking writer thread.
#[must_use]
pub fn init_logging(opts: &LoggingOptions) -> Option<WorkerGuard> {
    static START: Once = Once::new();
    let mut guard = None;

    START.call_once(|| {
        if !opts.stdout {
            return;
        }

        let (writer, worker_guard) = tracing_appender::non_blocking(std::io::stdout());
        guard = Some(worker_guard);

        let filter = opts
            .level
            .clone()
            .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
            .unwrap_or_else(|| DEFAULT_LOG_TARGETS.to_string());
        let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_TARGETS));

        let ansi = std::io::stdout().is_terminal();
        let registry = tracing_subscriber::registry().with(filter);

        let result = if opts.format == LogFormat::Json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_ansi(ansi),
                )
                .try_init()
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(ansi),
                )
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("logging already initialized: {err}");
        }
    });

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_text() {
        assert_eq!(LoggingOptions::default().format, LogFormat::Text);
    }

    #[test]
    fn init_logging_is_idempotent() {
        let opts = LoggingOptions::default();
        let _guard1 = init_logging(&opts);
        let _guard2 = init_logging(&opts);
    }
}
