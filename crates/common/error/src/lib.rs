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

//! Shared error vocabulary for cronmesh.
//!
//! Every core component surfaces one of the error kinds below rather than an
//! opaque `anyhow::Error`, so that the scheduler can tell `AlreadyHeld` (an
//! expected, silently-handled condition) apart from `Transient` (retried
//! implicitly on the next tick) and `Fatal` (abort the process).

use std::any::Any;

use http::StatusCode as HttpStatusCode;
use serde::Serialize;
use snafu::Snafu;
use strum::EnumProperty;

/// Coarse classification of a [`Error`], used to pick an HTTP status for the
/// control API and to decide whether a caller should retry.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Serialize,
    strum_macros::EnumProperty,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusCode {
    /// Expected absence: no such job, no such log.
    #[strum(props(http_status = "404"))]
    NotFound,
    /// Lock contention on `/cron/lock/<job>`; another worker won this tick.
    #[strum(props(http_status = "409"))]
    AlreadyHeld,
    /// Malformed/empty job fields or an unparseable cron expression.
    #[strum(props(http_status = "400"))]
    InvalidInput,
    /// KV timeout or connection blip; retried implicitly, never inside the
    /// failing call.
    #[strum(props(http_status = "503"))]
    Unavailable,
    /// An operation's internal deadline elapsed.
    #[strum(props(http_status = "504"))]
    Timeout,
    /// A value in the KV store or log store could not be decoded.
    #[strum(props(http_status = "500"))]
    Serialization,
    /// Process-level failure that should abort startup.
    #[strum(props(http_status = "500"))]
    Fatal,
    #[strum(props(http_status = "500"))]
    Unknown,
}

impl StatusCode {
    #[must_use]
    pub fn http_status(self) -> HttpStatusCode {
        self.get_str("http_status")
            .and_then(|value| value.parse::<u16>().ok())
            .and_then(|value| HttpStatusCode::from_u16(value).ok())
            .unwrap_or(HttpStatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Whether a caller may reasonably retry after this class of failure.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Unavailable | Self::Timeout)
    }
}

/// Implemented by every crate-local error enum so the API layer can render a
/// uniform envelope without knowing the concrete error type.
pub trait ErrorExt: std::error::Error {
    fn status_code(&self) -> StatusCode { StatusCode::Unknown }

    fn as_any(&self) -> &dyn Any;

    /// Message safe to show a caller: internal failures are redacted to a
    /// generic message, everything else renders the `Display` chain.
    fn output_msg(&self) -> String
    where
        Self: Sized,
    {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Fatal | StatusCode::Serialization => {
                format!("internal error: {:?}", self.status_code())
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The KV-namespaced operations that can fail, shared across
/// `cronmesh-kv`/`cronmesh-lock`/`cronmesh-master` so every caller reports
/// failures the same way.
#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{operation}: no value at {key}"))]
    NotFound {
        operation: &'static str,
        key: String,
    },

    #[snafu(display("{operation}: {key} already held"))]
    AlreadyHeld {
        operation: &'static str,
        key: String,
    },

    #[snafu(display("invalid input: {reason}"))]
    InvalidInput { reason: String },

    #[snafu(display("{operation} on {key} timed out or was unavailable: {detail}"))]
    Unavailable {
        operation: &'static str,
        key: String,
        detail: String,
    },

    #[snafu(display("{operation} on {key} exceeded its deadline"))]
    Timeout {
        operation: &'static str,
        key: String,
    },

    #[snafu(display("failed to (de)serialize value for {key}: {detail}"))]
    Serialization { key: String, detail: String },

    #[snafu(display("fatal startup failure: {reason}"))]
    Fatal { reason: String },
}

impl ErrorExt for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NotFound,
            Self::AlreadyHeld { .. } => StatusCode::AlreadyHeld,
            Self::InvalidInput { .. } => StatusCode::InvalidInput,
            Self::Unavailable { .. } => StatusCode::Unavailable,
            Self::Timeout { .. } => StatusCode::Timeout,
            Self::Serialization { .. } => StatusCode::Serialization,
            Self::Fatal { .. } => StatusCode::Fatal,
        }
    }

    fn as_any(&self) -> &dyn Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_sensible_http() {
        assert_eq!(StatusCode::NotFound.http_status(), HttpStatusCode::NOT_FOUND);
        assert_eq!(StatusCode::AlreadyHeld.http_status(), HttpStatusCode::CONFLICT);
        assert_eq!(StatusCode::InvalidInput.http_status(), HttpStatusCode::BAD_REQUEST);
        assert!(StatusCode::Unavailable.is_retryable());
        assert!(!StatusCode::InvalidInput.is_retryable());
    }

    #[test]
    fn error_output_msg_redacts_internal_failures() {
        let err = Error::Serialization {
            key: "/cron/jobs/x".into(),
            detail: "unexpected byte".into(),
        };
        assert!(err.output_msg().starts_with("internal error"));

        let err = Error::NotFound {
            operation: "get",
            key: "/cron/jobs/x".into(),
        };
        assert_eq!(err.output_msg(), "get: no value at /cron/jobs/x");
    }
}
