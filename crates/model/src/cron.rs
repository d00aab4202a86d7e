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

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cronmesh_error::{InvalidInputSnafu, Result};

/// A parsed six-field (seconds-resolution) cron expression.
///
/// Five-field expressions are not accepted — the scheduler always runs at
/// second granularity.
#[derive(Debug, Clone)]
pub struct CompiledCron {
    expr: String,
    cron: croner::Cron,
}

impl CompiledCron {
    /// # Errors
    ///
    /// Returns [`cronmesh_error::Error::InvalidInput`] if `expr` does not
    /// parse as a six-field cron expression.
    pub fn parse(expr: &str) -> Result<Self> {
        let cron = croner::Cron::from_str(expr).map_err(|err| {
            InvalidInputSnafu {
                reason: format!("invalid cron expression {expr:?}: {err}"),
            }
            .build()
        })?;
        Ok(Self {
            expr: expr.to_string(),
            cron,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str { &self.expr }

    /// The next instant strictly after `now` at which this expression fires.
    ///
    /// # Errors
    ///
    /// Returns [`cronmesh_error::Error::InvalidInput`] if the underlying
    /// cron engine cannot compute a next occurrence (practically
    /// unreachable once `parse` has succeeded).
    pub fn next_after(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.cron.find_next_occurrence(&now, false).map_err(|err| {
            cronmesh_error::InvalidInputSnafu {
                reason: format!("cron engine could not compute next occurrence: {err}"),
            }
            .build()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_after_is_strictly_greater_than_now() {
        let cron = CompiledCron::parse("* * * * * *").unwrap();
        let now = Utc::now();
        let next = cron.next_after(now).unwrap();
        assert!(next > now);
    }

    #[test]
    fn invalid_expression_is_rejected() {
        assert!(CompiledCron::parse("not a cron").is_err());
    }
}
