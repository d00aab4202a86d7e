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

use snafu::Snafu;

/// Failure to parse a cron expression passed to [`crate::TaskBuilder::cron`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CronParseError {
    #[snafu(display("failed to parse cron expression: {source}"))]
    InvalidExpression {
        source: croner::errors::CronError,
        #[snafu(implicit)]
        loc: snafu::Location,
    },
}
