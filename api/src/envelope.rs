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

use cronmesh_error::StatusCode;
use serde::{Deserialize, Serialize};

/// Wire envelope every control-API response is wrapped in. `code == 0`
/// means success and `data` carries the payload; any other value is one of
/// the codes [`Envelope::error`] assigns and `data` is `null`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn ok(data: T) -> Self { Self { code: 0, message: "ok".to_string(), data } }
}

impl Envelope<()> {
    #[must_use]
    pub fn error(status: StatusCode, message: String) -> Self {
        Self { code: numeric_code(status), message, data: () }
    }
}

/// Maps the internal error classification onto the integer codes a client
/// branches on. `NotFound` is pinned at 1002 to match the documented
/// contract; the rest follow the same `10xx` numbering.
fn numeric_code(status: StatusCode) -> i32 {
    match status {
        StatusCode::InvalidInput => 1001,
        StatusCode::NotFound => 1002,
        StatusCode::AlreadyHeld => 1003,
        StatusCode::Unavailable => 1004,
        StatusCode::Timeout => 1005,
        StatusCode::Serialization => 1006,
        StatusCode::Fatal => 1007,
        StatusCode::Unknown => 1000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_carries_a_zero_code() {
        let envelope = Envelope::ok(42);
        assert_eq!(envelope.code, 0);
        assert_eq!(envelope.data, 42);
    }

    #[test]
    fn not_found_maps_to_the_documented_code() {
        assert_eq!(numeric_code(StatusCode::NotFound), 1002);
    }
}
