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

use axum::{Json, response::IntoResponse};
use cronmesh_api::Envelope;
use cronmesh_error::ErrorExt;

/// Wraps [`cronmesh_error::Error`] so this crate can give it an
/// [`IntoResponse`] impl without violating the orphan rule.
#[derive(Debug)]
pub struct ApiError(cronmesh_error::Error);

impl From<cronmesh_error::Error> for ApiError {
    fn from(error: cronmesh_error::Error) -> Self { Self(error) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        let body = Json(Envelope::error(status, self.0.output_msg()));
        (status.http_status(), body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
