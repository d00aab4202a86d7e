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

use tokio_util::sync::CancellationToken;

/// Handed to every [`crate::Task`] callback. Carries the task's name (for
/// logging from inside `work()`) and a cancellation token scoped to this
/// task's lifetime.
#[derive(Clone)]
pub struct TaskContext {
    name:         &'static str,
    cancel_token: CancellationToken,
}

impl TaskContext {
    pub(crate) fn new(name: &'static str, cancel_token: CancellationToken) -> Self {
        TaskContext { name, cancel_token }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.cancel_token.is_cancelled() }

    pub async fn cancelled(&self) { self.cancel_token.cancelled().await }

    #[must_use]
    pub fn child_token(&self) -> CancellationToken { self.cancel_token.child_token() }
}
