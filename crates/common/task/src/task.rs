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

use cronmesh_error::Result;

use crate::context::TaskContext;

/// A unit of recurring work driven by a [`crate::Trigger`].
///
/// `work()` runs on every firing; `on_start`/`on_shutdown` bracket the
/// task's whole lifetime with the manager. A task returning `Err` from
/// `work()` stops the task — the manager logs it and does not retry, since
/// retry policy (if any) belongs to the caller's trigger choice, not here.
#[async_trait::async_trait]
pub trait Task: Send + 'static {
    async fn on_start(&mut self, _ctx: &TaskContext) -> Result<()> { Ok(()) }

    async fn work(&mut self, ctx: &TaskContext) -> Result<()>;

    async fn on_shutdown(&mut self, _ctx: &TaskContext) -> Result<()> { Ok(()) }
}
