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

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    id::TaskId,
    metrics::{TASK_PAUSED, TASK_RESUMED},
};

/// Returned by [`crate::TaskBuilder::spawn`]. Lets the owner identify and
/// control a running task without holding on to the task itself.
#[derive(Clone)]
pub struct TaskHandle {
    id:     TaskId,
    name:   &'static str,
    paused: Arc<AtomicBool>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, name: &'static str, paused: Arc<AtomicBool>) -> Self {
        TaskHandle { id, name, paused }
    }

    #[must_use]
    pub const fn id(&self) -> TaskId { self.id }

    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// Stops the trigger from firing. The task in flight, if any, keeps
    /// running to completion.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        TASK_PAUSED.with_label_values(&[self.name]).inc();
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        TASK_RESUMED.with_label_values(&[self.name]).inc();
    }

    #[must_use]
    pub fn is_paused(&self) -> bool { self.paused.load(Ordering::Acquire) }
}
