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

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use cronmesh_error::Result;
use cronmesh_task::{Task, TaskContext, TaskManager, TaskManagerConfig};

struct Counter(Arc<AtomicUsize>);

#[async_trait::async_trait]
impl Task for Counter {
    async fn work(&mut self, _ctx: &TaskContext) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn interval_task_ticks_and_can_be_paused() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut manager = TaskManager::start(TaskManagerConfig::default()).unwrap();
    let handle = manager
        .task(Counter(count.clone()))
        .name("counter")
        .interval(Duration::from_millis(20))
        .spawn();

    tokio::time::sleep(Duration::from_millis(90)).await;
    assert!(count.load(Ordering::SeqCst) >= 2);

    handle.pause();
    assert!(handle.is_paused());
    let after_pause = count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(90)).await;
    // A tick already in flight may still land, but no more than one.
    assert!(count.load(Ordering::SeqCst) <= after_pause + 1);

    handle.resume();
    assert!(!handle.is_paused());
    manager.shutdown().await.unwrap();
}

struct Failing;

#[async_trait::async_trait]
impl Task for Failing {
    async fn work(&mut self, _ctx: &TaskContext) -> Result<()> {
        cronmesh_error::FatalSnafu {
            reason: "boom".to_string(),
        }
        .fail()
    }
}

#[tokio::test]
async fn failing_task_stops_without_panicking_the_manager() {
    let mut manager = TaskManager::start(TaskManagerConfig::default()).unwrap();
    manager.task(Failing).name("failing").interval(Duration::from_millis(5)).spawn();
    tokio::time::sleep(Duration::from_millis(40)).await;
    manager.shutdown().await.unwrap();
}

#[tokio::test]
async fn cron_builder_rejects_bad_expressions() {
    let mut manager = TaskManager::start(TaskManagerConfig::default()).unwrap();
    let err = manager.task(Counter(Arc::new(AtomicUsize::new(0)))).cron("not a cron");
    assert!(err.is_err());
}
