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

//! Job execution log persistence: an append-only [`LogStore`] over MongoDB,
//! and the [`LogManager`] query/retention surface the API layer and log
//! sink use.

mod manager;
mod mongo;
mod store;

pub use manager::{LogManager, LogStatistics, MAX_PAGE_SIZE};
pub use mongo::MongoLogStore;
pub use store::LogStore;
