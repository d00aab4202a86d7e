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

use chrono::{DateTime, Utc};
use cronmesh_error::{Result, SerializationSnafu, UnavailableSnafu};
use cronmesh_model::JobLog;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Bson},
    options::IndexOptions,
    Client, Collection, IndexModel,
};

const COLLECTION_NAME: &str = "job_logs";

/// [`super::LogStore`] backed by MongoDB. The collection is indexed on
/// `(jobName asc, startAt desc)` since every query either scopes to one job
/// or wants newest-first order.
pub struct MongoLogStore {
    collection: Collection<JobLog>,
}

impl MongoLogStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|err| unavailable("connect", err))?;
        let collection = client.database(database).collection::<JobLog>(COLLECTION_NAME);

        let index = IndexModel::builder()
            .keys(doc! { "jobName": 1, "startAt": -1 })
            .options(IndexOptions::builder().build())
            .build();
        collection
            .create_index(index)
            .await
            .map_err(|err| unavailable("create_index", err))?;

        Ok(Self { collection })
    }

    #[must_use]
    pub fn from_collection(collection: Collection<JobLog>) -> Self { Self { collection } }
}

fn job_filter(job_name: &str) -> mongodb::bson::Document {
    if job_name.is_empty() {
        doc! {}
    } else {
        doc! { "jobName": job_name }
    }
}

fn to_bson_time(at: DateTime<Utc>) -> Result<Bson> {
    mongodb::bson::to_bson(&at).map_err(|err| {
        SerializationSnafu { key: "startAt".to_string(), detail: err.to_string() }.build()
    })
}

#[async_trait::async_trait]
impl super::store::LogStore for MongoLogStore {
    async fn insert_many(&self, logs: Vec<JobLog>) -> Result<()> {
        if logs.is_empty() {
            return Ok(());
        }
        self.collection
            .insert_many(logs)
            .await
            .map_err(|err| unavailable("insert_many", err))?;
        Ok(())
    }

    async fn find(&self, job_name: &str, skip: u64, limit: i64) -> Result<Vec<JobLog>> {
        let cursor = self
            .collection
            .find(job_filter(job_name))
            .sort(doc! { "startAt": -1 })
            .skip(skip)
            .limit(limit)
            .await
            .map_err(|err| unavailable("find", err))?;
        cursor.try_collect().await.map_err(|err| unavailable("find", err))
    }

    async fn count(&self, job_name: &str) -> Result<u64> {
        self.collection
            .count_documents(job_filter(job_name))
            .await
            .map_err(|err| unavailable("count", err))
    }

    async fn find_latest(&self, job_name: &str) -> Result<Option<JobLog>> {
        self.collection
            .find_one(job_filter(job_name))
            .sort(doc! { "startAt": -1 })
            .await
            .map_err(|err| unavailable("find_latest", err))
    }

    async fn find_since(&self, job_name: &str, since: DateTime<Utc>) -> Result<Vec<JobLog>> {
        let mut filter = job_filter(job_name);
        filter.insert("startAt", doc! { "$gte": to_bson_time(since)? });
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "startAt": -1 })
            .await
            .map_err(|err| unavailable("find_since", err))?;
        cursor.try_collect().await.map_err(|err| unavailable("find_since", err))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        // Filtered on endAt, not startAt: a job can start before the
        // retention window and finish inside it, and its completion should
        // still count as recent.
        let filter = doc! { "endAt": { "$lt": to_bson_time(cutoff)? } };
        let result = self
            .collection
            .delete_many(filter)
            .await
            .map_err(|err| unavailable("delete_older_than", err))?;
        Ok(result.deleted_count)
    }
}

fn unavailable(operation: &'static str, err: mongodb::error::Error) -> cronmesh_error::Error {
    UnavailableSnafu { operation, key: COLLECTION_NAME.to_string(), detail: err.to_string() }.build()
}
