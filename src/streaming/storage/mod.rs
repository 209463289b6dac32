/* Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

pub mod memory;
pub mod message_store;
pub mod s3;

use crate::server_error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::time::Duration;

pub const COMPONENT: &str = "STORAGE";

/// One `list` request: keys under `prefix`, strictly after `start_after`,
/// resuming from `continuation_token` when paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub prefix: String,
    pub start_after: Option<String>,
    pub continuation_token: Option<String>,
    pub max_keys: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListPage {
    /// Keys in ascending lexicographic order.
    pub keys: Vec<String>,
    /// Present when more keys remain after this page.
    pub continuation_token: Option<String>,
}

/// Immutable blob storage keyed by string paths.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Succeeds only once the object is durably stored.
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StorageError>;

    /// Returns `None` when no object exists under `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError>;

    async fn list(&self, query: ListQuery) -> Result<ListPage, StorageError>;
}

/// Bounds a single backend call; expiry is reported as `StorageError::Timeout`.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, future: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| StorageError::Timeout(timeout))?
}
