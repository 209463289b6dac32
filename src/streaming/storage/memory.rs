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

use crate::server_error::StorageError;
use crate::streaming::storage::{ListPage, ListQuery, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

/// Object store kept in process memory, for local runs and tests.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StorageError> {
        self.objects.write().await.insert(key.to_owned(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn list(&self, query: ListQuery) -> Result<ListPage, StorageError> {
        let after = query
            .continuation_token
            .as_ref()
            .or(query.start_after.as_ref())
            .filter(|after| **after >= query.prefix);
        let lower = match after {
            Some(after) => Bound::Excluded(after.clone()),
            None => Bound::Included(query.prefix.clone()),
        };

        let max_keys = query.max_keys.max(1);
        let objects = self.objects.read().await;
        let mut matching = objects
            .range::<String, _>((lower, Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&query.prefix));

        let keys = matching
            .by_ref()
            .take(max_keys)
            .cloned()
            .collect::<Vec<_>>();
        let continuation_token = match matching.next() {
            Some(_) => keys.last().cloned(),
            None => None,
        };
        Ok(ListPage {
            keys,
            continuation_token,
        })
    }
}
