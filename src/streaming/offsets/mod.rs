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

pub mod dynamodb;
pub mod memory;

use crate::server_error::StorageError;
use crate::streaming::storage::with_timeout;
use crate::streaming::topic::TopicName;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Key/value store with a linearizable per-key "add one and return the new
/// total" primitive. Counters start at 0 and are never decremented.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment_and_get(&self, key: &str) -> Result<u64, StorageError>;
}

/// Hands out strictly increasing offsets per topic, the first one being 1.
///
/// An allocated offset is never given back: if the message write that follows
/// fails, the offset stays unused and consumers see a gap.
#[derive(Clone)]
pub struct OffsetAllocator {
    counters: Arc<dyn CounterStore>,
    timeout: Duration,
}

impl OffsetAllocator {
    pub fn new(counters: Arc<dyn CounterStore>, timeout: Duration) -> Self {
        Self { counters, timeout }
    }

    pub async fn allocate(&self, topic: &TopicName) -> Result<u64, StorageError> {
        let offset =
            with_timeout(self.timeout, self.counters.increment_and_get(topic.as_str())).await?;
        if offset == 0 {
            return Err(StorageError::InvalidCounterValue {
                key: topic.to_string(),
            });
        }
        trace!("Allocated offset: {offset} for topic: {topic}");
        Ok(offset)
    }
}
