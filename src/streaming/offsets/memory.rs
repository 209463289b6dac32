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
use crate::streaming::offsets::CounterStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-process counters; offsets restart from 1 when the process restarts.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, AtomicU64>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_and_get(&self, key: &str) -> Result<u64, StorageError> {
        if let Some(counter) = self.counters.get(key) {
            return Ok(counter.fetch_add(1, Ordering::AcqRel) + 1);
        }
        let counter = self.counters.entry(key.to_owned()).or_default();
        Ok(counter.fetch_add(1, Ordering::AcqRel) + 1)
    }
}
