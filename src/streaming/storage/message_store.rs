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
use crate::streaming::message::{message_key, parse_message_key, topic_key_prefix, Message};
use crate::streaming::storage::{with_timeout, ListQuery, ObjectStore};
use crate::streaming::topic::TopicName;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Reads and writes messages as immutable objects under
/// `topics/{topic}/{offset:020}`.
#[derive(Clone)]
pub struct MessageStore {
    objects: Arc<dyn ObjectStore>,
    timeout: Duration,
}

struct ListState {
    continuation_token: Option<String>,
    exhausted: bool,
}

impl MessageStore {
    pub fn new(objects: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { objects, timeout }
    }

    /// Writes `message` under the key derived from its topic and offset.
    /// Rewriting the same key with the same content is harmless.
    pub async fn put(&self, topic: &TopicName, message: &Message) -> Result<(), StorageError> {
        let key = message_key(topic, message.offset);
        let body = serde_json::to_vec(message).map_err(|error| StorageError::Serialization {
            key: key.clone(),
            reason: error.to_string(),
        })?;
        with_timeout(self.timeout, self.objects.put(&key, Bytes::from(body))).await
    }

    /// Lazily lists the offsets stored for `topic` that are `>= from_offset`,
    /// requesting `page_size` keys per backend call. Every call starts a fresh
    /// listing; no cursor is kept between calls.
    pub fn list(
        &self,
        topic: &TopicName,
        from_offset: u64,
        page_size: usize,
    ) -> BoxStream<'static, Result<u64, StorageError>> {
        let objects = self.objects.clone();
        let timeout = self.timeout;
        let prefix = topic_key_prefix(topic);
        let start_after = (from_offset > 1).then(|| message_key(topic, from_offset - 1));
        let initial = ListState {
            continuation_token: None,
            exhausted: false,
        };

        stream::try_unfold(initial, move |state| {
            let objects = objects.clone();
            let prefix = prefix.clone();
            let start_after = start_after.clone();
            async move {
                if state.exhausted {
                    return Ok::<_, StorageError>(None);
                }

                let query = ListQuery {
                    prefix: prefix.clone(),
                    start_after,
                    continuation_token: state.continuation_token,
                    max_keys: page_size,
                };
                let page = with_timeout(timeout, objects.list(query)).await?;
                let mut offsets = page
                    .keys
                    .iter()
                    .filter_map(|key| parse_message_key(&prefix, key))
                    .filter(|offset| *offset >= from_offset)
                    .collect::<Vec<_>>();
                offsets.sort_unstable();
                trace!(
                    "Listed {} offsets under prefix: {prefix}, more pages: {}",
                    offsets.len(),
                    page.continuation_token.is_some()
                );

                let next = ListState {
                    exhausted: page.continuation_token.is_none(),
                    continuation_token: page.continuation_token,
                };
                Ok(Some((offsets, next)))
            }
        })
        .map_ok(|offsets| stream::iter(offsets.into_iter().map(Ok::<u64, StorageError>)))
        .try_flatten()
        .boxed()
    }

    /// Fetches one message, `None` if it does not exist (never written or
    /// removed by the store's retention).
    pub async fn get(
        &self,
        topic: &TopicName,
        offset: u64,
    ) -> Result<Option<Message>, StorageError> {
        let key = message_key(topic, offset);
        let Some(body) = with_timeout(self.timeout, self.objects.get(&key)).await? else {
            return Ok(None);
        };

        let message: Message =
            serde_json::from_slice(&body).map_err(|error| StorageError::Serialization {
                key: key.clone(),
                reason: error.to_string(),
            })?;
        if message.offset != offset {
            return Err(StorageError::Serialization {
                key,
                reason: format!("body has offset: {}", message.offset),
            });
        }
        Ok(Some(message))
    }
}
