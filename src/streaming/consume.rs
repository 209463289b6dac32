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

use crate::configs::server::{ConsumeConfig, FetchErrorPolicy};
use crate::server_error::{LogError, StorageError};
use crate::streaming::message::Message;
use crate::streaming::storage::message_store::MessageStore;
use crate::streaming::topic::TopicName;
use error_set::ErrContext;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};

const COMPONENT: &str = "CONSUME";

/// Upper bound of a consume window.
pub const MAX_CONSUME_LIMIT: u32 = 100;
/// Upper bound of in-flight fetches within one consume call.
pub const MAX_CONCURRENT_FETCHES: usize = 10;

/// Normalized consume window: `offset >= 1`, `limit` within `1..=max_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingArgs {
    pub offset: u64,
    pub limit: usize,
}

impl PollingArgs {
    /// Missing or non-positive offsets read from 1; a missing limit uses the
    /// configured default and any limit is clamped into `1..=max_limit`.
    pub fn normalize(offset: Option<i64>, limit: Option<i64>, config: &ConsumeConfig) -> Self {
        let offset = offset.filter(|offset| *offset >= 1).unwrap_or(1) as u64;
        let max_limit = i64::from(config.max_limit.clamp(1, MAX_CONSUME_LIMIT));
        let limit = limit
            .unwrap_or(i64::from(config.default_limit))
            .clamp(1, max_limit) as usize;
        Self { offset, limit }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolledMessages {
    /// Strictly ascending by offset.
    pub messages: Vec<Message>,
    pub next_offset: u64,
}

/// Reads ordered windows of a topic's log.
#[derive(Clone)]
pub struct Consumer {
    store: MessageStore,
    config: ConsumeConfig,
}

impl Consumer {
    pub fn new(store: MessageStore, config: ConsumeConfig) -> Self {
        Self { store, config }
    }

    pub fn polling_args(&self, offset: Option<i64>, limit: Option<i64>) -> PollingArgs {
        PollingArgs::normalize(offset, limit, &self.config)
    }

    /// Lists up to `limit` stored offsets starting at `args.offset`, fetches
    /// them with bounded concurrency and returns them sorted by offset.
    ///
    /// Gaps are skipped. A listing failure fails the whole call; a failed
    /// fetch is handled according to `on_fetch_error`.
    #[instrument(skip_all, name = "consume", fields(topic = %topic))]
    pub async fn consume(&self, topic: &str, args: PollingArgs) -> Result<PolledMessages, LogError> {
        let topic = TopicName::new(topic)?;

        let mut candidates: Vec<u64> = self
            .store
            .list(&topic, args.offset, args.limit)
            .take(args.limit)
            .try_collect()
            .await
            .map_err(LogError::BackendUnavailable)
            .with_error_context(|error| {
                format!(
                    "{COMPONENT} (error: {error}) - failed to list messages for topic: {topic}, offset: {}",
                    args.offset
                )
            })?;
        candidates.sort_unstable();
        candidates.dedup();

        let store = &self.store;
        let topic_ref = &topic;
        let fetched: Vec<(u64, Result<Option<Message>, StorageError>)> = stream::iter(candidates)
            .map(|offset| async move { (offset, store.get(topic_ref, offset).await) })
            .buffer_unordered(
                self.config
                    .max_concurrent_fetches
                    .clamp(1, MAX_CONCURRENT_FETCHES),
            )
            .collect()
            .await;

        let mut messages = Vec::with_capacity(fetched.len());
        for (offset, result) in fetched {
            match result {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => {
                    debug!("Message for topic: {topic} at offset: {offset} no longer exists, skipping");
                }
                Err(error) => match self.config.on_fetch_error {
                    FetchErrorPolicy::Skip => {
                        warn!(
                            "{COMPONENT} (error: {error}) - failed to fetch message for topic: {topic} at offset: {offset}, skipping"
                        );
                    }
                    FetchErrorPolicy::Fail => {
                        warn!(
                            "{COMPONENT} (error: {error}) - failed to fetch message for topic: {topic} at offset: {offset}"
                        );
                        return Err(LogError::BackendUnavailable(error));
                    }
                },
            }
        }
        // Fetches complete in any order.
        messages.sort_unstable_by_key(|message| message.offset);

        let next_offset = messages
            .last()
            .map(|message| message.offset.saturating_add(1))
            .unwrap_or(args.offset);
        info!(
            "Consumed {} messages for topic: {topic} from offset: {}, next offset: {next_offset}",
            messages.len(),
            args.offset
        );
        Ok(PolledMessages {
            messages,
            next_offset,
        })
    }
}
