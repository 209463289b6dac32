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

use crate::server_error::LogError;
use crate::streaming::clock::MonotonicClock;
use crate::streaming::message::{message_key, Message};
use crate::streaming::offsets::OffsetAllocator;
use crate::streaming::storage::message_store::MessageStore;
use crate::streaming::topic::TopicName;
use error_set::ErrContext;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

const COMPONENT: &str = "PRODUCE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProducedMessage {
    pub topic: String,
    pub offset: u64,
}

/// Appends single messages: allocate an offset, then write the message under it.
///
/// At most one attempt is made per call. Retrying a call that failed after the
/// allocation step advances the counter again, so the first offset becomes a
/// permanent gap; callers that retry accept that.
#[derive(Clone)]
pub struct Producer {
    allocator: OffsetAllocator,
    store: MessageStore,
    clock: Arc<MonotonicClock>,
}

impl Producer {
    pub fn new(allocator: OffsetAllocator, store: MessageStore) -> Self {
        Self {
            allocator,
            store,
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    #[instrument(skip_all, name = "produce", fields(topic = %topic))]
    pub async fn produce(
        &self,
        topic: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<ProducedMessage, LogError> {
        let topic = TopicName::new(topic)?;
        let payload = match payload {
            Some(serde_json::Value::Null) | None => return Err(LogError::MissingPayload),
            Some(payload) => payload,
        };

        let offset = self
            .allocator
            .allocate(&topic)
            .await
            .map_err(LogError::BackendUnavailable)
            .with_error_context(|error| {
                format!("{COMPONENT} (error: {error}) - failed to allocate offset for topic: {topic}")
            })?;

        let message = Message {
            topic: topic.to_string(),
            offset,
            payload,
            timestamp: self.clock.now_millis(),
        };
        if let Err(source) = self.store.put(&topic, &message).await {
            error!(
                "{COMPONENT} (error: {source}) - failed to write message for topic: {topic}, offset: {offset} is now a gap"
            );
            return Err(LogError::WriteFailed {
                topic: topic.into(),
                offset,
                source,
            });
        }

        info!(
            "Produced message for topic: {topic} at offset: {offset}, key: {}",
            message_key(&topic, offset)
        );
        Ok(ProducedMessage {
            topic: topic.into(),
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_error::StorageError;
    use crate::streaming::offsets::memory::MemoryCounterStore;
    use crate::streaming::offsets::MockCounterStore;
    use crate::streaming::storage::memory::MemoryObjectStore;
    use crate::streaming::storage::{MockObjectStore, ObjectStore};
    use serde_json::json;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn producer_with(
        counters: Arc<dyn crate::streaming::offsets::CounterStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Producer {
        Producer::new(
            OffsetAllocator::new(counters, TIMEOUT),
            MessageStore::new(objects, TIMEOUT),
        )
    }

    fn memory_producer() -> (Producer, Arc<MemoryObjectStore>) {
        let objects = Arc::new(MemoryObjectStore::new());
        let producer = producer_with(Arc::new(MemoryCounterStore::new()), objects.clone());
        (producer, objects)
    }

    #[tokio::test]
    async fn produce_should_assign_consecutive_offsets() {
        let (producer, objects) = memory_producer();
        let first = producer
            .produce("orders", Some(json!({ "item": "book" })))
            .await
            .unwrap();
        let second = producer
            .produce("orders", Some(json!({ "item": "pen" })))
            .await
            .unwrap();
        assert_eq!(
            first,
            ProducedMessage {
                topic: "orders".to_owned(),
                offset: 1
            }
        );
        assert_eq!(second.offset, 2);
        assert_eq!(objects.len().await, 2);
    }

    #[tokio::test]
    async fn produce_should_store_payload_verbatim() {
        let (producer, objects) = memory_producer();
        let payload = json!({ "nested": { "list": [1, 2.5, "x", null, true] } });
        producer
            .produce("orders", Some(payload.clone()))
            .await
            .unwrap();
        let body = objects
            .get("topics/orders/00000000000000000001")
            .await
            .unwrap()
            .unwrap();
        let stored: Message = serde_json::from_slice(&body).unwrap();
        assert_eq!(stored.payload, payload);
        assert_eq!(stored.offset, 1);
        assert_eq!(stored.topic, "orders");
        assert!(stored.timestamp > 0);
    }

    #[tokio::test]
    async fn invalid_topic_should_not_touch_backends() {
        let mut counters = MockCounterStore::new();
        counters.expect_increment_and_get().never();
        let mut objects = MockObjectStore::new();
        objects.expect_put().never();
        let producer = producer_with(Arc::new(counters), Arc::new(objects));

        let error = producer
            .produce("../etc", Some(json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(error, LogError::InvalidTopicName(_)));
    }

    #[tokio::test]
    async fn missing_or_null_payload_should_be_rejected_before_allocation() {
        let mut counters = MockCounterStore::new();
        counters.expect_increment_and_get().never();
        let mut objects = MockObjectStore::new();
        objects.expect_put().never();
        let producer = producer_with(Arc::new(counters), Arc::new(objects));

        assert!(matches!(
            producer.produce("orders", None).await,
            Err(LogError::MissingPayload)
        ));
        assert!(matches!(
            producer.produce("orders", Some(json!(null))).await,
            Err(LogError::MissingPayload)
        ));
    }

    #[tokio::test]
    async fn allocation_failure_should_not_write_a_message() {
        let mut counters = MockCounterStore::new();
        counters
            .expect_increment_and_get()
            .times(1)
            .returning(|_| Err(StorageError::Backend("unreachable".to_owned())));
        let mut objects = MockObjectStore::new();
        objects.expect_put().never();
        let producer = producer_with(Arc::new(counters), Arc::new(objects));

        let error = producer
            .produce("orders", Some(json!({ "item": "book" })))
            .await
            .unwrap_err();
        assert!(matches!(error, LogError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn write_failure_should_report_the_lost_offset() {
        let mut counters = MockCounterStore::new();
        counters
            .expect_increment_and_get()
            .times(1)
            .returning(|_| Ok(7));
        let mut objects = MockObjectStore::new();
        objects
            .expect_put()
            .times(1)
            .returning(|_, _| Err(StorageError::Backend("503 Slow Down".to_owned())));
        let producer = producer_with(Arc::new(counters), Arc::new(objects));

        let error = producer
            .produce("orders", Some(json!({ "item": "book" })))
            .await
            .unwrap_err();
        match error {
            LogError::WriteFailed { topic, offset, .. } => {
                assert_eq!(topic, "orders");
                assert_eq!(offset, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn concurrent_produces_should_receive_distinct_offsets() {
        let (producer, objects) = memory_producer();
        let handles = (0..20)
            .map(|i| {
                let producer = producer.clone();
                tokio::spawn(async move {
                    producer
                        .produce("orders", Some(json!({ "i": i })))
                        .await
                        .unwrap()
                        .offset
                })
            })
            .collect::<Vec<_>>();

        let mut offsets = Vec::new();
        for handle in handles {
            offsets.push(handle.await.unwrap());
        }
        offsets.sort_unstable();
        assert_eq!(offsets, (1..=20).collect::<Vec<u64>>());
        assert_eq!(objects.len().await, 20);
    }
}
