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

use crate::streaming::topic::TopicName;
use serde::{Deserialize, Serialize};

pub const TOPICS_KEY_PREFIX: &str = "topics";
/// Width of the zero-padded offset in object keys. Lexicographic key order
/// equals offset order only while this never changes.
pub const OFFSET_WIDTH: usize = 20;

/// Immutable log entry as persisted in the object store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub offset: u64,
    pub payload: serde_json::Value,
    pub timestamp: u64,
}

/// Prefix shared by every message key of a topic, including the trailing `/`.
pub fn topic_key_prefix(topic: &TopicName) -> String {
    format!("{TOPICS_KEY_PREFIX}/{topic}/")
}

pub fn message_key(topic: &TopicName, offset: u64) -> String {
    format!(
        "{TOPICS_KEY_PREFIX}/{topic}/{offset:0width$}",
        width = OFFSET_WIDTH
    )
}

/// Extracts the offset from a key listed under `prefix`. Keys that are not
/// exactly `OFFSET_WIDTH` ASCII digits after the prefix are not messages.
pub fn parse_message_key(prefix: &str, key: &str) -> Option<u64> {
    let encoded = key.strip_prefix(prefix)?;
    if encoded.len() != OFFSET_WIDTH || !encoded.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    encoded.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> TopicName {
        TopicName::new("orders").unwrap()
    }

    #[test]
    fn key_is_zero_padded_to_fixed_width() {
        assert_eq!(
            message_key(&orders(), 1),
            "topics/orders/00000000000000000001"
        );
        assert_eq!(
            message_key(&orders(), u64::MAX),
            "topics/orders/18446744073709551615"
        );
    }

    #[test]
    fn key_order_should_follow_offset_order() {
        let topic = orders();
        let mut offsets = vec![10_u64, 9, 100, 1, 99_999, 2];
        let mut keys = offsets
            .iter()
            .map(|offset| message_key(&topic, *offset))
            .collect::<Vec<_>>();
        keys.sort();
        offsets.sort();
        let prefix = topic_key_prefix(&topic);
        let parsed = keys
            .iter()
            .map(|key| parse_message_key(&prefix, key).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(parsed, offsets);
    }

    #[test]
    fn foreign_keys_should_not_parse() {
        let prefix = topic_key_prefix(&orders());
        assert_eq!(parse_message_key(&prefix, "topics/orders/"), None);
        assert_eq!(
            parse_message_key(&prefix, "topics/orders/00000000000000000001.json"),
            None
        );
        assert_eq!(parse_message_key(&prefix, "topics/orders/1"), None);
        assert_eq!(
            parse_message_key(&prefix, "topics/orders-eu/00000000000000000001"),
            None
        );
        assert_eq!(
            parse_message_key(&prefix, "topics/orders/9999999999999999999x"),
            None
        );
        assert_eq!(
            parse_message_key(&prefix, "topics/orders/99999999999999999999"),
            None
        );
    }
}
