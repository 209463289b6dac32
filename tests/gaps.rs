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

mod common;

use common::{offsets, TestServer};
use serde_json::{json, Value};
use tidelog::configs::server::{FetchErrorPolicy, ServerConfig};
use tidelog::streaming::message::message_key;
use tidelog::streaming::topic::TopicName;

#[tokio::test]
async fn failed_write_should_leave_a_gap_that_consume_skips() {
    let server = TestServer::start().await;

    assert_eq!(server.produce_ok("orders", json!("first")).await, 1);

    server.objects.fail_puts(true);
    let response = server.produce("orders", json!("lost")).await;
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("offset: 2"));
    server.objects.fail_puts(false);

    assert_eq!(server.produce_ok("orders", json!("third")).await, 3);

    let consumed = server.consume("orders", "offset=1&limit=10").await;
    assert_eq!(offsets(&consumed), vec![1, 3]);
    assert_eq!(consumed["next_offset"], 4);

    let consumed = server.consume("orders", "offset=2&limit=1").await;
    assert_eq!(offsets(&consumed), vec![3]);
    assert_eq!(consumed["next_offset"], 4);

    server.stop().await;
}

#[tokio::test]
async fn unreadable_message_should_be_skipped_by_default() {
    let server = TestServer::start().await;
    for value in 1..=3 {
        server.produce_ok("orders", json!(value)).await;
    }
    let topic = TopicName::new("orders").unwrap();
    server.objects.fail_get(&message_key(&topic, 2));

    let consumed = server.consume("orders", "offset=1").await;
    assert_eq!(offsets(&consumed), vec![1, 3]);
    assert_eq!(consumed["next_offset"], 4);

    server.stop().await;
}

#[tokio::test]
async fn unreadable_message_should_fail_consume_when_configured() {
    let mut config = ServerConfig::default();
    config.consume.on_fetch_error = FetchErrorPolicy::Fail;
    let server = TestServer::start_with(config).await;
    for value in 1..=3 {
        server.produce_ok("orders", json!(value)).await;
    }
    let topic = TopicName::new("orders").unwrap();
    server.objects.fail_get(&message_key(&topic, 2));

    let response = server.get("/topics/orders/consume?offset=1").await;
    assert_eq!(response.status().as_u16(), 503);

    let consumed = server.consume("orders", "offset=3").await;
    assert_eq!(offsets(&consumed), vec![3]);

    server.stop().await;
}
