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
use futures::future::join_all;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

#[tokio::test]
async fn concurrent_produces_should_receive_distinct_consecutive_offsets() {
    let server = Arc::new(TestServer::start().await);

    let produces = (0..20).map(|index| {
        let server = server.clone();
        tokio::spawn(async move { server.produce_ok("orders", json!({ "index": index })).await })
    });
    let assigned: BTreeSet<u64> = join_all(produces)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect();
    assert_eq!(assigned, (1..=20).collect::<BTreeSet<_>>());

    let consumed = server.consume("orders", "offset=1&limit=100").await;
    assert_eq!(offsets(&consumed), (1..=20).collect::<Vec<_>>());
    assert_eq!(consumed["next_offset"], 21);

    let server = Arc::try_unwrap(server).ok().unwrap();
    server.stop().await;
}

#[tokio::test]
async fn concurrent_consumers_should_see_the_same_window() {
    let server = Arc::new(TestServer::start().await);
    for index in 0..30 {
        server.produce_ok("events", json!(index)).await;
    }

    let consumes = (0..8).map(|_| {
        let server = server.clone();
        tokio::spawn(async move { server.consume("events", "offset=5&limit=20").await })
    });
    for result in join_all(consumes).await {
        let consumed = result.unwrap();
        assert_eq!(offsets(&consumed), (5..=24).collect::<Vec<_>>());
        assert_eq!(consumed["next_offset"], 25);
    }

    let server = Arc::try_unwrap(server).ok().unwrap();
    server.stop().await;
}
