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

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tidelog::bootstrap;
use tidelog::configs::server::ServerConfig;
use tidelog::http;
use tidelog::server_error::StorageError;
use tidelog::streaming::offsets::memory::MemoryCounterStore;
use tidelog::streaming::storage::memory::MemoryObjectStore;
use tidelog::streaming::storage::{ListPage, ListQuery, ObjectStore};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// In-memory object store with switchable write failures and per-key read
/// failures.
#[derive(Default)]
pub struct FlakyObjectStore {
    inner: MemoryObjectStore,
    fail_puts: AtomicBool,
    failing_gets: Mutex<HashSet<String>>,
}

impl FlakyObjectStore {
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get(&self, key: &str) {
        self.failing_gets.lock().unwrap().insert(key.to_owned());
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[async_trait]
impl ObjectStore for FlakyObjectStore {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("injected put failure for {key}")));
        }
        self.inner.put(key, body).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        if self.failing_gets.lock().unwrap().contains(key) {
            return Err(StorageError::Backend(format!("injected get failure for {key}")));
        }
        self.inner.get(key).await
    }

    async fn list(&self, query: ListQuery) -> Result<ListPage, StorageError> {
        self.inner.list(query).await
    }
}

pub struct TestServer {
    pub base_url: String,
    pub objects: Arc<FlakyObjectStore>,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        config.validate().unwrap();
        let objects = Arc::new(FlakyObjectStore::default());
        let counters = Arc::new(MemoryCounterStore::new());
        let state = Arc::new(bootstrap::create_state(
            &config,
            objects.clone(),
            counters,
        ));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let router = http::router(state, &config.http);
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            http::serve(listener, router, async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            base_url: format!("http://{address}"),
            objects,
            client: reqwest::Client::new(),
            shutdown: Some(shutdown),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn produce(&self, topic: &str, payload: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/topics/{topic}/produce")))
            .json(&serde_json::json!({ "payload": payload }))
            .send()
            .await
            .unwrap()
    }

    /// Produces and returns the allocated offset, panicking on failure.
    pub async fn produce_ok(&self, topic: &str, payload: Value) -> u64 {
        let response = self.produce(topic, payload).await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["topic"], topic);
        body["offset"].as_u64().unwrap()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// Consumes with a raw query string (e.g. `offset=1&limit=10`).
    pub async fn consume(&self, topic: &str, query: &str) -> Value {
        let response = self
            .get(&format!("/topics/{topic}/consume?{query}"))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap();
        }
    }
}

pub fn offsets(consumed: &Value) -> Vec<u64> {
    consumed["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|message| message["offset"].as_u64().unwrap())
        .collect()
}
