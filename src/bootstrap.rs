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

use crate::configs::server::{
    CountersBackend, CountersConfig, LogFormat, LoggingConfig, ServerConfig, StorageBackend,
    StorageConfig,
};
use crate::http::shared::AppState;
use crate::server_error::ServerError;
use crate::streaming::consume::Consumer;
use crate::streaming::offsets::dynamodb::DynamoDbCounterStore;
use crate::streaming::offsets::memory::MemoryCounterStore;
use crate::streaming::offsets::{CounterStore, OffsetAllocator};
use crate::streaming::produce::Producer;
use crate::streaming::storage::memory::MemoryObjectStore;
use crate::streaming::storage::message_store::MessageStore;
use crate::streaming::storage::s3::S3ObjectStore;
use crate::streaming::storage::ObjectStore;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = Registry::default().with(filter);
    match config.format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

pub fn create_object_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, ServerError> {
    match config.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory object store, messages will be lost on restart");
            Ok(Arc::new(MemoryObjectStore::new()))
        }
        StorageBackend::S3 => Ok(Arc::new(S3ObjectStore::new(&config.s3)?)),
    }
}

pub async fn create_counter_store(config: &CountersConfig) -> Arc<dyn CounterStore> {
    match config.backend {
        CountersBackend::Memory => {
            warn!("Using in-memory counter store, offsets will restart from 1 on restart");
            Arc::new(MemoryCounterStore::new())
        }
        CountersBackend::DynamoDb => Arc::new(DynamoDbCounterStore::new(&config.dynamodb).await),
    }
}

/// Wires the produce and consume paths over the given backends.
pub fn create_state(
    config: &ServerConfig,
    objects: Arc<dyn ObjectStore>,
    counters: Arc<dyn CounterStore>,
) -> AppState {
    let store = MessageStore::new(objects, *config.storage.timeout);
    let allocator = OffsetAllocator::new(counters, *config.counters.timeout);
    AppState {
        producer: Producer::new(allocator, store.clone()),
        consumer: Consumer::new(store, config.consume.clone()),
    }
}

pub async fn load_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let objects = create_object_store(&config.storage)?;
    let counters = create_counter_store(&config.counters).await;
    info!(
        "Initialized storage backend: {}, counters backend: {}",
        config.storage.backend, config.counters.backend
    );
    Ok(create_state(config, objects, counters))
}

/// Resolves on SIGINT or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                error!("Failed to listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
