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

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the counter and object store backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Backend request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Backend request failed: {0}")]
    Backend(String),
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
    #[error("Counter store returned an invalid value for key: {key}")]
    InvalidCounterValue { key: String },
    #[error("Invalid stored message under key: {key}, reason: {reason}")]
    Serialization { key: String, reason: String },
}

/// Errors surfaced by the produce and consume paths.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid topic name: {0}")]
    InvalidTopicName(String),
    #[error("Missing payload")]
    MissingPayload,
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[source] StorageError),
    #[error("Failed to write message for topic: {topic} at allocated offset: {offset}, the offset is lost: {source}")]
    WriteFailed {
        topic: String,
        offset: u64,
        #[source]
        source: StorageError,
    },
}

impl LogError {
    /// Caller-side mistakes that must never be retried as-is.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LogError::InvalidTopicName(_) | LogError::MissingPayload | LogError::InvalidPayload(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot load configuration: {0}")]
    CannotLoadConfiguration(#[from] Box<figment::Error>),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Cannot bind HTTP listener to address: {address}")]
    CannotBindListener {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server failed")]
    HttpServer(#[source] std::io::Error),
}
