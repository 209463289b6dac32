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

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use strum::Display;

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub counters: CountersConfig,
    pub consume: ConsumeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub address: String,
    /// Optional path prefix (e.g. `/v1`) under which the API is mounted in addition to `/`.
    pub stage_prefix: Option<String>,
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde_as(as = "DisplayFromStr")]
    pub timeout: humantime::Duration,
    pub s3: S3Config,
}

#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    S3,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub path_style: bool,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CountersConfig {
    pub backend: CountersBackend,
    #[serde_as(as = "DisplayFromStr")]
    pub timeout: humantime::Duration,
    pub dynamodb: DynamoDbConfig,
}

#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CountersBackend {
    #[default]
    Memory,
    #[strum(to_string = "dynamodb")]
    #[serde(rename = "dynamodb")]
    DynamoDb,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DynamoDbConfig {
    pub table: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub partition_key: String,
    pub attribute: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsumeConfig {
    pub default_limit: u32,
    pub max_limit: u32,
    pub max_concurrent_fetches: usize,
    pub on_fetch_error: FetchErrorPolicy,
}

/// What a consume call does when fetching one listed message fails.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorPolicy {
    /// Drop the message from the page, as if it was never written.
    #[default]
    Skip,
    /// Fail the whole call as backend unavailable.
    Fail,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:3000".to_owned(),
            stage_prefix: None,
            max_request_size: 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            timeout: std::time::Duration::from_secs(5).into(),
            s3: S3Config::default(),
        }
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_owned(),
            endpoint: None,
            key_id: None,
            key_secret: None,
            path_style: false,
        }
    }
}

impl Default for CountersConfig {
    fn default() -> Self {
        Self {
            backend: CountersBackend::Memory,
            timeout: std::time::Duration::from_secs(5).into(),
            dynamodb: DynamoDbConfig::default(),
        }
    }
}

impl Default for DynamoDbConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            region: None,
            endpoint: None,
            partition_key: "pk".to_owned(),
            attribute: "current_offset".to_owned(),
        }
    }
}

impl Default for ConsumeConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            max_concurrent_fetches: 10,
            on_fetch_error: FetchErrorPolicy::Skip,
        }
    }
}
