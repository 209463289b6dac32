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

pub mod server;

use crate::server_error::ConfigError;
use crate::streaming::consume::{MAX_CONCURRENT_FETCHES, MAX_CONSUME_LIMIT};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use server::{CountersBackend, ServerConfig, StorageBackend};

pub const ENV_PREFIX: &str = "TIDELOG_";
pub const ENV_SEPARATOR: &str = "__";

impl ServerConfig {
    /// Layers compiled defaults, the TOML file at `path` (when it exists) and
    /// `TIDELOG_*` environment variables, then validates the result.
    pub fn load(path: &str) -> Result<ServerConfig, ConfigError> {
        let config: ServerConfig = Figment::from(Serialized::defaults(ServerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidConfiguration(reason));

        let consume = &self.consume;
        if consume.max_limit == 0 || consume.max_limit > MAX_CONSUME_LIMIT {
            return invalid(format!(
                "consume.max_limit must be in range 1..={MAX_CONSUME_LIMIT}, got: {}",
                consume.max_limit
            ));
        }
        if consume.default_limit == 0 || consume.default_limit > consume.max_limit {
            return invalid(format!(
                "consume.default_limit must be in range 1..={}, got: {}",
                consume.max_limit, consume.default_limit
            ));
        }
        if consume.max_concurrent_fetches == 0
            || consume.max_concurrent_fetches > MAX_CONCURRENT_FETCHES
        {
            return invalid(format!(
                "consume.max_concurrent_fetches must be in range 1..={MAX_CONCURRENT_FETCHES}, got: {}",
                consume.max_concurrent_fetches
            ));
        }

        if self.storage.timeout.is_zero() {
            return invalid("storage.timeout must be greater than 0".to_owned());
        }
        if self.counters.timeout.is_zero() {
            return invalid("counters.timeout must be greater than 0".to_owned());
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.s3.bucket.is_empty() {
            return invalid("storage.s3.bucket is required for the s3 backend".to_owned());
        }
        // Counters restarting from 1 over a durable bucket would overwrite stored messages.
        if self.storage.backend == StorageBackend::S3
            && self.counters.backend == CountersBackend::Memory
        {
            return invalid(
                "the s3 storage backend requires a durable counters backend (dynamodb)".to_owned(),
            );
        }
        if self.counters.backend == CountersBackend::DynamoDb {
            let dynamodb = &self.counters.dynamodb;
            if dynamodb.table.is_empty() {
                return invalid(
                    "counters.dynamodb.table is required for the dynamodb backend".to_owned(),
                );
            }
            if dynamodb.partition_key.is_empty() || dynamodb.attribute.is_empty() {
                return invalid(
                    "counters.dynamodb.partition_key and attribute cannot be empty".to_owned(),
                );
            }
        }

        if let Some(prefix) = &self.http.stage_prefix {
            if !prefix.starts_with('/') {
                return invalid(format!("http.stage_prefix must start with '/', got: {prefix}"));
            }
            if prefix.ends_with('/') {
                return invalid(format!("http.stage_prefix cannot end with '/', got: {prefix}"));
            }
        }
        if self.http.max_request_size == 0 {
            return invalid("http.max_request_size must be greater than 0".to_owned());
        }

        Ok(())
    }
}
