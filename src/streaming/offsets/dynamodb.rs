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

use crate::configs::server::DynamoDbConfig;
use crate::server_error::StorageError;
use crate::streaming::offsets::CounterStore;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use error_set::ErrContext;
use std::collections::HashMap;
use tracing::info;

const COMPONENT: &str = "DYNAMODB_COUNTERS";
const UPDATE_EXPRESSION: &str = "SET #counter = if_not_exists(#counter, :zero) + :inc";

/// Counters kept in a DynamoDB table, one item per topic, advanced with an
/// atomic `UpdateItem`.
#[derive(Debug, Clone)]
pub struct DynamoDbCounterStore {
    client: Client,
    table: String,
    partition_key: String,
    attribute: String,
}

impl DynamoDbCounterStore {
    /// Resolves credentials and region through the default AWS provider
    /// chain, overridden by the configured region and endpoint.
    pub async fn new(config: &DynamoDbConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        info!(
            "Initialized DynamoDB counter store for table: {}",
            config.table
        );
        Self::with_client(Client::new(&sdk_config), config)
    }

    pub fn with_client(client: Client, config: &DynamoDbConfig) -> Self {
        Self {
            client,
            table: config.table.clone(),
            partition_key: config.partition_key.clone(),
            attribute: config.attribute.clone(),
        }
    }
}

/// Reads the new counter value from `UpdateItem` output. A missing or
/// non-numeric attribute is an error; an offset is never guessed.
fn read_counter(
    attribute: &str,
    key: &str,
    attributes: Option<&HashMap<String, AttributeValue>>,
) -> Result<u64, StorageError> {
    attributes
        .and_then(|attributes| attributes.get(attribute))
        .and_then(|value| value.as_n().ok())
        .and_then(|number| number.parse::<u64>().ok())
        .ok_or_else(|| StorageError::InvalidCounterValue {
            key: key.to_owned(),
        })
}

#[async_trait]
impl CounterStore for DynamoDbCounterStore {
    async fn increment_and_get(&self, key: &str) -> Result<u64, StorageError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(&self.partition_key, AttributeValue::S(key.to_owned()))
            .update_expression(UPDATE_EXPRESSION)
            .expression_attribute_names("#counter", &self.attribute)
            .expression_attribute_values(":zero", AttributeValue::N("0".to_owned()))
            .expression_attribute_values(":inc", AttributeValue::N("1".to_owned()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|error| StorageError::Backend(error.to_string()))
            .with_error_context(|error| {
                format!(
                    "{COMPONENT} (error: {error}) - failed to increment counter for key: {key} in table: {}",
                    self.table
                )
            })?;

        read_counter(&self.attribute, key, output.attributes())
    }
}
