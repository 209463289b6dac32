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

use crate::configs::server::S3Config;
use crate::server_error::StorageError;
use crate::streaming::storage::{ListPage, ListQuery, ObjectStore, COMPONENT};
use async_trait::async_trait;
use bytes::Bytes;
use error_set::ErrContext;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use std::fmt;
use tracing::{debug, error, info};

const CONTENT_TYPE: &str = "application/json";

/// Object store backed by an S3 (or S3 compatible) bucket.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
}

impl fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket.name())
            .finish()
    }
}

impl S3ObjectStore {
    /// Creates a new S3 object store.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is invalid or no credentials can be resolved.
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            config.key_id.as_deref(),
            config.key_secret.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|error| {
            StorageError::InvalidConfig(format!("cannot resolve S3 credentials: {error}"))
        })?;

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config.region.parse().map_err(|error| {
                StorageError::InvalidConfig(format!(
                    "invalid S3 region: {}, {error}",
                    config.region
                ))
            })?,
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials).map_err(|error| {
            StorageError::InvalidConfig(format!("cannot create S3 bucket client: {error}"))
        })?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        info!(
            "Initialized S3 object store for bucket: {}, path style: {}",
            config.bucket, config.path_style
        );
        Ok(Self { bucket })
    }
}

fn backend_error(error: S3Error) -> StorageError {
    StorageError::Backend(error.to_string())
}

fn ensure_success(status: u16, action: &str, key: &str) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(StorageError::Backend(format!(
        "S3 {action} for key: {key} returned status code: {status}"
    )))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &body, CONTENT_TYPE)
            .await
            .map_err(backend_error)
            .with_error_context(|error| {
                format!("{COMPONENT} (error: {error}) - failed to put object with key: {key}")
            })?;
        ensure_success(response.status_code(), "put", key)
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        match self.bucket.get_object(key).await {
            Ok(response) if response.status_code() == 404 => Ok(None),
            Ok(response) => {
                ensure_success(response.status_code(), "get", key)?;
                Ok(Some(Bytes::copy_from_slice(response.bytes())))
            }
            Err(S3Error::HttpFailWithBody(404, _)) => {
                debug!("Object with key: {key} was not found");
                Ok(None)
            }
            Err(error) => {
                let error = backend_error(error);
                error!("{COMPONENT} (error: {error}) - failed to get object with key: {key}");
                Err(error)
            }
        }
    }

    async fn list(&self, query: ListQuery) -> Result<ListPage, StorageError> {
        let prefix = query.prefix.clone();
        let (result, status) = self
            .bucket
            .list_page(
                query.prefix,
                None,
                query.continuation_token,
                query.start_after,
                Some(query.max_keys.max(1)),
            )
            .await
            .map_err(backend_error)
            .with_error_context(|error| {
                format!("{COMPONENT} (error: {error}) - failed to list objects with prefix: {prefix}")
            })?;
        ensure_success(status, "list", &prefix)?;

        let continuation_token = if result.is_truncated {
            result.next_continuation_token
        } else {
            None
        };
        Ok(ListPage {
            keys: result.contents.into_iter().map(|object| object.key).collect(),
            continuation_token,
        })
    }
}
