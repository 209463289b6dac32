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

use crate::http::error::CustomError;
use crate::http::shared::AppState;
use crate::server_error::LogError;
use crate::streaming::consume::PolledMessages;
use crate::streaming::produce::ProducedMessage;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{debug_handler, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/topics/{topic}/produce", post(produce))
        .route("/topics/{topic}/consume", get(consume))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ProduceRequest {
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

/// Query values are kept raw so that unparsable numbers fall back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default)]
pub struct ConsumeQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

impl ConsumeQuery {
    /// The first occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = ConsumeQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "offset" => &mut query.offset,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    fn offset(&self) -> Option<i64> {
        self.offset.as_deref().and_then(|value| value.trim().parse().ok())
    }

    fn limit(&self) -> Option<i64> {
        self.limit.as_deref().and_then(|value| value.trim().parse().ok())
    }
}

#[derive(Debug, Serialize)]
pub struct ConsumedMessage {
    pub offset: u64,
    pub payload: serde_json::Value,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub messages: Vec<ConsumedMessage>,
    pub next_offset: u64,
}

impl From<PolledMessages> for ConsumeResponse {
    fn from(polled: PolledMessages) -> Self {
        ConsumeResponse {
            messages: polled
                .messages
                .into_iter()
                .map(|message| ConsumedMessage {
                    offset: message.offset,
                    payload: message.payload,
                    timestamp: message.timestamp,
                })
                .collect(),
            next_offset: polled.next_offset,
        }
    }
}

#[debug_handler]
async fn produce(
    State(state): State<Arc<AppState>>,
    topic: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ProducedMessage>, CustomError> {
    let Path(topic) = topic?;
    let body = body?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(LogError::MissingPayload.into());
    }
    let request: ProduceRequest = serde_json::from_slice(&body)
        .map_err(|error| LogError::InvalidPayload(error.to_string()))?;

    let produced = state.producer.produce(&topic, request.payload).await?;
    Ok(Json(produced))
}

#[debug_handler]
async fn consume(
    State(state): State<Arc<AppState>>,
    topic: Result<Path<String>, PathRejection>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ConsumeResponse>, CustomError> {
    let Path(topic) = topic?;
    let Query(pairs) = query?;
    let query = ConsumeQuery::from_pairs(pairs);
    let args = state.consumer.polling_args(query.offset(), query.limit());
    let polled = state.consumer.consume(&topic, args).await?;
    Ok(Json(polled.into()))
}
