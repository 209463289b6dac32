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

use crate::server_error::LogError;
use axum::extract::rejection::{BytesRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error(transparent)]
    Log(#[from] LogError),
    /// Request refused by an extractor before reaching the handler.
    #[error("{reason}")]
    Rejected { status: StatusCode, reason: String },
    #[error("not found")]
    ResourceNotFound,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl CustomError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CustomError::Log(error) if error.is_validation() => StatusCode::BAD_REQUEST,
            CustomError::Log(LogError::WriteFailed { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::Log(_) => StatusCode::SERVICE_UNAVAILABLE,
            CustomError::Rejected { status, .. } => *status,
            CustomError::ResourceNotFound => StatusCode::NOT_FOUND,
        }
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),+) => {
        $(
            impl From<$rejection> for CustomError {
                fn from(rejection: $rejection) -> Self {
                    CustomError::Rejected {
                        status: rejection.status(),
                        reason: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

impl_from_rejection!(BytesRejection, PathRejection, QueryRejection);

impl IntoResponse for CustomError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed with status: {status}, error: {self}");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
