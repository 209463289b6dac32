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

pub mod error;
pub mod messages;
pub mod shared;
pub mod system;

use crate::configs::server::HttpConfig;
use crate::http::error::CustomError;
use crate::http::shared::AppState;
use crate::server_error::ServerError;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub const COMPONENT: &str = "HTTP_API";

/// Builds the full API. With a stage prefix configured, every route is also
/// reachable under that prefix (e.g. both `/health` and `/v1/health`).
pub fn router(state: Arc<AppState>, config: &HttpConfig) -> Router {
    let api = Router::new()
        .merge(system::router())
        .merge(messages::router(state));

    let mut router = api.clone();
    if let Some(prefix) = &config.stage_prefix {
        router = router.nest(prefix, api);
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_request_size))
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> CustomError {
    CustomError::ResourceNotFound
}

pub async fn start(config: &HttpConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&config.address)
        .await
        .map_err(|source| ServerError::CannotBindListener {
            address: config.address.clone(),
            source,
        })?;
    let address = listener
        .local_addr()
        .map_err(ServerError::HttpServer)?;
    match &config.stage_prefix {
        Some(prefix) => info!("{COMPONENT} listening on: {address}, stage prefix: {prefix}"),
        None => info!("{COMPONENT} listening on: {address}"),
    }

    serve(
        listener,
        router(state, config),
        crate::bootstrap::shutdown_signal(),
    )
    .await
}

pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::HttpServer)?;
    info!("{COMPONENT} stopped");
    Ok(())
}
