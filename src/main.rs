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

use clap::Parser;
use dotenvy::dotenv;
use figlet_rs::FIGfont;
use std::sync::Arc;
use tidelog::args::Args;
use tidelog::bootstrap;
use tidelog::configs::server::ServerConfig;
use tidelog::http;
use tidelog::server_error::ServerError;
use tracing::info;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    if let Ok(font) = FIGfont::standard() {
        if let Some(figure) = font.convert("Tidelog") {
            eprintln!("{figure}");
        }
    }

    if let Ok(env_path) = std::env::var("TIDELOG_ENV_PATH") {
        if dotenvy::from_path(&env_path).is_ok() {
            eprintln!("Loaded environment variables from path: {env_path}");
        }
    } else if let Ok(path) = dotenv() {
        eprintln!(
            "Loaded environment variables from .env file at path: {}",
            path.display()
        );
    }

    let args = Args::parse();
    eprintln!("Loading configuration from: {}", args.config_path);
    let config = ServerConfig::load(&args.config_path)?;
    bootstrap::init_logging(&config.logging);

    info!("Starting Tidelog server...");
    let state = Arc::new(bootstrap::load_state(&config).await?);
    http::start(&config.http, state).await?;

    info!("Tidelog server stopped successfully");
    Ok(())
}
