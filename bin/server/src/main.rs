mod auth;
mod config;
mod constants;
mod handlers;
mod mailer;
mod state;


use actix_web::{web, App, HttpServer};
use config::{ServerConfig, StorageType};
use mailer::LogMailer;
use state::AppState;
use std::sync::Arc;
use storage::StorageBackend;
use tracing::{error, info};

fn storage_backend(config: &ServerConfig) -> StorageBackend {
    match (&config.storage_type, &config.database_url) {
        (StorageType::Database, Some(database_url)) => {
            info!(
                "Database retry configuration: max_attempts={}, initial_delay_seconds={}",
                config.database_retry_config.max_attempts,
                config.database_retry_config.initial_delay_seconds
            );
            StorageBackend::Database {
                database_url: database_url.clone(),
                retry_config: Some(config.database_retry_config),
            }
        }
        _ => StorageBackend::Filesystem(config.data_dir.clone()),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing with env filter
    // Filter out actix-server worker shutdown messages
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,actix_server::worker=warn,actix_server::accept=warn",
                )
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting document exchange server (PID: {})",
        std::process::id()
    );

    let config = ServerConfig::load().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!("Configuration loaded: {:?}", config);

    let storage = storage_backend(&config).initialize().await.map_err(|e| {
        error!("Failed to initialize storage: {:#}", e);
        std::io::Error::other(format!("Failed to initialize storage: {}", e))
    })?;
    info!("Storage backend initialized successfully");

    let state = AppState::new(&config, storage, Arc::new(LogMailer)).map_err(|e| {
        error!("Invalid token configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let state = web::Data::new(state);

    let bind_address = config.bind_address();
    info!("Starting server on http://{}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .map_err(|e| {
        error!("Failed to bind to {}: {}", bind_address, e);
        e
    })?;

    info!("Server bound successfully to http://{}", bind_address);
    server.run().await
}
