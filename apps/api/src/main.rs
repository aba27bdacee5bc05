//! Tollgate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use tollgate_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, GrantStoreConfig, init_tracing};
use crate::api_services::{build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = match &config.grant_store {
        GrantStoreConfig::Postgres { database_url } => {
            Some(connect_and_migrate(database_url.as_str()).await?)
        }
        GrantStoreConfig::Memory => None,
    };

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = build_app_state(&config, pool);
    let catalog = app_state.entitlement_service.catalog().await;
    info!(
        path = %config.catalog_path.display(),
        bundles = catalog.bundles().count(),
        "bundle catalogue ready"
    );

    let app = api_router::build_router(app_state);
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "tollgate-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
