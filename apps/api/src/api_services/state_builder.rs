use std::sync::Arc;

use sqlx::PgPool;
use tollgate_application::{EntitlementService, GrantRepository};
use tollgate_infrastructure::{
    InMemoryCatalogGrantRepository, InMemoryLegacyGrantRepository, PostgresCatalogGrantRepository,
    PostgresLegacyGrantRepository, SystemClock, TomlCatalogRepository,
};
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

struct GrantStores {
    catalog_grants: Arc<dyn GrantRepository>,
    legacy_grants: Arc<dyn GrantRepository>,
}

pub fn build_app_state(config: &ApiConfig, pool: Option<PgPool>) -> AppState {
    let stores = match pool {
        Some(pool) => {
            info!("using postgres grant stores");
            GrantStores {
                catalog_grants: Arc::new(PostgresCatalogGrantRepository::new(pool.clone())),
                legacy_grants: Arc::new(PostgresLegacyGrantRepository::new(pool)),
            }
        }
        None => {
            info!("using in-memory grant stores");
            GrantStores {
                catalog_grants: Arc::new(InMemoryCatalogGrantRepository::new()),
                legacy_grants: Arc::new(InMemoryLegacyGrantRepository::new()),
            }
        }
    };

    AppState {
        entitlement_service: EntitlementService::new(
            Arc::new(TomlCatalogRepository::new(config.catalog_path.clone())),
            stores.catalog_grants,
            stores.legacy_grants,
            config.legacy_policies.clone(),
            Arc::new(SystemClock),
        ),
    }
}
