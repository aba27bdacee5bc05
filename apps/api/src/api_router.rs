use axum::Router;
use axum::middleware::from_fn;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/bundle",
            get(handlers::bundles::list_bundles_handler)
                .post(handlers::bundles::request_bundle_handler)
                .delete(handlers::bundles::remove_bundle_handler),
        )
        .route("/catalog", get(handlers::catalog::catalog_handler))
        .route(
            "/activities/{activity_id}/access",
            get(handlers::catalog::activity_access_handler),
        )
        .route_layer(from_fn(middleware::require_subject));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
