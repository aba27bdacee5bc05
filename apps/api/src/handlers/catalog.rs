use axum::Json;
use axum::extract::{Extension, Path, State};
use tollgate_core::SubjectIdentity;

use crate::dto::{ActivityAccessResponse, CatalogResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn catalog_handler(State(state): State<AppState>) -> Json<CatalogResponse> {
    let catalog = state.entitlement_service.catalog().await;
    Json(CatalogResponse::from(catalog.as_ref()))
}

pub async fn activity_access_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SubjectIdentity>,
    Path(activity_id): Path<String>,
) -> ApiResult<Json<ActivityAccessResponse>> {
    let allowed = state
        .entitlement_service
        .has_activity_access(&identity, activity_id.as_str())
        .await?;

    Ok(Json(ActivityAccessResponse {
        activity_id,
        allowed,
    }))
}
