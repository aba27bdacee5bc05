use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use tollgate_application::{BundleRequest, GrantDecision, RevokeOutcome};
use tollgate_core::{AppError, SubjectIdentity};

use crate::dto::{
    ActiveBundlesResponse, BundleGrantResponse, GrantBundleRequest, GrantBundleResponse,
    RemoveBundleRequest, RemoveBundleResponse,
};
use crate::error::{ApiResult, ErrorResponse};
use crate::state::AppState;

pub async fn request_bundle_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SubjectIdentity>,
    payload: Result<Json<GrantBundleRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let decision = state
        .entitlement_service
        .request_bundle(
            &identity,
            BundleRequest {
                bundle_id: payload.bundle_id,
                qualifiers: payload.qualifiers.unwrap_or_default(),
            },
        )
        .await?;
    let status = decision.as_str();

    let response = match decision {
        GrantDecision::Granted { expiry, .. } => {
            granted_response(&state, &identity, status, true, expiry).await?
        }
        GrantDecision::AlreadyGranted { expiry, .. } => {
            granted_response(&state, &identity, status, false, expiry).await?
        }
        GrantDecision::Expired => rejection(
            StatusCode::FORBIDDEN,
            ErrorResponse::new("This bundle has expired."),
        ),
        GrantDecision::LimitReached => rejection(
            StatusCode::FORBIDDEN,
            ErrorResponse::new("User limit reached for this bundle."),
        ),
        GrantDecision::CapReached => {
            rejection(StatusCode::FORBIDDEN, ErrorResponse::new("cap_reached"))
        }
        GrantDecision::QualifierMismatch(reason) => rejection(
            StatusCode::BAD_REQUEST,
            ErrorResponse::qualifier_mismatch(reason.as_str()),
        ),
        GrantDecision::UnknownQualifier(qualifier) => rejection(
            StatusCode::BAD_REQUEST,
            ErrorResponse::unknown_qualifier(qualifier),
        ),
    };

    Ok(response)
}

pub async fn remove_bundle_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SubjectIdentity>,
    payload: Result<Json<RemoveBundleRequest>, JsonRejection>,
) -> ApiResult<Json<RemoveBundleResponse>> {
    let Json(payload) = payload?;
    let status = if payload.remove_all.unwrap_or(false) {
        state.entitlement_service.revoke_all_bundles(&identity).await?;
        "removed_all"
    } else {
        let bundle_id = payload
            .bundle_id
            .filter(|bundle_id| !bundle_id.trim().is_empty())
            .ok_or_else(|| {
                AppError::Validation("Missing bundleId or removeAll in request".to_owned())
            })?;

        match state
            .entitlement_service
            .revoke_bundle(&identity, bundle_id.as_str())
            .await?
        {
            RevokeOutcome::Removed => "removed",
            RevokeOutcome::NotFound => {
                return Err(AppError::NotFound("Bundle not found".to_owned()).into());
            }
        }
    };

    Ok(Json(RemoveBundleResponse {
        status,
        bundles: active_bundles(&state, &identity).await?,
    }))
}

pub async fn list_bundles_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SubjectIdentity>,
) -> ApiResult<Json<ActiveBundlesResponse>> {
    Ok(Json(ActiveBundlesResponse {
        bundles: active_bundles(&state, &identity).await?,
    }))
}

async fn granted_response(
    state: &AppState,
    identity: &SubjectIdentity,
    status: &'static str,
    granted: bool,
    expiry: Option<NaiveDate>,
) -> ApiResult<Response> {
    Ok(Json(GrantBundleResponse {
        status,
        granted,
        bundles: active_bundles(state, identity).await?,
        expiry: expiry.map(|expiry| expiry.to_string()),
    })
    .into_response())
}

async fn active_bundles(
    state: &AppState,
    identity: &SubjectIdentity,
) -> ApiResult<Vec<BundleGrantResponse>> {
    Ok(state
        .entitlement_service
        .active_bundles(identity)
        .await?
        .into_iter()
        .map(BundleGrantResponse::from)
        .collect())
}

fn rejection(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}
