use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::body::to_bytes;
use axum::body::Body;
use axum::extract::{Extension, FromRequest, Path, State};
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use tollgate_application::{Clock, EntitlementService, LegacyBundlePolicies, LegacyBundlePolicy};
use tollgate_core::SubjectIdentity;
use tollgate_infrastructure::{
    InMemoryCatalogGrantRepository, InMemoryLegacyGrantRepository, TomlCatalogRepository,
};

use super::bundles::{list_bundles_handler, remove_bundle_handler, request_bundle_handler};
use super::catalog::{activity_access_handler, catalog_handler};
use crate::dto::{GrantBundleRequest, RemoveBundleRequest};
use crate::error::ApiError;
use crate::state::AppState;

const CATALOGUE: &str = r#"
[[bundles]]
id = "default"
allocation = "automatic"

[[bundles]]
id = "test"
allocation = "on-request"
timeout = "P30D"

[[bundles]]
id = "launch-seat"
allocation = "on-request"
cap = 1

[[bundles]]
id = "business"
allocation = "on-request"
qualifiers = { requiresTransactionId = true }

[[activities]]
id = "submit-vat"
bundles = ["test", "business"]
"#;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct TestCatalogue {
    path: PathBuf,
}

impl TestCatalogue {
    fn write(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "tollgate-api-{name}-{}.toml",
            std::process::id()
        ));
        if let Err(error) = std::fs::write(&path, CATALOGUE) {
            panic!("failed to write test catalogue: {error}");
        }
        Self { path }
    }
}

impl Drop for TestCatalogue {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn test_state(catalogue: &TestCatalogue) -> AppState {
    let now = Utc
        .with_ymd_and_hms(2025, 1, 1, 8, 0, 0)
        .single()
        .unwrap_or_default();
    let policies = LegacyBundlePolicies::default()
        .with_policy(
            "legacy-promo",
            LegacyBundlePolicy {
                expiry_date: chrono::NaiveDate::from_ymd_opt(2025, 12, 31),
                user_limit: 1,
            },
        )
        .with_policy(
            "legacy-lapsed",
            LegacyBundlePolicy {
                expiry_date: chrono::NaiveDate::from_ymd_opt(2024, 12, 31),
                user_limit: 10,
            },
        );

    AppState {
        entitlement_service: EntitlementService::new(
            Arc::new(TomlCatalogRepository::new(catalogue.path.clone())),
            Arc::new(InMemoryCatalogGrantRepository::new()),
            Arc::new(InMemoryLegacyGrantRepository::new()),
            policies,
            Arc::new(FixedClock(now)),
        ),
    }
}

fn subject(name: &str) -> SubjectIdentity {
    SubjectIdentity::anonymous_claims(name)
}

fn grant_request(bundle_id: &str) -> GrantBundleRequest {
    GrantBundleRequest {
        bundle_id: bundle_id.to_owned(),
        qualifiers: None,
    }
}

async fn request(
    state: &AppState,
    identity: &SubjectIdentity,
    payload: GrantBundleRequest,
) -> Response {
    match request_bundle_handler(
        State(state.clone()),
        Extension(identity.clone()),
        Ok(Json(payload)),
    )
    .await
    {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

async fn remove(
    state: &AppState,
    identity: &SubjectIdentity,
    payload: RemoveBundleRequest,
) -> Response {
    match remove_bundle_handler(
        State(state.clone()),
        Extension(identity.clone()),
        Ok(Json(payload)),
    )
    .await
    {
        Ok(response) => response.into_response(),
        Err(error) => error.into_response(),
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = match to_bytes(response.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => panic!("failed to read response body: {error}"),
    };
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[tokio::test]
async fn grant_then_regrant_reports_already_granted() {
    let catalogue = TestCatalogue::write("regrant");
    let state = test_state(&catalogue);
    let alice = subject("alice");

    let first = request(&state, &alice, grant_request("test")).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        body_json(first).await,
        json!({
            "status": "granted",
            "granted": true,
            "bundles": [
                {"bundleId": "default", "expiry": null},
                {"bundleId": "test", "expiry": "2025-01-31"}
            ],
            "expiry": "2025-01-31"
        })
    );

    let second = request(&state, &alice, grant_request("test")).await;
    assert_eq!(second.status(), StatusCode::OK);
    let body = body_json(second).await;
    assert_eq!(body["status"], "already_granted");
    assert_eq!(body["granted"], false);
    assert_eq!(body["expiry"], "2025-01-31");
}

#[tokio::test]
async fn validation_failures_map_to_bad_request_bodies() {
    let catalogue = TestCatalogue::write("validation");
    let state = test_state(&catalogue);
    let alice = subject("alice");

    let missing = request(&state, &alice, grant_request("")).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(missing).await,
        json!({"error": "Missing bundleId in request"})
    );

    let unknown = request(
        &state,
        &alice,
        GrantBundleRequest {
            bundle_id: "test".to_owned(),
            qualifiers: Some(BTreeMap::from([("foo".to_owned(), json!("bar"))])),
        },
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(unknown).await,
        json!({"error": "unknown_qualifier", "qualifier": "foo"})
    );

    let mismatch = request(&state, &alice, grant_request("business")).await;
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(mismatch).await,
        json!({"error": "qualifier_mismatch", "reason": "missing_transactionId"})
    );
}

#[tokio::test]
async fn policy_rejections_map_to_forbidden_bodies() {
    let catalogue = TestCatalogue::write("policy");
    let state = test_state(&catalogue);

    let first = request(&state, &subject("alice"), grant_request("legacy-promo")).await;
    assert_eq!(first.status(), StatusCode::OK);

    let limited = request(&state, &subject("bob"), grant_request("legacy-promo")).await;
    assert_eq!(limited.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(limited).await,
        json!({"error": "User limit reached for this bundle."})
    );

    let expired = request(&state, &subject("alice"), grant_request("legacy-lapsed")).await;
    assert_eq!(expired.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(expired).await,
        json!({"error": "This bundle has expired."})
    );

    let seat = request(&state, &subject("alice"), grant_request("launch-seat")).await;
    assert_eq!(seat.status(), StatusCode::OK);
    let capped = request(&state, &subject("bob"), grant_request("launch-seat")).await;
    assert_eq!(capped.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(capped).await, json!({"error": "cap_reached"}));
}

#[tokio::test]
async fn remove_bundle_contract() {
    let catalogue = TestCatalogue::write("remove");
    let state = test_state(&catalogue);
    let alice = subject("alice");

    let neither = remove(&state, &alice, RemoveBundleRequest::default()).await;
    assert_eq!(neither.status(), StatusCode::BAD_REQUEST);

    let not_held = remove(
        &state,
        &alice,
        RemoveBundleRequest {
            bundle_id: Some("test".to_owned()),
            remove_all: None,
        },
    )
    .await;
    assert_eq!(not_held.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(not_held).await, json!({"error": "Bundle not found"}));

    assert_eq!(
        request(&state, &alice, grant_request("test")).await.status(),
        StatusCode::OK
    );
    let removed = remove(
        &state,
        &alice,
        RemoveBundleRequest {
            bundle_id: Some("test".to_owned()),
            remove_all: None,
        },
    )
    .await;
    assert_eq!(removed.status(), StatusCode::OK);
    assert_eq!(
        body_json(removed).await,
        json!({"status": "removed", "bundles": [{"bundleId": "default", "expiry": null}]})
    );

    assert_eq!(
        request(&state, &alice, grant_request("legacy-promo")).await.status(),
        StatusCode::OK
    );
    let removed_all = remove(
        &state,
        &alice,
        RemoveBundleRequest {
            bundle_id: None,
            remove_all: Some(true),
        },
    )
    .await;
    assert_eq!(removed_all.status(), StatusCode::OK);
    assert_eq!(body_json(removed_all).await["status"], "removed_all");

    let listed = list_bundles_handler(State(state.clone()), Extension(alice.clone())).await;
    let listed = match listed {
        Ok(Json(listed)) => listed,
        Err(error) => panic!("listing bundles failed: {error:?}"),
    };
    assert_eq!(listed.bundles.len(), 1);
}

#[tokio::test]
async fn activity_access_and_catalogue_listing() {
    let catalogue = TestCatalogue::write("activity");
    let state = test_state(&catalogue);
    let alice = subject("alice");

    let before = activity_access_handler(
        State(state.clone()),
        Extension(alice.clone()),
        Path("submit-vat".to_owned()),
    )
    .await;
    assert!(matches!(before, Ok(Json(ref access)) if !access.allowed));

    assert_eq!(
        request(&state, &alice, grant_request("test")).await.status(),
        StatusCode::OK
    );
    let after = activity_access_handler(
        State(state.clone()),
        Extension(alice.clone()),
        Path("submit-vat".to_owned()),
    )
    .await;
    assert!(matches!(after, Ok(Json(ref access)) if access.allowed));

    let unknown = activity_access_handler(
        State(state.clone()),
        Extension(alice),
        Path("file-taxes".to_owned()),
    )
    .await;
    let response = match unknown {
        Ok(_) => panic!("unknown activity should be rejected"),
        Err(error) => ApiError::into_response(error),
    };
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let Json(listing) = catalog_handler(State(state)).await;
    let ids: Vec<&str> = listing.bundles.iter().map(|bundle| bundle.id.as_str()).collect();
    assert_eq!(ids, vec!["business", "default", "launch-seat", "test"]);
    assert_eq!(listing.activities.len(), 1);
}

fn json_request(body: &'static str) -> Request<Body> {
    match Request::builder()
        .method("POST")
        .uri("/bundle")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
    {
        Ok(request) => request,
        Err(error) => panic!("failed to build request: {error}"),
    }
}

#[tokio::test]
async fn malformed_bodies_map_to_bad_request_bodies() {
    let catalogue = TestCatalogue::write("malformed");
    let state = test_state(&catalogue);
    let alice = subject("alice");

    for body in [r#"{"bundleId": 5}"#, "{", ""] {
        let payload = Json::<GrantBundleRequest>::from_request(json_request(body), &()).await;
        let response = match request_bundle_handler(
            State(state.clone()),
            Extension(alice.clone()),
            payload,
        )
        .await
        {
            Ok(_) => panic!("body {body:?} should be rejected"),
            Err(error) => error.into_response(),
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await["error"].clone();
        assert!(
            error
                .as_str()
                .is_some_and(|message| message.starts_with("Invalid request body")),
            "unexpected error body {error}"
        );
    }

    let payload =
        Json::<RemoveBundleRequest>::from_request(json_request(r#"{"removeAll": "yes"}"#), &())
            .await;
    let response = match remove_bundle_handler(State(state), Extension(alice), payload).await {
        Ok(_) => panic!("non-boolean removeAll should be rejected"),
        Err(error) => error.into_response(),
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
