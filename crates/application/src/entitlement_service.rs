use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tollgate_core::{AppError, AppResult, SubjectIdentity};
use tollgate_domain::{BundleCatalog, BundleGrant, BundleId, QualifierMismatch};
use tracing::warn;

use crate::{CatalogRepository, Clock, GrantRepository, LegacyBundlePolicies};

mod access;
mod request;
mod revoke;


/// Input for a bundle grant request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleRequest {
    /// Requested bundle id as supplied by the caller.
    pub bundle_id: String,
    /// Qualifiers supplied with the request.
    pub qualifiers: BTreeMap<String, Value>,
}

/// Terminal state of a bundle grant request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantDecision {
    /// The bundle was granted by this request.
    Granted {
        /// Granted bundle.
        bundle_id: BundleId,
        /// Expiry of the new grant; `None` never expires.
        expiry: Option<NaiveDate>,
    },
    /// The subject already holds an active grant; nothing was written.
    AlreadyGranted {
        /// Held bundle.
        bundle_id: BundleId,
        /// Expiry of the held grant.
        expiry: Option<NaiveDate>,
    },
    /// The legacy bundle's configured expiry date has passed.
    Expired,
    /// The legacy bundle's user limit is reached.
    LimitReached,
    /// The catalog bundle's cap is reached.
    CapReached,
    /// A declared qualifier does not hold.
    QualifierMismatch(QualifierMismatch),
    /// The request carried an unrecognised qualifier key.
    UnknownQualifier(String),
}

impl GrantDecision {
    /// Returns a stable status value for this decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted { .. } => "granted",
            Self::AlreadyGranted { .. } => "already_granted",
            Self::Expired => "expired",
            Self::LimitReached => "limit_reached",
            Self::CapReached => "cap_reached",
            Self::QualifierMismatch(_) => "qualifier_mismatch",
            Self::UnknownQualifier(_) => "unknown_qualifier",
        }
    }
}

/// Terminal state of a single-bundle revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// At least one matching grant was removed.
    Removed,
    /// The subject held no grant for the bundle.
    NotFound,
}

/// Application service granting, revoking and enforcing bundle entitlements.
///
/// Bundles present in the catalog live in `catalog_grants`; every other
/// bundle id is served by `legacy_grants` under the legacy policies.
#[derive(Clone)]
pub struct EntitlementService {
    catalog_repository: Arc<dyn CatalogRepository>,
    catalog_grants: Arc<dyn GrantRepository>,
    legacy_grants: Arc<dyn GrantRepository>,
    legacy_policies: Arc<LegacyBundlePolicies>,
    clock: Arc<dyn Clock>,
}

impl EntitlementService {
    /// Creates a new entitlement service from its ports.
    #[must_use]
    pub fn new(
        catalog_repository: Arc<dyn CatalogRepository>,
        catalog_grants: Arc<dyn GrantRepository>,
        legacy_grants: Arc<dyn GrantRepository>,
        legacy_policies: LegacyBundlePolicies,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog_repository,
            catalog_grants,
            legacy_grants,
            legacy_policies: Arc::new(legacy_policies),
            clock,
        }
    }

    /// Returns the loaded catalog, or an empty one when it cannot be loaded.
    pub async fn catalog(&self) -> Arc<BundleCatalog> {
        match self.catalog_repository.load_catalog().await {
            Ok(catalog) => catalog,
            Err(error) => {
                warn!(%error, "bundle catalog unavailable, serving legacy bundles only");
                Arc::new(BundleCatalog::empty())
            }
        }
    }

    /// Reads legacy grants, treating a subject unknown to the legacy store as holding none.
    async fn legacy_grants_or_empty(&self, subject: &str) -> AppResult<Vec<BundleGrant>> {
        match self.legacy_grants.list_grants(subject).await {
            Err(AppError::NotFound(_)) => Ok(Vec::new()),
            result => result,
        }
    }

    fn grant_store_for(&self, catalog: &BundleCatalog, bundle_id: &str) -> &dyn GrantRepository {
        if catalog.bundle(bundle_id).is_some() {
            self.catalog_grants.as_ref()
        } else {
            self.legacy_grants.as_ref()
        }
    }
}

fn validated_bundle_id(value: &str) -> AppResult<BundleId> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(
            "Missing bundleId in request".to_owned(),
        ));
    }

    BundleId::new(value)
}

fn active_grant<'a>(
    grants: &'a [BundleGrant],
    bundle_id: &str,
    now: DateTime<Utc>,
) -> Option<&'a BundleGrant> {
    grants
        .iter()
        .find(|grant| grant.is_for(bundle_id) && grant.is_active_at(now))
}

/// Keeps every grant for other bundles and appends the new one.
fn merged_grants(existing: Vec<BundleGrant>, grant: BundleGrant) -> Vec<BundleGrant> {
    let bundle_id = grant.bundle_id().as_str().to_owned();
    let mut merged: Vec<BundleGrant> = existing
        .into_iter()
        .filter(|held| !held.is_for(bundle_id.as_str()))
        .collect();
    merged.push(grant);
    merged
}

fn ensure_subject(identity: &SubjectIdentity) -> AppResult<&str> {
    let subject = identity.subject();
    if subject.trim().is_empty() {
        return Err(AppError::Unauthorized(
            "subject identifier is required".to_owned(),
        ));
    }

    Ok(subject)
}
