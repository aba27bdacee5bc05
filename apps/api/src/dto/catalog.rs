use serde::Serialize;
use tollgate_domain::{ActivityDefinition, BundleCatalog, BundleDefinition, BundleId};
use ts_rs::TS;

/// API representation of a catalog bundle.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/catalog-bundle-response.ts"
)]
pub struct CatalogBundleResponse {
    pub id: String,
    pub name: Option<String>,
    pub allocation: String,
    pub requires_transaction_id: bool,
    pub subscription_tier: Option<String>,
    pub cap: Option<u32>,
    pub timeout: Option<String>,
}

impl From<&BundleDefinition> for CatalogBundleResponse {
    fn from(value: &BundleDefinition) -> Self {
        Self {
            id: value.id().as_str().to_owned(),
            name: value.name().map(str::to_owned),
            allocation: value.allocation().as_str().to_owned(),
            requires_transaction_id: value.qualifiers().requires_transaction_id,
            subscription_tier: value.qualifiers().subscription_tier.clone(),
            cap: value.cap(),
            timeout: value.timeout().map(str::to_owned),
        }
    }
}

/// API representation of a catalog activity.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/catalog-activity-response.ts"
)]
pub struct CatalogActivityResponse {
    pub id: String,
    pub name: Option<String>,
    pub bundles: Vec<String>,
}

impl From<&ActivityDefinition> for CatalogActivityResponse {
    fn from(value: &ActivityDefinition) -> Self {
        Self {
            id: value.id().to_owned(),
            name: value.name().map(str::to_owned),
            bundles: value
                .bundles()
                .iter()
                .map(BundleId::as_str)
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Loaded bundle catalogue.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/catalog-response.ts"
)]
pub struct CatalogResponse {
    pub bundles: Vec<CatalogBundleResponse>,
    pub activities: Vec<CatalogActivityResponse>,
}

impl From<&BundleCatalog> for CatalogResponse {
    fn from(value: &BundleCatalog) -> Self {
        Self {
            bundles: value.bundles().map(CatalogBundleResponse::from).collect(),
            activities: value
                .activities()
                .map(CatalogActivityResponse::from)
                .collect(),
        }
    }
}

/// Access decision for one activity.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/activity-access-response.ts"
)]
pub struct ActivityAccessResponse {
    pub activity_id: String,
    pub allowed: bool,
}
