use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tollgate_domain::BundleGrant;
use ts_rs::TS;

/// Incoming payload for a bundle grant request.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-bundle-request.ts"
)]
pub struct GrantBundleRequest {
    #[serde(default)]
    pub bundle_id: String,
    #[serde(default)]
    #[ts(optional)]
    pub qualifiers: Option<BTreeMap<String, Value>>,
}

/// Incoming payload for removing one bundle or all bundles.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/remove-bundle-request.ts"
)]
pub struct RemoveBundleRequest {
    #[serde(default)]
    #[ts(optional)]
    pub bundle_id: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub remove_all: Option<bool>,
}

/// API representation of a held bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bundle-grant-response.ts"
)]
pub struct BundleGrantResponse {
    pub bundle_id: String,
    pub expiry: Option<String>,
}

impl From<BundleGrant> for BundleGrantResponse {
    fn from(value: BundleGrant) -> Self {
        Self {
            bundle_id: value.bundle_id().as_str().to_owned(),
            expiry: value.expiry().map(|expiry| expiry.to_string()),
        }
    }
}

/// Result of a bundle grant request.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-bundle-response.ts"
)]
pub struct GrantBundleResponse {
    pub status: &'static str,
    pub granted: bool,
    pub bundles: Vec<BundleGrantResponse>,
    pub expiry: Option<String>,
}

/// Result of a bundle removal.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/remove-bundle-response.ts"
)]
pub struct RemoveBundleResponse {
    pub status: &'static str,
    pub bundles: Vec<BundleGrantResponse>,
}

/// Bundles the caller currently holds.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/active-bundles-response.ts"
)]
pub struct ActiveBundlesResponse {
    pub bundles: Vec<BundleGrantResponse>,
}
