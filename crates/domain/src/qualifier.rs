use std::collections::BTreeMap;

use serde_json::Value;

use crate::BundleDefinition;

/// Request and claim key carrying a purchase transaction id.
pub const TRANSACTION_ID_QUALIFIER: &str = "transactionId";

/// Request and claim key carrying the requester's subscription tier.
pub const SUBSCRIPTION_TIER_QUALIFIER: &str = "subscriptionTier";

/// Namespace the identity provider applies to custom claims.
pub const CUSTOM_CLAIM_PREFIX: &str = "custom:";

/// Reason a request failed a declared qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualifierMismatch {
    /// Bundle requires a transaction id and none was supplied.
    MissingTransactionId,
    /// Supplied tier differs from the bundle's tier.
    SubscriptionTierMismatch,
}

impl QualifierMismatch {
    /// Returns the machine-readable reason code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTransactionId => "missing_transactionId",
            Self::SubscriptionTierMismatch => "subscription_tier_mismatch",
        }
    }
}

/// Outcome of checking a request against a bundle's qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierEvaluation {
    /// Every declared requirement holds and no unknown key was supplied.
    Satisfied,
    /// A declared requirement does not hold.
    Mismatch(QualifierMismatch),
    /// The request carried a key the bundle does not declare.
    Unknown(String),
}

/// Checks request qualifiers and verified claims against a bundle.
///
/// Rules apply in order: transaction id presence, exact subscription tier,
/// then rejection of any unrecognised request key.
#[must_use]
pub fn evaluate_qualifiers(
    bundle: &BundleDefinition,
    claims: &BTreeMap<String, Value>,
    requested: &BTreeMap<String, Value>,
) -> QualifierEvaluation {
    let declared = bundle.qualifiers();

    if declared.requires_transaction_id {
        let present = lookup(requested, claims, TRANSACTION_ID_QUALIFIER).is_some_and(is_present);
        if !present {
            return QualifierEvaluation::Mismatch(QualifierMismatch::MissingTransactionId);
        }
    }

    if let Some(required_tier) = declared.subscription_tier.as_deref() {
        let supplied =
            lookup(requested, claims, SUBSCRIPTION_TIER_QUALIFIER).and_then(Value::as_str);
        if supplied != Some(required_tier) {
            return QualifierEvaluation::Mismatch(QualifierMismatch::SubscriptionTierMismatch);
        }
    }

    requested
        .keys()
        .find(|key| !declared.recognises(key))
        .map_or(QualifierEvaluation::Satisfied, |key| {
            QualifierEvaluation::Unknown(key.clone())
        })
}

/// Request value first, then the plain claim, then the namespaced claim.
fn lookup<'a>(
    requested: &'a BTreeMap<String, Value>,
    claims: &'a BTreeMap<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    requested
        .get(key)
        .or_else(|| claims.get(key))
        .or_else(|| claims.get(&format!("{CUSTOM_CLAIM_PREFIX}{key}")))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    }
}
