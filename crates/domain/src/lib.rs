//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod bundle;
mod catalog;
mod duration;
mod grant;
mod qualifier;

pub use bundle::{
    ActivityDefinition, AllocationPolicy, BundleDefinition, BundleId, BundleQualifiers,
};
pub use catalog::BundleCatalog;
pub use duration::{CalendarDuration, add_duration};
pub use grant::{BundleGrant, expiry_has_passed};
pub use qualifier::{
    CUSTOM_CLAIM_PREFIX, QualifierEvaluation, QualifierMismatch, SUBSCRIPTION_TIER_QUALIFIER,
    TRANSACTION_ID_QUALIFIER, evaluate_qualifiers,
};
