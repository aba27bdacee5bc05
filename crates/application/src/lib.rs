//! Application services and ports.

#![forbid(unsafe_code)]

mod catalog_ports;
mod clock;
mod entitlement_service;
mod grant_ports;
mod legacy_policy;

pub use catalog_ports::CatalogRepository;
pub use clock::Clock;
pub use entitlement_service::{BundleRequest, EntitlementService, GrantDecision, RevokeOutcome};
pub use grant_ports::GrantRepository;
pub use legacy_policy::{DEFAULT_LEGACY_USER_LIMIT, LegacyBundlePolicies, LegacyBundlePolicy};
