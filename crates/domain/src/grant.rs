use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::BundleId;

/// A subject's record of holding a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleGrant {
    bundle_id: BundleId,
    expiry: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    qualifiers: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    granted_at: Option<DateTime<Utc>>,
}

impl BundleGrant {
    /// Creates a grant with an optional expiry date.
    #[must_use]
    pub fn new(bundle_id: BundleId, expiry: Option<NaiveDate>) -> Self {
        Self {
            bundle_id,
            expiry,
            qualifiers: BTreeMap::new(),
            granted_at: None,
        }
    }

    /// Records the qualifiers the grant was issued under.
    #[must_use]
    pub fn with_qualifiers(mut self, qualifiers: BTreeMap<String, Value>) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    /// Records when the grant was issued.
    #[must_use]
    pub fn with_granted_at(mut self, granted_at: DateTime<Utc>) -> Self {
        self.granted_at = Some(granted_at);
        self
    }

    /// Returns the granted bundle id.
    #[must_use]
    pub fn bundle_id(&self) -> &BundleId {
        &self.bundle_id
    }

    /// Returns the expiry date, or `None` for a grant that never expires.
    #[must_use]
    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry
    }

    /// Returns the qualifiers the grant was issued under.
    #[must_use]
    pub fn qualifiers(&self) -> &BTreeMap<String, Value> {
        &self.qualifiers
    }

    /// Returns when the grant was issued, if recorded.
    #[must_use]
    pub fn granted_at(&self) -> Option<DateTime<Utc>> {
        self.granted_at
    }

    /// Returns whether the grant is for the given bundle.
    #[must_use]
    pub fn is_for(&self, bundle_id: &str) -> bool {
        self.bundle_id.as_str() == bundle_id
    }

    /// Returns whether the grant still counts at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_none_or(|expiry| !expiry_has_passed(expiry, now))
    }
}

/// Returns whether an expiry date lies in the past relative to `now`.
///
/// The date is read as midnight UTC at its start.
#[must_use]
pub fn expiry_has_passed(expiry: NaiveDate, now: DateTime<Utc>) -> bool {
    expiry.and_time(NaiveTime::MIN).and_utc() < now
}
