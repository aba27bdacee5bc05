use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tollgate_core::{AppError, AppResult, NonEmptyString};

use crate::qualifier::{SUBSCRIPTION_TIER_QUALIFIER, TRANSACTION_ID_QUALIFIER};

/// Separator used by the legacy attribute encoding; bundle ids may not contain it.
const LEGACY_DELIMITER: char = '|';

/// Marker opening an expiry segment in the legacy attribute encoding.
const LEGACY_EXPIRY_MARKER: &str = "EXPIRY=";

/// Validated bundle identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BundleId(NonEmptyString);

impl BundleId {
    /// Creates a bundle id.
    ///
    /// Blank values, surrounding whitespace, the legacy delimiter and a leading
    /// expiry marker are rejected, so every id survives the legacy encoding.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = NonEmptyString::new(value)
            .map_err(|_| AppError::Validation("bundle id must not be empty".to_owned()))?;
        let raw = value.as_str();

        if raw.trim() != raw {
            return Err(AppError::Validation(format!(
                "bundle id '{value}' must not have surrounding whitespace"
            )));
        }

        if raw.contains(LEGACY_DELIMITER) {
            return Err(AppError::Validation(format!(
                "bundle id '{value}' must not contain '{LEGACY_DELIMITER}'"
            )));
        }

        if raw.starts_with(LEGACY_EXPIRY_MARKER) {
            return Err(AppError::Validation(format!(
                "bundle id '{value}' must not start with '{LEGACY_EXPIRY_MARKER}'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for BundleId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BundleId> for String {
    fn from(value: BundleId) -> Self {
        value.0.into()
    }
}

impl Borrow<str> for BundleId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Display for BundleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// How a bundle reaches a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationPolicy {
    /// Held by every subject; never persisted.
    #[serde(rename = "automatic")]
    Automatic,
    /// Granted on explicit request, persisted, optionally capped and time-limited.
    #[serde(rename = "on-request")]
    OnRequest,
}

impl AllocationPolicy {
    /// Returns the catalog value for this policy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::OnRequest => "on-request",
        }
    }
}

impl FromStr for AllocationPolicy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "automatic" => Ok(Self::Automatic),
            "on-request" => Ok(Self::OnRequest),
            _ => Err(AppError::Validation(format!(
                "unknown allocation policy '{value}'"
            ))),
        }
    }
}

/// Qualifier requirements declared by a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleQualifiers {
    /// Whether a transaction id must accompany the request.
    pub requires_transaction_id: bool,
    /// Exact subscription tier the requester must hold.
    pub subscription_tier: Option<String>,
}

impl BundleQualifiers {
    /// Returns whether a request qualifier key is recognised for this bundle.
    ///
    /// Only the keys backing a declared requirement are accepted.
    #[must_use]
    pub fn recognises(&self, key: &str) -> bool {
        match key {
            TRANSACTION_ID_QUALIFIER => self.requires_transaction_id,
            SUBSCRIPTION_TIER_QUALIFIER => self.subscription_tier.is_some(),
            _ => false,
        }
    }
}

/// Catalog entry describing one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDefinition {
    id: BundleId,
    name: Option<String>,
    allocation: AllocationPolicy,
    qualifiers: BundleQualifiers,
    cap: Option<u32>,
    timeout: Option<String>,
}

impl BundleDefinition {
    /// Creates a bundle definition.
    #[must_use]
    pub fn new(
        id: BundleId,
        name: Option<String>,
        allocation: AllocationPolicy,
        qualifiers: BundleQualifiers,
        cap: Option<u32>,
        timeout: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            allocation,
            qualifiers,
            cap,
            timeout,
        }
    }

    /// Returns the bundle id.
    #[must_use]
    pub fn id(&self) -> &BundleId {
        &self.id
    }

    /// Returns the display name, if the catalog provides one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the allocation policy.
    #[must_use]
    pub fn allocation(&self) -> AllocationPolicy {
        self.allocation
    }

    /// Returns the declared qualifier requirements.
    #[must_use]
    pub fn qualifiers(&self) -> &BundleQualifiers {
        &self.qualifiers
    }

    /// Returns the maximum number of concurrent holders, if capped.
    #[must_use]
    pub fn cap(&self) -> Option<u32> {
        self.cap
    }

    /// Returns the raw ISO-8601 grant lifetime, if time-limited.
    #[must_use]
    pub fn timeout(&self) -> Option<&str> {
        self.timeout.as_deref()
    }

    /// Returns whether every subject implicitly holds this bundle.
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.allocation == AllocationPolicy::Automatic
    }
}

/// Protected capability gated by bundle membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    id: NonEmptyString,
    name: Option<String>,
    bundles: Vec<BundleId>,
}

impl ActivityDefinition {
    /// Creates an activity definition.
    pub fn new(
        id: impl Into<String>,
        name: Option<String>,
        bundles: Vec<BundleId>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            name,
            bundles,
        })
    }

    /// Returns the activity id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the display name, if the catalog provides one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the bundles any one of which satisfies the activity.
    #[must_use]
    pub fn bundles(&self) -> &[BundleId] {
        &self.bundles
    }
}
