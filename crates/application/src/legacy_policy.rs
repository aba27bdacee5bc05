//! Expiry and user-limit policy for bundles that predate the catalog.
//!
//! Policies come from environment-style variables keyed by bundle id:
//! `BUNDLE_EXPIRY_DATE_<ID>` and `BUNDLE_USER_LIMIT_<ID>`, where `<ID>` is the
//! bundle id upper-cased with `-` replaced by `_`.

use std::collections::HashMap;

use chrono::NaiveDate;
use tollgate_core::{AppError, AppResult};

const EXPIRY_DATE_PREFIX: &str = "BUNDLE_EXPIRY_DATE_";
const USER_LIMIT_PREFIX: &str = "BUNDLE_USER_LIMIT_";

/// Default number of subjects allowed to hold one legacy bundle.
pub const DEFAULT_LEGACY_USER_LIMIT: u32 = 1000;

/// Policy applied to one legacy bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyBundlePolicy {
    /// Date from which the bundle can no longer be granted; also stamped on grants.
    pub expiry_date: Option<NaiveDate>,
    /// Maximum number of subjects holding the bundle.
    pub user_limit: u32,
}

/// Legacy policies keyed by normalised bundle id.
#[derive(Debug, Clone)]
pub struct LegacyBundlePolicies {
    policies: HashMap<String, LegacyBundlePolicy>,
    default_user_limit: u32,
}

impl Default for LegacyBundlePolicies {
    fn default() -> Self {
        Self::new(DEFAULT_LEGACY_USER_LIMIT)
    }
}

impl LegacyBundlePolicies {
    /// Creates an empty policy set with the given fallback user limit.
    #[must_use]
    pub fn new(default_user_limit: u32) -> Self {
        Self {
            policies: HashMap::new(),
            default_user_limit,
        }
    }

    /// Adds or replaces the policy for one bundle.
    #[must_use]
    pub fn with_policy(mut self, bundle_id: &str, policy: LegacyBundlePolicy) -> Self {
        self.policies.insert(variable_suffix(bundle_id), policy);
        self
    }

    /// Builds policies from `(name, value)` pairs, ignoring unrelated names.
    pub fn from_variables(
        variables: impl IntoIterator<Item = (String, String)>,
        default_user_limit: u32,
    ) -> AppResult<Self> {
        let mut policies = Self::new(default_user_limit);

        for (name, value) in variables {
            if let Some(suffix) = name.strip_prefix(EXPIRY_DATE_PREFIX) {
                let expiry_date = value.trim().parse::<NaiveDate>().map_err(|error| {
                    AppError::Validation(format!("invalid {name} '{value}': {error}"))
                })?;
                policies.entry(suffix).expiry_date = Some(expiry_date);
            } else if let Some(suffix) = name.strip_prefix(USER_LIMIT_PREFIX) {
                let user_limit = value.trim().parse::<u32>().map_err(|error| {
                    AppError::Validation(format!("invalid {name} '{value}': {error}"))
                })?;
                policies.entry(suffix).user_limit = user_limit;
            }
        }

        Ok(policies)
    }

    /// Returns the policy for a bundle, falling back to no expiry and the default limit.
    #[must_use]
    pub fn policy_for(&self, bundle_id: &str) -> LegacyBundlePolicy {
        self.policies
            .get(&variable_suffix(bundle_id))
            .copied()
            .unwrap_or(LegacyBundlePolicy {
                expiry_date: None,
                user_limit: self.default_user_limit,
            })
    }

    fn entry(&mut self, suffix: &str) -> &mut LegacyBundlePolicy {
        let default_user_limit = self.default_user_limit;
        self.policies
            .entry(suffix.to_owned())
            .or_insert(LegacyBundlePolicy {
                expiry_date: None,
                user_limit: default_user_limit,
            })
    }
}

fn variable_suffix(bundle_id: &str) -> String {
    bundle_id.to_ascii_uppercase().replace('-', "_")
}
