use std::collections::BTreeMap;

use tollgate_core::{AppError, AppResult};

use crate::{ActivityDefinition, BundleDefinition, BundleId};

/// Read-only registry of bundles and activities, built once per process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleCatalog {
    bundles: BTreeMap<BundleId, BundleDefinition>,
    activities: BTreeMap<String, ActivityDefinition>,
}

impl BundleCatalog {
    /// Builds a catalog, rejecting duplicate bundle or activity ids.
    pub fn new(
        bundles: Vec<BundleDefinition>,
        activities: Vec<ActivityDefinition>,
    ) -> AppResult<Self> {
        let mut bundle_index = BTreeMap::new();
        for bundle in bundles {
            let id = bundle.id().clone();
            if bundle_index.insert(id.clone(), bundle).is_some() {
                return Err(AppError::Validation(format!(
                    "catalog declares bundle '{id}' more than once"
                )));
            }
        }

        let mut activity_index = BTreeMap::new();
        for activity in activities {
            let id = activity.id().to_owned();
            if activity_index.insert(id.clone(), activity).is_some() {
                return Err(AppError::Validation(format!(
                    "catalog declares activity '{id}' more than once"
                )));
            }
        }

        Ok(Self {
            bundles: bundle_index,
            activities: activity_index,
        })
    }

    /// Returns a catalog with no bundles and no activities.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns whether the catalog declares nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty() && self.activities.is_empty()
    }

    /// Looks up a bundle definition. A miss is a normal outcome.
    #[must_use]
    pub fn bundle(&self, bundle_id: &str) -> Option<&BundleDefinition> {
        self.bundles.get(bundle_id)
    }

    /// Looks up an activity definition.
    #[must_use]
    pub fn activity(&self, activity_id: &str) -> Option<&ActivityDefinition> {
        self.activities.get(activity_id)
    }

    /// Iterates bundles ordered by id.
    pub fn bundles(&self) -> impl Iterator<Item = &BundleDefinition> {
        self.bundles.values()
    }

    /// Iterates activities ordered by id.
    pub fn activities(&self) -> impl Iterator<Item = &ActivityDefinition> {
        self.activities.values()
    }

    /// Iterates the bundles every subject holds implicitly.
    pub fn automatic_bundle_ids(&self) -> impl Iterator<Item = &BundleId> {
        self.bundles
            .values()
            .filter(|bundle| bundle.is_automatic())
            .map(BundleDefinition::id)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ActivityDefinition, AllocationPolicy, BundleDefinition, BundleId, BundleQualifiers,
    };

    use super::BundleCatalog;

    fn bundle(id: &str, allocation: AllocationPolicy) -> BundleDefinition {
        BundleDefinition::new(
            BundleId::new(id).unwrap_or_else(|_| unreachable!()),
            None,
            allocation,
            BundleQualifiers::default(),
            None,
            None,
        )
    }

    #[test]
    fn duplicate_bundle_ids_are_rejected() {
        let result = BundleCatalog::new(
            vec![
                bundle("test", AllocationPolicy::OnRequest),
                bundle("test", AllocationPolicy::Automatic),
            ],
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn lookup_and_automatic_listing() {
        let catalog = BundleCatalog::new(
            vec![
                bundle("default", AllocationPolicy::Automatic),
                bundle("test", AllocationPolicy::OnRequest),
            ],
            vec![
                ActivityDefinition::new(
                    "submit-vat",
                    Some("Submit VAT".to_owned()),
                    vec![BundleId::new("test").unwrap_or_else(|_| unreachable!())],
                )
                .unwrap_or_else(|_| unreachable!()),
            ],
        )
        .unwrap_or_default();

        assert!(catalog.bundle("test").is_some());
        assert!(catalog.bundle("legacy-promo").is_none());
        assert!(catalog.activity("submit-vat").is_some());

        let automatic: Vec<&str> = catalog
            .automatic_bundle_ids()
            .map(BundleId::as_str)
            .collect();
        assert_eq!(automatic, vec!["default"]);
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        let catalog = BundleCatalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.bundle("default").is_none());
        assert_eq!(catalog.automatic_bundle_ids().count(), 0);
    }
}
