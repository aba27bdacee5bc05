use std::collections::BTreeSet;

use super::*;

impl EntitlementService {
    /// Returns whether the subject holds any of `required_bundle_ids`.
    ///
    /// Automatic catalog bundles always count. Persisted grants are read
    /// from the store owning each bundle id, with lapsed grants ignored.
    pub async fn has_access(
        &self,
        identity: &SubjectIdentity,
        required_bundle_ids: &[&str],
    ) -> AppResult<bool> {
        let subject = ensure_subject(identity)?;
        let catalog = self.catalog().await;

        if catalog
            .automatic_bundle_ids()
            .any(|automatic| required_bundle_ids.contains(&automatic.as_str()))
        {
            return Ok(true);
        }

        let now = self.clock.now();
        let (catalog_ids, legacy_ids): (Vec<&str>, Vec<&str>) = required_bundle_ids
            .iter()
            .copied()
            .partition(|bundle_id| catalog.bundle(bundle_id).is_some());
        // Without a catalog, grants already issued from it are still honoured.
        let catalog_ids = if catalog.is_empty() {
            legacy_ids.clone()
        } else {
            catalog_ids
        };

        if !catalog_ids.is_empty() {
            let grants = self.catalog_grants.list_grants(subject).await?;
            if holds_any(&grants, &catalog_ids, now) {
                return Ok(true);
            }
        }

        if legacy_ids.is_empty() {
            return Ok(false);
        }
        let grants = self.legacy_grants_or_empty(subject).await?;
        Ok(holds_any(&grants, &legacy_ids, now))
    }

    /// Returns whether the subject may perform a catalog activity.
    pub async fn has_activity_access(
        &self,
        identity: &SubjectIdentity,
        activity_id: &str,
    ) -> AppResult<bool> {
        let catalog = self.catalog().await;
        let activity = catalog
            .activity(activity_id)
            .ok_or_else(|| AppError::NotFound(format!("Activity '{activity_id}' not found")))?;

        let required: Vec<&str> = activity.bundles().iter().map(BundleId::as_str).collect();
        self.has_access(identity, &required).await
    }

    /// Lists the bundles the subject currently holds.
    ///
    /// Automatic bundles appear without expiry; lapsed grants are omitted.
    pub async fn active_bundles(&self, identity: &SubjectIdentity) -> AppResult<Vec<BundleGrant>> {
        let subject = ensure_subject(identity)?;
        let catalog = self.catalog().await;
        let now = self.clock.now();

        let mut seen = BTreeSet::new();
        let mut active = Vec::new();

        for bundle_id in catalog.automatic_bundle_ids() {
            if seen.insert(bundle_id.as_str().to_owned()) {
                active.push(BundleGrant::new(bundle_id.clone(), None));
            }
        }

        let catalog_grants = self.catalog_grants.list_grants(subject).await?;
        let legacy_grants = self.legacy_grants_or_empty(subject).await?;
        for grant in catalog_grants.into_iter().chain(legacy_grants) {
            if grant.is_active_at(now) && seen.insert(grant.bundle_id().as_str().to_owned()) {
                active.push(grant);
            }
        }

        Ok(active)
    }
}

fn holds_any(grants: &[BundleGrant], bundle_ids: &[&str], now: DateTime<Utc>) -> bool {
    bundle_ids
        .iter()
        .any(|bundle_id| active_grant(grants, bundle_id, now).is_some())
}
