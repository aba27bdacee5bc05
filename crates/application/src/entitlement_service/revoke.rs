use tracing::info;

use super::*;

impl EntitlementService {
    /// Removes every stored grant of one bundle from the subject.
    pub async fn revoke_bundle(
        &self,
        identity: &SubjectIdentity,
        bundle_id: &str,
    ) -> AppResult<RevokeOutcome> {
        let subject = ensure_subject(identity)?;
        let bundle_id = validated_bundle_id(bundle_id)?;
        let catalog = self.catalog().await;
        let store = self.grant_store_for(&catalog, bundle_id.as_str());

        let grants = match store.list_grants(subject).await {
            Err(AppError::NotFound(_)) => return Ok(RevokeOutcome::NotFound),
            result => result?,
        };
        let held = grants.len();
        let remaining: Vec<BundleGrant> = grants
            .into_iter()
            .filter(|grant| !grant.is_for(bundle_id.as_str()))
            .collect();

        if remaining.len() == held {
            return Ok(RevokeOutcome::NotFound);
        }

        store.put_grants(subject, remaining).await?;
        info!(subject, bundle_id = %bundle_id, "bundle revoked");

        Ok(RevokeOutcome::Removed)
    }

    /// Removes every stored grant from the subject in both stores.
    pub async fn revoke_all_bundles(&self, identity: &SubjectIdentity) -> AppResult<()> {
        let subject = ensure_subject(identity)?;

        self.catalog_grants.put_grants(subject, Vec::new()).await?;
        if !self.legacy_grants_or_empty(subject).await?.is_empty() {
            self.legacy_grants.put_grants(subject, Vec::new()).await?;
        }
        info!(subject, "all bundles revoked");

        Ok(())
    }
}
