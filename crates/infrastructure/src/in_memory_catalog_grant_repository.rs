use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tollgate_application::GrantRepository;
use tollgate_core::AppResult;
use tollgate_domain::{BundleGrant, BundleId};

/// In-memory catalog grant store.
#[derive(Debug, Default)]
pub struct InMemoryCatalogGrantRepository {
    grants: RwLock<HashMap<String, Vec<BundleGrant>>>,
}

impl InMemoryCatalogGrantRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrantRepository for InMemoryCatalogGrantRepository {
    async fn list_grants(&self, subject: &str) -> AppResult<Vec<BundleGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .get(subject)
            .cloned()
            .unwrap_or_default())
    }

    async fn put_grants(&self, subject: &str, grants: Vec<BundleGrant>) -> AppResult<()> {
        let mut stored = self.grants.write().await;
        if grants.is_empty() {
            stored.remove(subject);
        } else {
            stored.insert(subject.to_owned(), grants);
        }
        Ok(())
    }

    async fn count_holders(&self, bundle_id: &BundleId, as_of: DateTime<Utc>) -> AppResult<u64> {
        let holders = self
            .grants
            .read()
            .await
            .values()
            .filter(|grants| {
                grants
                    .iter()
                    .any(|grant| grant.bundle_id() == bundle_id && grant.is_active_at(as_of))
            })
            .count();

        Ok(u64::try_from(holders).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use tollgate_application::GrantRepository;
    use tollgate_domain::{BundleGrant, BundleId};

    use super::InMemoryCatalogGrantRepository;

    #[tokio::test]
    async fn put_replaces_and_preserves_grant_metadata() {
        let repository = InMemoryCatalogGrantRepository::new();
        let bundle_id = BundleId::new("test").unwrap_or_else(|error| panic!("{error}"));
        let granted_at = Utc
            .with_ymd_and_hms(2025, 1, 1, 9, 30, 0)
            .single()
            .unwrap_or_default();
        let grant = BundleGrant::new(bundle_id.clone(), NaiveDate::from_ymd_opt(2025, 1, 31))
            .with_qualifiers(BTreeMap::from([("transactionId".to_owned(), json!("tx-1"))]))
            .with_granted_at(granted_at);

        assert!(repository.put_grants("alice", vec![grant.clone()]).await.is_ok());
        assert_eq!(repository.list_grants("alice").await.ok(), Some(vec![grant]));
        assert_eq!(
            repository.count_holders(&bundle_id, granted_at).await.ok(),
            Some(1)
        );

        assert!(repository.put_grants("alice", Vec::new()).await.is_ok());
        assert_eq!(repository.list_grants("alice").await.ok(), Some(Vec::new()));
        assert_eq!(
            repository.count_holders(&bundle_id, granted_at).await.ok(),
            Some(0)
        );
    }
}
