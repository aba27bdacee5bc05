use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tollgate_application::GrantRepository;
use tollgate_core::AppResult;
use tollgate_domain::{BundleGrant, BundleId};
use tracing::warn;

use crate::legacy_attribute_codec::{decode_grants, encode_grants};

/// In-memory legacy grant store holding one encoded attribute per subject.
///
/// Subjects that were never written read as holding no grants.
#[derive(Debug, Default)]
pub struct InMemoryLegacyGrantRepository {
    attributes: RwLock<HashMap<String, String>>,
}

impl InMemoryLegacyGrantRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrantRepository for InMemoryLegacyGrantRepository {
    async fn list_grants(&self, subject: &str) -> AppResult<Vec<BundleGrant>> {
        match self.attributes.read().await.get(subject) {
            Some(attribute) => decode_grants(attribute.as_str()),
            None => Ok(Vec::new()),
        }
    }

    async fn put_grants(&self, subject: &str, grants: Vec<BundleGrant>) -> AppResult<()> {
        self.attributes
            .write()
            .await
            .insert(subject.to_owned(), encode_grants(&grants));
        Ok(())
    }

    async fn count_holders(&self, bundle_id: &BundleId, as_of: DateTime<Utc>) -> AppResult<u64> {
        let attributes = self.attributes.read().await;
        let mut holders = 0_u64;

        for (subject, attribute) in attributes.iter() {
            match decode_grants(attribute.as_str()) {
                Ok(grants) => {
                    if grants
                        .iter()
                        .any(|grant| grant.bundle_id() == bundle_id && grant.is_active_at(as_of))
                    {
                        holders += 1;
                    }
                }
                Err(error) => warn!(
                    subject = subject.as_str(),
                    %error,
                    "skipping undecodable bundle attribute"
                ),
            }
        }

        Ok(holders)
    }
}
