use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tollgate_application::GrantRepository;
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{BundleGrant, BundleId};
use tracing::warn;

use crate::legacy_attribute_codec::{decode_grants, encode_grants};


/// PostgreSQL-backed legacy grant store.
///
/// Subjects are provisioned into `subject_attributes` by the identity
/// directory; a subject without a row is reported as `User not found`.
#[derive(Clone)]
pub struct PostgresLegacyGrantRepository {
    pool: PgPool,
}

impl PostgresLegacyGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantRepository for PostgresLegacyGrantRepository {
    async fn list_grants(&self, subject: &str) -> AppResult<Vec<BundleGrant>> {
        let attribute = sqlx::query_scalar::<_, String>(
            r#"
            SELECT bundles
            FROM subject_attributes
            WHERE subject = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to read bundle attribute: {error}"))
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

        decode_grants(attribute.as_str())
    }

    async fn put_grants(&self, subject: &str, grants: Vec<BundleGrant>) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE subject_attributes
            SET bundles = $2, updated_at = now()
            WHERE subject = $1
            "#,
        )
        .bind(subject)
        .bind(encode_grants(&grants))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to write bundle attribute: {error}"))
        })?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_owned()));
        }

        Ok(())
    }

    async fn count_holders(&self, bundle_id: &BundleId, as_of: DateTime<Utc>) -> AppResult<u64> {
        let attributes = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT subject, bundles
            FROM subject_attributes
            WHERE bundles <> ''
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to scan bundle attributes: {error}"))
        })?;

        let mut holders = 0_u64;
        for (subject, attribute) in attributes {
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
