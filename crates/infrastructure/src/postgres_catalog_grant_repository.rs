use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tollgate_application::GrantRepository;
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{BundleGrant, BundleId};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed catalog grant store with one row per subject and bundle.
#[derive(Clone)]
pub struct PostgresCatalogGrantRepository {
    pool: PgPool,
}

impl PostgresCatalogGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BundleGrantRow {
    bundle_id: String,
    expiry: Option<NaiveDate>,
    qualifiers: String,
    granted_at: Option<DateTime<Utc>>,
}

impl BundleGrantRow {
    fn into_grant(self) -> AppResult<BundleGrant> {
        let qualifiers: BTreeMap<String, Value> = serde_json::from_str(self.qualifiers.as_str())
            .map_err(|error| {
                AppError::Internal(format!(
                    "stored qualifiers for bundle '{}' are invalid: {error}",
                    self.bundle_id
                ))
            })?;

        let grant = BundleGrant::new(BundleId::new(self.bundle_id)?, self.expiry)
            .with_qualifiers(qualifiers);

        Ok(match self.granted_at {
            Some(granted_at) => grant.with_granted_at(granted_at),
            None => grant,
        })
    }
}

#[async_trait]
impl GrantRepository for PostgresCatalogGrantRepository {
    async fn list_grants(&self, subject: &str) -> AppResult<Vec<BundleGrant>> {
        let rows = sqlx::query_as::<_, BundleGrantRow>(
            r#"
            SELECT bundle_id, expiry, qualifiers, granted_at
            FROM bundle_grants
            WHERE subject = $1
            ORDER BY granted_at NULLS FIRST, bundle_id
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to list bundle grants: {error}")))?;

        rows.into_iter().map(BundleGrantRow::into_grant).collect()
    }

    async fn put_grants(&self, subject: &str, grants: Vec<BundleGrant>) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Unavailable(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            DELETE FROM bundle_grants
            WHERE subject = $1
            "#,
        )
        .bind(subject)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to clear bundle grants: {error}"))
        })?;

        for grant in &grants {
            let qualifiers = serde_json::to_string(grant.qualifiers()).map_err(|error| {
                AppError::Internal(format!("failed to serialize grant qualifiers: {error}"))
            })?;

            sqlx::query(
                r#"
                INSERT INTO bundle_grants (subject, bundle_id, expiry, qualifiers, granted_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(subject)
            .bind(grant.bundle_id().as_str())
            .bind(grant.expiry())
            .bind(qualifiers)
            .bind(grant.granted_at())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to write bundle grant: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Unavailable(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn count_holders(&self, bundle_id: &BundleId, as_of: DateTime<Utc>) -> AppResult<u64> {
        let holders = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT subject)
            FROM bundle_grants
            WHERE bundle_id = $1
              AND (expiry IS NULL OR (expiry::timestamp AT TIME ZONE 'UTC') >= $2)
            "#,
        )
        .bind(bundle_id.as_str())
        .bind(as_of)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to count bundle holders: {error}"))
        })?;

        Ok(u64::try_from(holders).unwrap_or_default())
    }
}
