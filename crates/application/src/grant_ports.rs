use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tollgate_core::AppResult;
use tollgate_domain::{BundleGrant, BundleId};

/// Repository port for per-subject bundle grants.
///
/// Every call may suspend on remote I/O. Unreachable backends report
/// `AppError::Unavailable`, never an empty result.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Lists every stored grant for a subject, lapsed ones included.
    async fn list_grants(&self, subject: &str) -> AppResult<Vec<BundleGrant>>;

    /// Replaces the subject's stored grants with `grants` in one write.
    async fn put_grants(&self, subject: &str, grants: Vec<BundleGrant>) -> AppResult<()>;

    /// Counts distinct subjects holding an unexpired grant for the bundle.
    ///
    /// A point-in-time scan with no lock against concurrent writers.
    async fn count_holders(&self, bundle_id: &BundleId, as_of: DateTime<Utc>) -> AppResult<u64>;
}
