use std::sync::Arc;

use async_trait::async_trait;
use tollgate_core::AppResult;
use tollgate_domain::BundleCatalog;

/// Repository port for the declarative bundle catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Returns the parsed catalog.
    ///
    /// Implementations load the document once and hand out the cached value
    /// for the rest of the process lifetime.
    async fn load_catalog(&self) -> AppResult<Arc<BundleCatalog>>;
}
