use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tollgate_application::CatalogRepository;
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{
    ActivityDefinition, AllocationPolicy, BundleCatalog, BundleDefinition, BundleId,
    BundleQualifiers,
};
use tracing::{info, warn};

/// Catalog repository reading a TOML product catalogue from disk.
///
/// The catalogue is read once and the outcome is kept for the lifetime of the
/// repository. A missing or invalid document is logged and served as an empty
/// catalogue, so every bundle resolves through the legacy path until restart.
#[derive(Debug)]
pub struct TomlCatalogRepository {
    path: PathBuf,
    catalog: OnceCell<Arc<BundleCatalog>>,
}

impl TomlCatalogRepository {
    /// Creates a repository for the catalogue at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            catalog: OnceCell::new(),
        }
    }

    /// Returns the catalogue path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    async fn read_catalog(&self) -> AppResult<Arc<BundleCatalog>> {
        let document = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to read catalogue '{}': {error}",
                    self.path.display()
                ))
            })?;

        let catalog = parse_catalog(document.as_str())?;
        info!(
            path = %self.path.display(),
            bundles = catalog.bundles().count(),
            activities = catalog.activities().count(),
            "bundle catalogue loaded"
        );

        Ok(Arc::new(catalog))
    }
}

#[async_trait]
impl CatalogRepository for TomlCatalogRepository {
    async fn load_catalog(&self) -> AppResult<Arc<BundleCatalog>> {
        let catalog = self
            .catalog
            .get_or_init(|| async {
                match self.read_catalog().await {
                    Ok(catalog) => catalog,
                    Err(error) => {
                        warn!(
                            path = %self.path.display(),
                            %error,
                            "bundle catalogue unavailable, serving an empty catalogue"
                        );
                        Arc::new(BundleCatalog::empty())
                    }
                }
            })
            .await;

        Ok(catalog.clone())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    bundles: Vec<BundleEntry>,
    #[serde(default)]
    activities: Vec<ActivityEntry>,
}

#[derive(Debug, Deserialize)]
struct BundleEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    allocation: String,
    #[serde(default)]
    qualifiers: Option<QualifiersEntry>,
    #[serde(default)]
    cap: Option<u32>,
    #[serde(default)]
    timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QualifiersEntry {
    #[serde(default)]
    requires_transaction_id: bool,
    #[serde(default)]
    subscription_tier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    bundles: Vec<String>,
}

/// Parses a TOML catalogue with `[[bundles]]` and `[[activities]]` tables.
pub fn parse_catalog(document: &str) -> AppResult<BundleCatalog> {
    let document: CatalogDocument = toml::from_str(document)
        .map_err(|error| AppError::Validation(format!("invalid catalogue document: {error}")))?;

    let bundles = document
        .bundles
        .into_iter()
        .map(bundle_definition)
        .collect::<AppResult<Vec<_>>>()?;

    let activities = document
        .activities
        .into_iter()
        .map(|entry| {
            let bundle_ids = entry
                .bundles
                .into_iter()
                .map(|bundle_id| {
                    if bundles.iter().any(|bundle| bundle.id().as_str() == bundle_id) {
                        BundleId::new(bundle_id)
                    } else {
                        Err(AppError::Validation(format!(
                            "activity '{}' references undeclared bundle '{bundle_id}'",
                            entry.id
                        )))
                    }
                })
                .collect::<AppResult<Vec<_>>>()?;

            ActivityDefinition::new(entry.id, entry.name, bundle_ids)
        })
        .collect::<AppResult<Vec<_>>>()?;

    BundleCatalog::new(bundles, activities)
}

fn bundle_definition(entry: BundleEntry) -> AppResult<BundleDefinition> {
    let allocation = entry.allocation.parse::<AllocationPolicy>()?;
    let qualifiers = entry.qualifiers.unwrap_or_default();

    Ok(BundleDefinition::new(
        BundleId::new(entry.id)?,
        entry.name,
        allocation,
        BundleQualifiers {
            requires_transaction_id: qualifiers.requires_transaction_id,
            subscription_tier: qualifiers
                .subscription_tier
                .filter(|tier| !tier.trim().is_empty()),
        },
        entry.cap,
        entry.timeout.filter(|timeout| !timeout.trim().is_empty()),
    ))
}
