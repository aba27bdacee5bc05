mod bundles;
mod catalog;
mod common;

pub use bundles::{
    ActiveBundlesResponse, BundleGrantResponse, GrantBundleRequest, GrantBundleResponse,
    RemoveBundleRequest, RemoveBundleResponse,
};
pub use catalog::{
    ActivityAccessResponse, CatalogActivityResponse, CatalogBundleResponse, CatalogResponse,
};
pub use common::HealthResponse;
