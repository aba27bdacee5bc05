//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_catalog_grant_repository;
mod in_memory_legacy_grant_repository;
mod legacy_attribute_codec;
mod postgres_catalog_grant_repository;
mod postgres_legacy_grant_repository;
mod system_clock;
mod toml_catalog_repository;

pub use in_memory_catalog_grant_repository::InMemoryCatalogGrantRepository;
pub use in_memory_legacy_grant_repository::InMemoryLegacyGrantRepository;
pub use postgres_catalog_grant_repository::PostgresCatalogGrantRepository;
pub use postgres_legacy_grant_repository::PostgresLegacyGrantRepository;
pub use system_clock::SystemClock;
pub use toml_catalog_repository::{TomlCatalogRepository, parse_catalog};
