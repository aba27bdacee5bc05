use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use tollgate_application::{DEFAULT_LEGACY_USER_LIMIT, LegacyBundlePolicies};
use tollgate_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantStoreConfig {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub catalog_path: PathBuf,
    pub grant_store: GrantStoreConfig,
    pub legacy_policies: LegacyBundlePolicies,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let catalog_path = env::var("CATALOG_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "product-catalogue.toml".to_owned());

        let grant_store = match env::var("GRANT_STORE")
            .unwrap_or_else(|_| "memory".to_owned())
            .as_str()
        {
            "memory" => GrantStoreConfig::Memory,
            "postgres" => GrantStoreConfig::Postgres {
                database_url: required_non_empty_env("DATABASE_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "GRANT_STORE must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        if migrate_only && grant_store == GrantStoreConfig::Memory {
            return Err(AppError::Validation(
                "migrate requires GRANT_STORE=postgres".to_owned(),
            ));
        }

        let default_user_limit = match env::var("LEGACY_BUNDLE_DEFAULT_USER_LIMIT") {
            Ok(value) => value.trim().parse::<u32>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid LEGACY_BUNDLE_DEFAULT_USER_LIMIT: {error}"
                ))
            })?,
            Err(_) => DEFAULT_LEGACY_USER_LIMIT,
        };
        let legacy_policies =
            LegacyBundlePolicies::from_variables(env::vars(), default_user_limit)?;

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            catalog_path: PathBuf::from(catalog_path),
            grant_store,
            legacy_policies,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
