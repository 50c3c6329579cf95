use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::error::AppError;
use crate::store::{EntityStore, MemoryStore, RestConfig, RestStore, SqliteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Rest,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "rest" | "supabase" => Ok(StoreBackend::Rest),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::BadRequest(format!("unknown STORE_BACKEND: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
    pub database_url: String,
    pub rest: Option<RestConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::BadRequest(format!("invalid BIND_ADDR: {}", e)))?;

        let backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Sqlite,
        };

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://registrar.db?mode=rwc".to_string());

        let rest = match backend {
            StoreBackend::Rest => Some(RestConfig::from_lookup(&lookup)?),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            backend,
            database_url,
            rest,
        })
    }

    pub async fn build_store(&self) -> Result<Arc<dyn EntityStore>, AppError> {
        info!("using {:?} store", self.backend);
        let store: Arc<dyn EntityStore> = match self.backend {
            StoreBackend::Sqlite => Arc::new(SqliteStore::connect(&self.database_url).await?),
            StoreBackend::Rest => {
                let config = self
                    .rest
                    .clone()
                    .ok_or_else(|| AppError::BadRequest("rest store is not configured".to_string()))?;
                Arc::new(RestStore::new(config)?)
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }
}
