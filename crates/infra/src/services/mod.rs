//! Application services.
//!
//! Each operation opens one store transaction, validates, writes, and commits.
//! Any error returns before the commit, so a failed operation leaves the store
//! exactly as it found it.

use std::sync::Arc;

use stockconf_catalog::CatalogPolicy;
use tracing::info;

use crate::config::Settings;
use crate::store::{InMemoryStore, PostgresStore, Store, StoreResult};

pub mod catalog;
pub mod combos;
pub mod error;
pub mod staff;

pub use catalog::{CatalogService, CategoryDeletion};
pub use combos::ComboService;
pub use error::{ServiceError, ServiceResult};
pub use staff::StaffService;

/// The three back-office services over one shared store.
#[derive(Clone)]
pub struct Backoffice {
    pub catalog: CatalogService,
    pub combos: ComboService,
    pub staff: StaffService,
}

impl Backoffice {
    pub fn new(store: Arc<dyn Store>, policy: CatalogPolicy) -> Self {
        Self {
            catalog: CatalogService::new(store.clone(), policy),
            combos: ComboService::new(store.clone()),
            staff: StaffService::new(store),
        }
    }

    pub fn in_memory(policy: CatalogPolicy) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), policy)
    }

    /// PostgreSQL when `DATABASE_URL` is set, in-memory otherwise.
    pub async fn connect(settings: &Settings) -> StoreResult<Self> {
        match &settings.database_url {
            Some(url) => {
                let store = PostgresStore::connect(url, settings.max_connections).await?;
                info!(max_connections = settings.max_connections, "using postgres store");
                Ok(Self::new(Arc::new(store), settings.catalog))
            }
            None => {
                info!("DATABASE_URL not set, using in-memory store");
                Ok(Self::in_memory(settings.catalog))
            }
        }
    }
}
