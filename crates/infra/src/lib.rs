//! Infrastructure layer: persistence, application services, configuration.
//!
//! The domain crates (`stockconf-catalog`, `stockconf-combos`,
//! `stockconf-staff`) hold the rules; this crate runs them against a store
//! inside one transaction per operation.

pub mod config;
pub mod services;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, Settings};
pub use services::{
    Backoffice, CatalogService, CategoryDeletion, ComboService, ServiceError, ServiceResult,
    StaffService,
};
pub use store::{InMemoryStore, PostgresStore, Store, StoreError, StoreResult, Transaction};
