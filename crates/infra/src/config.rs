//! Configuration loading from environment variables.

use stockconf_catalog::{CatalogPolicy, SlugPolicy, StockPolicy};
use stockconf_observability::LogFormat;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// PostgreSQL URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub catalog: CatalogPolicy,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            catalog: CatalogPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset and blank values take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    key: "DATABASE_MAX_CONNECTIONS",
                    value: raw,
                })?,
        };

        let slug = match get("CATALOG_SLUG_POLICY") {
            None => SlugPolicy::default(),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "CATALOG_SLUG_POLICY",
                value: raw,
            })?,
        };

        let restore_on_update = flag(&get, "CATALOG_RESTORE_ON_UPDATE", false)?;
        let allow_negative = flag(&get, "CATALOG_ALLOW_NEGATIVE_STOCK", true)?;

        let log_format = match get("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: raw,
            })?,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").map(|v| v.trim().to_string()),
            max_connections,
            catalog: CatalogPolicy {
                slug,
                restore_on_update,
                stock: StockPolicy { allow_negative },
            },
            log_format,
        })
    }

    /// The database URL, for tools that cannot run without one.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

fn flag(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(settings(&[]).unwrap(), Settings::default());
    }

    #[test]
    fn reads_every_variable() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://localhost/stockconf"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("CATALOG_SLUG_POLICY", "always"),
            ("CATALOG_RESTORE_ON_UPDATE", "yes"),
            ("CATALOG_ALLOW_NEGATIVE_STOCK", "0"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(s.require_database_url().unwrap(), "postgres://localhost/stockconf");
        assert_eq!(s.max_connections, 4);
        assert_eq!(s.catalog.slug, SlugPolicy::Always);
        assert!(s.catalog.restore_on_update);
        assert!(!s.catalog.stock.allow_negative);
        assert_eq!(s.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = settings(&[("CATALOG_RESTORE_ON_UPDATE", "maybe")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "CATALOG_RESTORE_ON_UPDATE",
                value: "maybe".to_string()
            }
        );
        assert!(settings(&[("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
        assert!(settings(&[("CATALOG_SLUG_POLICY", "never")]).is_err());
    }

    #[test]
    fn missing_database_url_is_reported() {
        let s = settings(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(s.require_database_url(), Err(ConfigError::Missing("DATABASE_URL")));
    }
}
