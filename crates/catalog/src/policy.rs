//! Deployment-level knobs for catalog behavior.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockconf_core::DomainError;

/// When a category slug is (re)derived from its name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugPolicy {
    /// Slug is set once at creation; renames keep the old slug.
    #[default]
    OnCreate,
    /// Every rename recomputes the slug.
    Always,
}

impl FromStr for SlugPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_create" | "oncreate" => Ok(Self::OnCreate),
            "always" => Ok(Self::Always),
            other => Err(DomainError::validation(
                "slug_policy",
                format!("unknown slug policy {other:?}"),
            )),
        }
    }
}

/// Stock rules applied when products are saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPolicy {
    pub allow_negative: bool,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            allow_negative: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPolicy {
    pub slug: SlugPolicy,
    /// Saving edits to a trashed product also takes it out of the trash.
    pub restore_on_update: bool,
    pub stock: StockPolicy,
}
