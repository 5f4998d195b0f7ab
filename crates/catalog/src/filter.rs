//! Product listing queries.
//!
//! The active listing and the trash listing are distinct queries: filters
//! only apply to the active one.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockconf_core::DomainError;

use crate::category::CategoryId;
use crate::product::Product;

/// Stock bucket used by the product filter.
///
/// Negative stock belongs to neither bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    pub fn of(stock: i64) -> Option<Self> {
        match stock {
            s if s > 0 => Some(Self::InStock),
            0 => Some(Self::OutOfStock),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }
}

impl FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in_stock" => Ok(Self::InStock),
            "out_of_stock" => Ok(Self::OutOfStock),
            other => Err(DomainError::validation(
                "stock_status",
                format!("expected in_stock or out_of_stock, got {other:?}"),
            )),
        }
    }
}

/// Conjunctive filter over active products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn by_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_stock_status(mut self, status: StockStatus) -> Self {
        self.stock_status = Some(status);
        self
    }

    pub fn searching(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Trimmed search term; blank means no search.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.category.is_some() && product.category != self.category {
            return false;
        }
        if let Some(status) = self.stock_status {
            if product.stock_status() != Some(status) {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            let needle = term.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_code = product
                .code
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle));
            if !in_name && !in_code {
                return false;
            }
        }
        true
    }
}

/// Which side of the soft-delete flag a listing reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Listing {
    Active,
    Trash,
}

impl Listing {
    pub fn available(self) -> bool {
        matches!(self, Self::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub listing: Listing,
    pub filter: ProductFilter,
}

impl ProductQuery {
    pub fn active(filter: ProductFilter) -> Self {
        Self {
            listing: Listing::Active,
            filter,
        }
    }

    pub fn trash() -> Self {
        Self {
            listing: Listing::Trash,
            filter: ProductFilter::default(),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        product.available == self.listing.available() && self.filter.matches(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Price, ProductId};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn product(id: i64, code: Option<&str>, name: &str, stock: i64, category: Option<i64>) -> Product {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Product {
            id: ProductId::new(id),
            code: code.map(str::to_string),
            name: name.to_string(),
            description: String::new(),
            category: category.map(CategoryId::new),
            price: Price::for_field("price", Decimal::ONE).unwrap(),
            stock,
            available: true,
            created: now,
            updated: now,
        }
    }

    #[test]
    fn stock_status_buckets() {
        assert_eq!(StockStatus::of(3), Some(StockStatus::InStock));
        assert_eq!(StockStatus::of(0), Some(StockStatus::OutOfStock));
        assert_eq!(StockStatus::of(-1), None);
    }

    #[test]
    fn negative_stock_matches_neither_status_filter() {
        let p = product(1, None, "Hielo", -4, None);
        assert!(!ProductFilter::default().with_stock_status(StockStatus::InStock).matches(&p));
        assert!(!ProductFilter::default().with_stock_status(StockStatus::OutOfStock).matches(&p));
        assert!(ProductFilter::default().matches(&p));
    }

    #[test]
    fn search_is_case_insensitive_over_name_or_code() {
        let p = product(1, Some("P001"), "Agua Mineral", 5, None);
        assert!(ProductFilter::default().searching("p00").matches(&p));
        assert!(ProductFilter::default().searching("MINERAL").matches(&p));
        assert!(!ProductFilter::default().searching("gaseosa").matches(&p));
        assert!(ProductFilter::default().searching("   ").matches(&p));
    }

    #[test]
    fn filters_combine_conjunctively() {
        let p = product(1, Some("P001"), "Agua", 5, Some(2));
        let filter = ProductFilter::default()
            .by_category(CategoryId::new(2))
            .with_stock_status(StockStatus::InStock)
            .searching("agua");
        assert!(filter.matches(&p));
        assert!(!filter.clone().by_category(CategoryId::new(3)).matches(&p));
        assert!(!filter.with_stock_status(StockStatus::OutOfStock).matches(&p));
    }

    #[test]
    fn active_and_trash_listings_are_disjoint() {
        let mut p = product(1, None, "Pan", 1, None);
        assert!(ProductQuery::active(ProductFilter::default()).matches(&p));
        assert!(!ProductQuery::trash().matches(&p));
        p.available = false;
        assert!(!ProductQuery::active(ProductFilter::default()).matches(&p));
        assert!(ProductQuery::trash().matches(&p));
    }

    #[test]
    fn stock_status_parses_query_values() {
        assert_eq!("out_of_stock".parse::<StockStatus>().unwrap(), StockStatus::OutOfStock);
        assert!("low".parse::<StockStatus>().is_err());
    }
}
