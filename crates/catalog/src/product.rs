//! Products, prices and the trash lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockconf_core::{DomainError, DomainResult, Entity, ValidationErrors, ValueObject};

use crate::category::CategoryId;
use crate::filter::StockStatus;
use crate::policy::StockPolicy;

stockconf_core::record_id!(
    /// Product identifier.
    ProductId,
    "product"
);

pub const PRODUCT_CODE_MAX: usize = 50;
pub const PRODUCT_NAME_MAX: usize = 200;

/// Exclusive upper bound of a `NUMERIC(10,2)` amount.
const PRICE_LIMIT: i64 = 100_000_000;

/// Non-negative money amount with two fraction digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl ValueObject for Price {}

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Validate `value`, reporting problems against `field`.
    pub fn for_field(field: &str, value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation(field, "cannot be negative"));
        }
        if value.normalize().scale() > 2 {
            return Err(DomainError::validation(
                field,
                "must have at most 2 decimal places",
            ));
        }
        if value >= Decimal::from(PRICE_LIMIT) {
            return Err(DomainError::validation(
                field,
                "must be less than 100000000",
            ));
        }
        let mut value = value;
        value.rescale(2);
        Ok(Self(value))
    }

    /// Parse a decimal string such as `"10.50"`.
    pub fn parse_field(field: &str, raw: &str) -> DomainResult<Self> {
        let value: Decimal = raw
            .trim()
            .parse()
            .map_err(|_| DomainError::validation(field, format!("{raw:?} is not a number")))?;
        Self::for_field(field, value)
    }

    pub fn amount(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Line total for `quantity` units.
    pub fn times(self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::for_field("price", value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog product. `available == false` means the product sits in the trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: Option<String>,
    pub name: String,
    pub description: String,
    pub category: Option<CategoryId>,
    pub price: Price,
    pub stock: i64,
    pub available: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;
    const ENTITY: &'static str = ProductId::ENTITY;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl Product {
    pub fn from_new(id: ProductId, new: NewProduct) -> Self {
        let NewProduct { fields, now } = new;
        Self {
            id,
            code: fields.code,
            name: fields.name,
            description: fields.description,
            category: fields.category,
            price: fields.price,
            stock: fields.stock,
            available: fields.available,
            created: now,
            updated: now,
        }
    }

    pub fn in_trash(&self) -> bool {
        !self.available
    }

    pub fn stock_status(&self) -> Option<StockStatus> {
        StockStatus::of(self.stock)
    }

    /// Flag the product as trashed. Returns `false` when it already was.
    pub fn move_to_trash(&mut self, now: DateTime<Utc>) -> bool {
        if !self.available {
            return false;
        }
        self.available = false;
        self.updated = now;
        true
    }

    /// Take the product out of the trash. Returns `false` when it was not trashed.
    pub fn restore(&mut self, now: DateTime<Utc>) -> bool {
        if self.available {
            return false;
        }
        self.available = true;
        self.updated = now;
        true
    }

    /// Overwrite the editable fields.
    ///
    /// A trashed product stays trashed unless `restore_from_trash` is set;
    /// the submitted `available` flag only applies to products outside the trash.
    pub fn apply_fields(&mut self, fields: ProductFields, restore_from_trash: bool, now: DateTime<Utc>) {
        let was_trashed = self.in_trash();
        self.code = fields.code;
        self.name = fields.name;
        self.description = fields.description;
        self.category = fields.category;
        self.price = fields.price;
        self.stock = fields.stock;
        self.available = match (was_trashed, restore_from_trash) {
            (true, true) => true,
            (true, false) => false,
            (false, _) => fields.available,
        };
        self.updated = now;
    }
}

/// Raw product form data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<CategoryId>,
    pub price: Decimal,
    pub stock: i64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl ProductInput {
    pub fn new(name: impl Into<String>, price: Decimal, stock: i64) -> Self {
        Self {
            code: None,
            name: name.into(),
            description: String::new(),
            category: None,
            price,
            stock,
            available: true,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Field-level checks. Uniqueness and category existence need the store.
    pub fn clean(self, stock_policy: &StockPolicy) -> DomainResult<ProductFields> {
        let mut errors = ValidationErrors::new();

        let code = self
            .code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let Some(code) = &code {
            if code.chars().count() > PRODUCT_CODE_MAX {
                errors.add(
                    "code",
                    format!("must be at most {PRODUCT_CODE_MAX} characters"),
                );
            }
        }

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.add("name", "cannot be empty");
        } else if name.chars().count() > PRODUCT_NAME_MAX {
            errors.add(
                "name",
                format!("must be at most {PRODUCT_NAME_MAX} characters"),
            );
        }

        let price = match Price::for_field("price", self.price) {
            Ok(price) => price,
            Err(DomainError::Validation(e)) => {
                errors.extend(e);
                Price::ZERO
            }
            Err(other) => return Err(other),
        };

        if self.stock < 0 && !stock_policy.allow_negative {
            errors.add("stock", "cannot be negative");
        }

        errors.into_result()?;
        Ok(ProductFields {
            code,
            name,
            description: self.description,
            category: self.category,
            price,
            stock: self.stock,
            available: self.available,
        })
    }
}

/// Validated product fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub code: Option<String>,
    pub name: String,
    pub description: String,
    pub category: Option<CategoryId>,
    pub price: Price,
    pub stock: i64,
    pub available: bool,
}

/// Product about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub fields: ProductFields,
    pub now: DateTime<Utc>,
}
