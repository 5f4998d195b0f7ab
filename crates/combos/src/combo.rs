use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockconf_catalog::{Price, ProductId};
use stockconf_core::{DomainResult, Entity, ValidationErrors, ValueObject};

stockconf_core::record_id!(
    /// Combo identifier.
    ComboId,
    "combo"
);

pub const COMBO_NAME_MAX: usize = 255;

/// How many units of a product one combo consumes. Between 1 and [`Quantity::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl ValueObject for Quantity {}

impl Quantity {
    pub const ONE: Quantity = Quantity(1);
    /// Largest quantity the `INTEGER` column holds.
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: u32) -> Option<Self> {
        (1..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for Quantity {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
            .ok_or_else(|| format!("quantity must be between 1 and {}", Self::MAX))
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored combo header. Its items live in separate [`ComboItem`] rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub id: ComboId,
    pub name: String,
    pub description: Option<String>,
    pub special_price: Option<Price>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Combo {
    type Id = ComboId;
    const ENTITY: &'static str = ComboId::ENTITY;

    fn id(&self) -> ComboId {
        self.id
    }
}

impl Combo {
    pub fn from_new(id: ComboId, new: NewCombo) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            special_price: new.special_price,
            available: new.available,
            created_at: new.created_at,
        }
    }

    /// Overwrite the header fields; `created_at` never changes.
    pub fn apply_fields(&mut self, fields: &ComboFields) {
        self.name = fields.name.clone();
        self.description = fields.description.clone();
        self.special_price = fields.special_price;
        self.available = fields.available;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboItem {
    pub combo: ComboId,
    pub product: ProductId,
    pub quantity: Quantity,
}

/// One submitted line of the combo form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboLineInput {
    pub product_id: ProductId,
    /// Missing means 1.
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl ComboLineInput {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity: Some(quantity),
        }
    }
}

/// Raw combo form data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Decimal text as typed; blank means "use the computed sum".
    #[serde(default)]
    pub special_price: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub items: Vec<ComboLineInput>,
}

fn default_available() -> bool {
    true
}

impl ComboInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            special_price: None,
            available: true,
            items: Vec::new(),
        }
    }

    pub fn with_special_price(mut self, raw: impl Into<String>) -> Self {
        self.special_price = Some(raw.into());
        self
    }

    pub fn with_item(mut self, product_id: ProductId, quantity: i64) -> Self {
        self.items.push(ComboLineInput::new(product_id, quantity));
        self
    }

    /// Field-level checks. Product existence is checked against the store.
    pub fn clean(self) -> DomainResult<ComboFields> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.add("name", "cannot be empty");
        } else if name.chars().count() > COMBO_NAME_MAX {
            errors.add("name", format!("must be at most {COMBO_NAME_MAX} characters"));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let special_price = match self.special_price.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match Price::parse_field("special_price", raw) {
                Ok(price) => Some(price),
                Err(err) => {
                    if let Some(e) = err.field_errors() {
                        errors.extend(e.clone());
                    }
                    None
                }
            },
        };

        let mut seen = BTreeSet::new();
        let mut items = Vec::with_capacity(self.items.len());
        for (idx, line) in self.items.into_iter().enumerate() {
            let raw = line.quantity.unwrap_or(1);
            let quantity = u32::try_from(raw).ok().and_then(Quantity::new);
            let Some(quantity) = quantity else {
                errors.add(
                    format!("items[{idx}].quantity"),
                    format!("must be a positive integer up to {}, got {raw}", Quantity::MAX),
                );
                continue;
            };
            if !seen.insert(line.product_id) {
                errors.add(
                    "items",
                    format!("product {} appears more than once", line.product_id),
                );
                continue;
            }
            items.push(ComboLine {
                product: line.product_id,
                quantity,
            });
        }

        errors.into_result()?;
        Ok(ComboFields {
            name,
            description,
            special_price,
            available: self.available,
            items,
        })
    }
}

/// A validated `(product, quantity)` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboLine {
    pub product: ProductId,
    pub quantity: Quantity,
}

/// Validated combo form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboFields {
    pub name: String,
    pub description: Option<String>,
    pub special_price: Option<Price>,
    pub available: bool,
    pub items: Vec<ComboLine>,
}

/// Combo header about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCombo {
    pub name: String,
    pub description: Option<String>,
    pub special_price: Option<Price>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl NewCombo {
    pub fn from_fields(fields: &ComboFields, created_at: DateTime<Utc>) -> Self {
        Self {
            name: fields.name.clone(),
            description: fields.description.clone(),
            special_price: fields.special_price,
            available: fields.available,
            created_at,
        }
    }
}
