//! Read model of a combo with its lines and derived fields.

use rust_decimal::Decimal;
use serde::Serialize;

use stockconf_catalog::{Price, Product, ProductId};

use crate::combo::{Combo, ComboItem, Quantity};
use crate::pricing::{StockLine, calculated_price, max_available_stock};

/// One combo line joined with its product's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboLineView {
    pub product: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub stock: i64,
    pub quantity: Quantity,
    pub subtotal: Decimal,
}

impl ComboLineView {
    pub fn new(item: &ComboItem, product: &Product) -> Self {
        Self {
            product: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            stock: product.stock,
            quantity: item.quantity,
            subtotal: product.price.times(item.quantity.get()),
        }
    }
}

/// Read model of a combo with its derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboView {
    #[serde(flatten)]
    pub combo: Combo,
    pub items: Vec<ComboLineView>,
    pub calculated_price: Decimal,
    pub max_available_stock: i64,
}

impl ComboView {
    /// Lines are listed by product name.
    pub fn assemble(combo: Combo, mut items: Vec<ComboLineView>) -> Self {
        items.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        let calculated_price = calculated_price(
            combo.special_price,
            items.iter().map(|l| (l.unit_price, l.quantity)),
        );
        let max_available_stock = max_available_stock(items.iter().map(|l| StockLine {
            stock: Some(l.stock),
            quantity: l.quantity,
        }));
        Self {
            combo,
            items,
            calculated_price,
            max_available_stock,
        }
    }
}
