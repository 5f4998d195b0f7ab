//! Derived combo values. Never stored; recomputed on every read.

use rust_decimal::Decimal;

use stockconf_catalog::Price;

use crate::combo::Quantity;

/// Price a combo sells for.
///
/// A non-zero special price wins. Otherwise the sum of `unit_price × quantity`
/// over all lines.
pub fn calculated_price(
    special_price: Option<Price>,
    lines: impl IntoIterator<Item = (Price, Quantity)>,
) -> Decimal {
    if let Some(special) = special_price.filter(|p| !p.is_zero()) {
        return special.amount();
    }
    let mut total: Decimal = lines
        .into_iter()
        .map(|(price, quantity)| price.times(quantity.get()))
        .sum();
    total.rescale(2);
    total
}

/// Stock of one product and how many units a combo needs of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    /// `None` when the product's stock is unknown.
    pub stock: Option<i64>,
    pub quantity: Quantity,
}

/// How many complete combos the current stock can build.
///
/// Zero when any product has exactly zero stock or when there are no lines
/// with a known stock. Otherwise the minimum of `floor(stock / quantity)`.
pub fn max_available_stock(lines: impl IntoIterator<Item = StockLine>) -> i64 {
    let mut ceiling: Option<i64> = None;
    for line in lines {
        let Some(stock) = line.stock else {
            continue;
        };
        if stock == 0 {
            return 0;
        }
        let buildable = stock.div_euclid(i64::from(line.quantity.get()));
        ceiling = Some(ceiling.map_or(buildable, |c| c.min(buildable)));
    }
    ceiling.unwrap_or(0)
}
