//! Replace-by-diff of a combo's item set.

use std::collections::BTreeMap;

use stockconf_catalog::ProductId;

use crate::combo::{ComboItem, ComboLine, Quantity};

/// One row-level change needed to turn the stored items into the submitted ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    Upsert {
        product: ProductId,
        quantity: Quantity,
    },
    Remove {
        product: ProductId,
    },
}

/// Diff `current` against `desired`, matching lines by product.
///
/// Unchanged lines produce nothing. Upserts come first, then removals, each
/// ordered by product id.
pub fn plan_item_changes(current: &[ComboItem], desired: &[ComboLine]) -> Vec<ItemChange> {
    let stored: BTreeMap<ProductId, Quantity> =
        current.iter().map(|i| (i.product, i.quantity)).collect();
    let wanted: BTreeMap<ProductId, Quantity> =
        desired.iter().map(|l| (l.product, l.quantity)).collect();

    let upserts = wanted
        .iter()
        .filter(|(product, quantity)| stored.get(*product) != Some(*quantity))
        .map(|(&product, &quantity)| ItemChange::Upsert { product, quantity });

    let removals = stored
        .keys()
        .filter(|product| !wanted.contains_key(*product))
        .map(|&product| ItemChange::Remove { product });

    upserts.chain(removals).collect()
}
