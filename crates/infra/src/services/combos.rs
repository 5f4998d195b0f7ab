//! Combo Aggregator operations over the store.
//!
//! Derived price and stock are never stored: every returned [`ComboView`] is
//! assembled from the products as they are when the view is built.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use stockconf_catalog::{Product, ProductId};
use stockconf_combos::{
    Combo, ComboId, ComboInput, ComboItem, ComboLine, ComboLineView, ComboView, ItemChange,
    NewCombo, plan_item_changes,
};
use stockconf_core::DomainError;

use super::error::ServiceResult;
use crate::store::{Store, Transaction};

#[derive(Clone)]
pub struct ComboService {
    store: Arc<dyn Store>,
}

impl ComboService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn create_combo(&self, input: ComboInput) -> ServiceResult<ComboView> {
        let fields = input.clean()?;

        let mut tx = self.store.begin().await?;
        let combo = tx
            .insert_combo(NewCombo::from_fields(&fields, Utc::now()))
            .await?;
        let changed = replace_items(&mut *tx, combo.id, &fields.items).await?;
        let view = build_view(&mut *tx, combo).await?;
        tx.commit().await?;

        info!(combo = %view.combo.id, items = changed, "combo created");
        Ok(view)
    }

    /// Overwrite the header and replace the item set by diff: submitted lines
    /// are upserted, stored lines missing from the submission are removed.
    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn update_combo(&self, id: ComboId, input: ComboInput) -> ServiceResult<ComboView> {
        let fields = input.clean()?;

        let mut tx = self.store.begin().await?;
        let mut combo = load_combo(&mut *tx, id).await?;
        combo.apply_fields(&fields);
        tx.save_combo(&combo).await?;
        let changed = replace_items(&mut *tx, id, &fields.items).await?;
        let view = build_view(&mut *tx, combo).await?;
        tx.commit().await?;

        info!(combo = %id, item_changes = changed, "combo updated");
        Ok(view)
    }

    #[instrument(skip(self), err)]
    pub async fn get_combo_view(&self, id: ComboId) -> ServiceResult<ComboView> {
        let mut tx = self.store.begin().await?;
        let combo = load_combo(&mut *tx, id).await?;
        build_view(&mut *tx, combo).await
    }

    /// Every combo with fresh derived fields, ordered by name.
    #[instrument(skip(self), err)]
    pub async fn list_combos(&self) -> ServiceResult<Vec<ComboView>> {
        let mut tx = self.store.begin().await?;
        let combos = tx.list_combos().await?;
        let mut views = Vec::with_capacity(combos.len());
        for combo in combos {
            views.push(build_view(&mut *tx, combo).await?);
        }
        Ok(views)
    }

    /// Delete a combo and its lines. Products are untouched.
    #[instrument(skip(self), err)]
    pub async fn delete_combo(&self, id: ComboId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_combo(id).await? {
            return Err(DomainError::not_found(ComboId::ENTITY, id).into());
        }
        tx.commit().await?;

        info!(combo = %id, "combo deleted");
        Ok(())
    }
}

async fn load_combo(tx: &mut dyn Transaction, id: ComboId) -> ServiceResult<Combo> {
    tx.get_combo(id)
        .await?
        .ok_or_else(|| DomainError::not_found(ComboId::ENTITY, id).into())
}

/// Bring the stored lines of `combo` in line with `lines`. Every product must
/// exist. Returns the number of row changes.
async fn replace_items(
    tx: &mut dyn Transaction,
    combo: ComboId,
    lines: &[ComboLine],
) -> ServiceResult<usize> {
    let ids: Vec<ProductId> = lines.iter().map(|l| l.product).collect();
    let found = tx.products_by_ids(&ids).await?;
    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|p| p.id == **id)) {
        return Err(DomainError::not_found(ProductId::ENTITY, *missing).into());
    }

    let current = tx.combo_items(combo).await?;
    let changes = plan_item_changes(&current, lines);
    for change in &changes {
        match *change {
            ItemChange::Upsert { product, quantity } => {
                tx.upsert_combo_item(&ComboItem {
                    combo,
                    product,
                    quantity,
                })
                .await?
            }
            ItemChange::Remove { product } => {
                tx.remove_combo_item(combo, product).await?;
            }
        }
    }
    Ok(changes.len())
}

async fn build_view(tx: &mut dyn Transaction, combo: Combo) -> ServiceResult<ComboView> {
    let items = tx.combo_items(combo.id).await?;
    let ids: Vec<ProductId> = items.iter().map(|i| i.product).collect();
    let products: BTreeMap<ProductId, Product> = tx
        .products_by_ids(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let lines = items
        .iter()
        .filter_map(|item| {
            products
                .get(&item.product)
                .map(|product| ComboLineView::new(item, product))
        })
        .collect();
    Ok(ComboView::assemble(combo, lines))
}
