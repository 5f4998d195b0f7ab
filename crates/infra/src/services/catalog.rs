//! Catalog Hierarchy Manager operations over the store.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument};

use stockconf_catalog::{
    CatalogPolicy, Category, CategoryId, CategoryInput, CategoryListing, CategoryUpdate,
    ChildLookup, Hierarchy, NewProduct, Product, ProductFields, ProductFilter, ProductId,
    ProductInput, ProductQuery, Slug,
};
use stockconf_core::{DomainError, ValidationErrors};

use super::error::{ServiceError, ServiceResult};
use crate::store::{Store, Transaction};

/// What [`CatalogService::delete_category`] detached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryDeletion {
    pub detached_products: u64,
    pub promoted_children: u64,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    policy: CatalogPolicy,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, policy: CatalogPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &CatalogPolicy {
        &self.policy
    }

    /// Active products matching every set filter, ordered by name.
    #[instrument(skip(self), err)]
    pub async fn list_products(&self, filter: ProductFilter) -> ServiceResult<Vec<Product>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_products(&ProductQuery::active(filter)).await?)
    }

    /// Products in the trash, ordered by name.
    #[instrument(skip(self), err)]
    pub async fn list_trash(&self) -> ServiceResult<Vec<Product>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_products(&ProductQuery::trash()).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn get_product(&self, id: ProductId) -> ServiceResult<Product> {
        let mut tx = self.store.begin().await?;
        load_product(&mut *tx, id).await
    }

    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn create_product(&self, input: ProductInput) -> ServiceResult<Product> {
        let fields = input.clean(&self.policy.stock)?;

        let mut tx = self.store.begin().await?;
        check_product_fields(&mut *tx, &fields, None).await?;
        let product = tx
            .insert_product(NewProduct {
                fields,
                now: Utc::now(),
            })
            .await?;
        tx.commit().await?;

        info!(product = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Overwrite a product's fields. A trashed product stays in the trash
    /// unless the catalog policy restores on update.
    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn update_product(&self, id: ProductId, input: ProductInput) -> ServiceResult<Product> {
        let fields = input.clean(&self.policy.stock)?;

        let mut tx = self.store.begin().await?;
        let mut product = load_product(&mut *tx, id).await?;
        check_product_fields(&mut *tx, &fields, Some(id)).await?;

        let was_trashed = product.in_trash();
        product.apply_fields(fields, self.policy.restore_on_update, Utc::now());
        tx.save_product(&product).await?;
        tx.commit().await?;

        info!(
            product = %id,
            restored = was_trashed && !product.in_trash(),
            "product updated"
        );
        Ok(product)
    }

    /// Move a product to the trash. Already-trashed products are returned as is.
    #[instrument(skip(self), err)]
    pub async fn soft_delete_product(&self, id: ProductId) -> ServiceResult<Product> {
        let mut tx = self.store.begin().await?;
        let mut product = load_product(&mut *tx, id).await?;
        if !product.move_to_trash(Utc::now()) {
            debug!(product = %id, "product already in trash");
            return Ok(product);
        }
        tx.save_product(&product).await?;
        tx.commit().await?;

        info!(product = %id, "product moved to trash");
        Ok(product)
    }

    /// Take a product out of the trash. Active products are returned as is.
    #[instrument(skip(self), err)]
    pub async fn restore_product(&self, id: ProductId) -> ServiceResult<Product> {
        let mut tx = self.store.begin().await?;
        let mut product = load_product(&mut *tx, id).await?;
        if !product.restore(Utc::now()) {
            debug!(product = %id, "product already active");
            return Ok(product);
        }
        tx.save_product(&product).await?;
        tx.commit().await?;

        info!(product = %id, "product restored");
        Ok(product)
    }

    /// Delete a product for good, along with the combo lines that use it.
    #[instrument(skip(self), err)]
    pub async fn purge_product(&self, id: ProductId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        load_product(&mut *tx, id).await?;
        let combo_items = tx.remove_items_for_product(id).await?;
        if !tx.delete_product(id).await? {
            return Err(DomainError::not_found(ProductId::ENTITY, id).into());
        }
        tx.commit().await?;

        info!(product = %id, combo_items, "product purged");
        Ok(())
    }

    /// Top-level categories with their subtrees, or every category flat.
    #[instrument(skip(self), err)]
    pub async fn list_categories(&self, root_only: bool) -> ServiceResult<CategoryListing> {
        let mut tx = self.store.begin().await?;
        let categories = tx.list_categories().await?;
        Ok(CategoryListing::new(categories, root_only))
    }

    #[instrument(skip(self), err)]
    pub async fn get_category(&self, id: CategoryId) -> ServiceResult<Category> {
        let mut tx = self.store.begin().await?;
        load_category(&mut *tx, id).await
    }

    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn create_category(&self, input: CategoryInput) -> ServiceResult<Category> {
        let new = input.clean()?;

        let mut tx = self.store.begin().await?;
        if let Some(parent) = new.parent {
            load_category(&mut *tx, parent).await?;
        }
        check_category_names(&mut *tx, &new.name, &new.slug, None).await?;
        let category = tx.insert_category(new).await?;
        tx.commit().await?;

        info!(category = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    /// Rename and re-parent a category, and apply the bulk subcategory edits.
    ///
    /// Every parent change, including the added children, is cycle-checked
    /// before anything is written.
    #[instrument(skip(self, update), fields(name = %update.name), err)]
    pub async fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> ServiceResult<Category> {
        let name = update.clean_name()?;

        let mut tx = self.store.begin().await?;
        let mut category = load_category(&mut *tx, id).await?;

        let all = tx.list_categories().await?;
        let mut hierarchy = Hierarchy::new(&all);
        let moves = hierarchy.plan_update(
            id,
            update.parent,
            &update.add_children,
            &update.remove_children,
        )?;

        category.rename(name, self.policy.slug)?;
        category.parent = update.parent;
        check_category_names(&mut *tx, &category.name, &category.slug, Some(id)).await?;

        tx.save_category(&category).await?;
        for change in &moves {
            tx.set_category_parent(change.category, change.parent).await?;
        }
        tx.commit().await?;

        info!(
            category = %id,
            parent = ?category.parent,
            reparented = moves.len(),
            "category updated"
        );
        Ok(category)
    }

    /// Delete a category. Its products lose their category and its
    /// subcategories become top-level; nothing else is deleted.
    #[instrument(skip(self), err)]
    pub async fn delete_category(&self, id: CategoryId) -> ServiceResult<CategoryDeletion> {
        let mut tx = self.store.begin().await?;
        load_category(&mut *tx, id).await?;

        let detached_products = tx.detach_category_products(id).await?;
        let promoted_children = tx.detach_children(id).await?;
        if !tx.delete_category(id).await? {
            return Err(DomainError::not_found(CategoryId::ENTITY, id).into());
        }
        tx.commit().await?;

        info!(
            category = %id,
            detached_products,
            promoted_children,
            "category deleted"
        );
        Ok(CategoryDeletion {
            detached_products,
            promoted_children,
        })
    }

    /// Direct subcategories of `parent` as `{id, name}` pairs. Unknown
    /// parents have no children.
    #[instrument(skip(self), err)]
    pub async fn list_children(&self, parent: CategoryId) -> ServiceResult<ChildLookup> {
        let mut tx = self.store.begin().await?;
        let children = tx.list_child_categories(parent).await?;
        Ok(ChildLookup::from_children(children))
    }
}

async fn load_product(tx: &mut dyn Transaction, id: ProductId) -> ServiceResult<Product> {
    tx.get_product(id)
        .await?
        .ok_or_else(|| DomainError::not_found(ProductId::ENTITY, id).into())
}

async fn load_category(tx: &mut dyn Transaction, id: CategoryId) -> ServiceResult<Category> {
    tx.get_category(id)
        .await?
        .ok_or_else(|| DomainError::not_found(CategoryId::ENTITY, id).into())
}

/// Category must exist; code and name must not belong to another product.
async fn check_product_fields(
    tx: &mut dyn Transaction,
    fields: &ProductFields,
    except: Option<ProductId>,
) -> ServiceResult<()> {
    if let Some(category) = fields.category {
        load_category(tx, category).await?;
    }

    let mut errors = ValidationErrors::new();
    if let Some(code) = &fields.code {
        if let Some(other) = tx.find_product_by_code(code).await? {
            if Some(other.id) != except {
                errors.add("code", format!("{code:?} is already used by another product"));
            }
        }
    }
    if let Some(other) = tx.find_product_by_name(&fields.name).await? {
        if Some(other.id) != except {
            errors.add(
                "name",
                format!("{:?} is already used by another product", fields.name),
            );
        }
    }
    errors.into_result().map_err(ServiceError::from)
}

async fn check_category_names(
    tx: &mut dyn Transaction,
    name: &str,
    slug: &Slug,
    except: Option<CategoryId>,
) -> ServiceResult<()> {
    let mut errors = ValidationErrors::new();
    if let Some(other) = tx.find_category_by_name(name).await? {
        if Some(other.id) != except {
            errors.add("name", format!("{name:?} is already used by another category"));
        }
    }
    if errors.is_empty() {
        if let Some(other) = tx.find_category_by_slug(slug).await? {
            if Some(other.id) != except {
                errors.add(
                    "name",
                    format!("slug {slug} is already used by category {:?}", other.name),
                );
            }
        }
    }
    errors.into_result().map_err(ServiceError::from)
}
