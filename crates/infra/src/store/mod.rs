//! Persistence: repository traits and their backends.
//!
//! Every service operation opens one [`Transaction`], does all its reads and
//! writes through it, and commits at the end. Dropping a transaction without
//! committing discards everything it wrote.
//!
//! ## Error Mapping
//!
//! | Backend condition | StoreError |
//! |-------------------|------------|
//! | unique constraint (`23505`) | `UniqueViolation { constraint }` |
//! | foreign key (`23503`) | `ForeignKeyViolation { constraint }` |
//! | update matched no row | `MissingRow { entity, id }` |
//! | anything else | `Backend` |
//!
//! Constraint names are the same for every backend (see [`constraints`]).

use async_trait::async_trait;
use thiserror::Error;

use stockconf_catalog::{
    Category, CategoryId, NewCategory, NewProduct, Product, ProductId, ProductQuery, Slug,
};
use stockconf_combos::{Combo, ComboId, ComboItem, NewCombo};
use stockconf_staff::{NewStaff, StaffId, StaffMember, StaffRole};

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Constraint names shared by the SQL schema and the in-memory store.
pub mod constraints {
    pub const CATEGORY_NAME: &str = "categories_name_key";
    pub const CATEGORY_SLUG: &str = "categories_slug_key";
    pub const CATEGORY_PARENT: &str = "categories_parent_id_fkey";
    pub const PRODUCT_CODE: &str = "products_code_key";
    pub const PRODUCT_NAME: &str = "products_name_key";
    pub const PRODUCT_CATEGORY: &str = "products_category_id_fkey";
    pub const COMBO_ITEM_COMBO: &str = "combo_items_combo_id_fkey";
    pub const COMBO_ITEM_PRODUCT: &str = "combo_items_product_id_fkey";
    pub const STAFF_DNI: &str = "staff_role_dni_key";
    pub const STAFF_EMAIL: &str = "staff_role_email_key";
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint {constraint} violated")]
    ForeignKeyViolation { constraint: String },

    /// A `save_*` matched no stored row.
    #[error("{entity} {id} does not exist")]
    MissingRow { entity: &'static str, id: i64 },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn unique(constraint: &str) -> Self {
        Self::UniqueViolation {
            constraint: constraint.to_string(),
        }
    }

    pub fn foreign_key(constraint: &str) -> Self {
        Self::ForeignKeyViolation {
            constraint: constraint.to_string(),
        }
    }

    pub fn missing(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::MissingRow {
            entity,
            id: id.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Entry point of a storage backend.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>>;
}

/// One unit of work. Dropping it without [`Transaction::commit`] rolls back.
#[async_trait]
pub trait Transaction:
    CategoryRepository + ProductRepository + ComboRepository + StaffRepository + Send
{
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait CategoryRepository: Send {
    async fn get_category(&mut self, id: CategoryId) -> StoreResult<Option<Category>>;

    /// All categories ordered by name.
    async fn list_categories(&mut self) -> StoreResult<Vec<Category>>;

    /// Direct children of `parent`, ordered by name.
    async fn list_child_categories(&mut self, parent: CategoryId) -> StoreResult<Vec<Category>>;

    async fn find_category_by_name(&mut self, name: &str) -> StoreResult<Option<Category>>;

    async fn find_category_by_slug(&mut self, slug: &Slug) -> StoreResult<Option<Category>>;

    async fn insert_category(&mut self, new: NewCategory) -> StoreResult<Category>;

    async fn save_category(&mut self, category: &Category) -> StoreResult<()>;

    async fn set_category_parent(
        &mut self,
        id: CategoryId,
        parent: Option<CategoryId>,
    ) -> StoreResult<()>;

    /// Promote every child of `parent` to top level. Returns how many moved.
    async fn detach_children(&mut self, parent: CategoryId) -> StoreResult<u64>;

    /// Returns `false` when nothing was deleted.
    async fn delete_category(&mut self, id: CategoryId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProductRepository: Send {
    async fn get_product(&mut self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Products matching `query`, ordered by name.
    async fn list_products(&mut self, query: &ProductQuery) -> StoreResult<Vec<Product>>;

    async fn products_by_ids(&mut self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;

    async fn find_product_by_code(&mut self, code: &str) -> StoreResult<Option<Product>>;

    async fn find_product_by_name(&mut self, name: &str) -> StoreResult<Option<Product>>;

    async fn insert_product(&mut self, new: NewProduct) -> StoreResult<Product>;

    async fn save_product(&mut self, product: &Product) -> StoreResult<()>;

    /// Clear the category of every product in `category`. Returns how many changed.
    async fn detach_category_products(&mut self, category: CategoryId) -> StoreResult<u64>;

    /// Returns `false` when nothing was deleted.
    async fn delete_product(&mut self, id: ProductId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ComboRepository: Send {
    async fn get_combo(&mut self, id: ComboId) -> StoreResult<Option<Combo>>;

    /// All combos ordered by name.
    async fn list_combos(&mut self) -> StoreResult<Vec<Combo>>;

    async fn insert_combo(&mut self, new: NewCombo) -> StoreResult<Combo>;

    async fn save_combo(&mut self, combo: &Combo) -> StoreResult<()>;

    /// Deletes the combo and its items. Returns `false` when nothing was deleted.
    async fn delete_combo(&mut self, id: ComboId) -> StoreResult<bool>;

    async fn combo_items(&mut self, combo: ComboId) -> StoreResult<Vec<ComboItem>>;

    /// Insert the item or overwrite the quantity of the existing `(combo, product)` row.
    async fn upsert_combo_item(&mut self, item: &ComboItem) -> StoreResult<()>;

    async fn remove_combo_item(&mut self, combo: ComboId, product: ProductId) -> StoreResult<bool>;

    /// Drop every combo line that uses `product`. Returns how many were removed.
    async fn remove_items_for_product(&mut self, product: ProductId) -> StoreResult<u64>;
}

#[async_trait]
pub trait StaffRepository: Send {
    async fn get_staff(&mut self, role: StaffRole, id: StaffId) -> StoreResult<Option<StaffMember>>;

    /// Every member of `role`, ordered by apellido then nombre.
    async fn list_staff(&mut self, role: StaffRole) -> StoreResult<Vec<StaffMember>>;

    async fn find_staff_by_dni(&mut self, role: StaffRole, dni: &str) -> StoreResult<Option<StaffMember>>;

    async fn find_staff_by_email(
        &mut self,
        role: StaffRole,
        email: &str,
    ) -> StoreResult<Option<StaffMember>>;

    async fn insert_staff(&mut self, new: NewStaff) -> StoreResult<StaffMember>;

    async fn save_staff(&mut self, member: &StaffMember) -> StoreResult<()>;

    /// Returns `false` when nothing was deleted.
    async fn delete_staff(&mut self, role: StaffRole, id: StaffId) -> StoreResult<bool>;
}
