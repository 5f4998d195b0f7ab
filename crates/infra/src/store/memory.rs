//! In-memory store for tests and local runs.
//!
//! A transaction holds the store lock for its whole life, so transactions are
//! fully serialized. Writes go to a private copy of the tables that replaces
//! the shared state on commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockconf_catalog::{
    Category, CategoryId, NewCategory, NewProduct, Product, ProductId, ProductQuery, Slug,
};
use stockconf_combos::{Combo, ComboId, ComboItem, NewCombo};
use stockconf_core::Entity;
use stockconf_staff::{NewStaff, StaffId, StaffMember, StaffRole};

use super::{
    CategoryRepository, ComboRepository, ProductRepository, StaffRepository, Store, StoreError,
    StoreResult, Transaction, constraints,
};

/// Rows keyed by id, plus the id sequence.
#[derive(Debug, Clone)]
struct Table<E: Entity> {
    rows: BTreeMap<E::Id, E>,
    last_id: i64,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<E: Entity + Clone> Table<E> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.get(&id)
    }

    fn contains(&self, id: E::Id) -> bool {
        self.rows.contains_key(&id)
    }

    fn put(&mut self, row: E) {
        self.rows.insert(row.id(), row);
    }

    fn remove(&mut self, id: E::Id) -> Option<E> {
        self.rows.remove(&id)
    }

    fn values(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.rows.values_mut()
    }

    fn find(&self, pred: impl Fn(&E) -> bool) -> Option<E> {
        self.rows.values().find(|r| pred(r)).cloned()
    }

    /// Whether a row other than `except` satisfies `pred`.
    fn taken(&self, except: Option<E::Id>, pred: impl Fn(&E) -> bool) -> bool {
        self.rows
            .values()
            .any(|r| Some(r.id()) != except && pred(r))
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    categories: Table<Category>,
    products: Table<Product>,
    combos: Table<Combo>,
    combo_items: BTreeMap<(ComboId, ProductId), ComboItem>,
    staff: Table<StaffMember>,
}

impl Tables {
    fn check_category(&self, category: &Category, except: Option<CategoryId>) -> StoreResult<()> {
        if self.categories.taken(except, |c| c.name == category.name) {
            return Err(StoreError::unique(constraints::CATEGORY_NAME));
        }
        if self.categories.taken(except, |c| c.slug == category.slug) {
            return Err(StoreError::unique(constraints::CATEGORY_SLUG));
        }
        if let Some(parent) = category.parent {
            if !self.categories.contains(parent) {
                return Err(StoreError::foreign_key(constraints::CATEGORY_PARENT));
            }
        }
        Ok(())
    }

    fn check_product(&self, product: &Product, except: Option<ProductId>) -> StoreResult<()> {
        if let Some(code) = &product.code {
            if self
                .products
                .taken(except, |p| p.code.as_deref() == Some(code.as_str()))
            {
                return Err(StoreError::unique(constraints::PRODUCT_CODE));
            }
        }
        if self.products.taken(except, |p| p.name == product.name) {
            return Err(StoreError::unique(constraints::PRODUCT_NAME));
        }
        if let Some(category) = product.category {
            if !self.categories.contains(category) {
                return Err(StoreError::foreign_key(constraints::PRODUCT_CATEGORY));
            }
        }
        Ok(())
    }

    fn check_staff(&self, member: &StaffMember, except: Option<StaffId>) -> StoreResult<()> {
        if self
            .staff
            .taken(except, |s| s.role == member.role && s.dni == member.dni)
        {
            return Err(StoreError::unique(constraints::STAFF_DNI));
        }
        if self
            .staff
            .taken(except, |s| s.role == member.role && s.email == member.email)
        {
            return Err(StoreError::unique(constraints::STAFF_EMAIL));
        }
        Ok(())
    }
}

fn by_name<T>(rows: &mut [T], key: impl Fn(&T) -> (&str, i64)) {
    rows.sort_by(|a, b| key(a).cmp(&key(b)));
}

/// Shared in-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, work }))
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let InMemoryTransaction { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryTransaction {
    async fn get_category(&mut self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.work.categories.get(id).cloned())
    }

    async fn list_categories(&mut self) -> StoreResult<Vec<Category>> {
        let mut rows: Vec<Category> = self.work.categories.values().cloned().collect();
        by_name(&mut rows, |c| (c.name.as_str(), c.id.get()));
        Ok(rows)
    }

    async fn list_child_categories(&mut self, parent: CategoryId) -> StoreResult<Vec<Category>> {
        let mut rows: Vec<Category> = self
            .work
            .categories
            .values()
            .filter(|c| c.parent == Some(parent))
            .cloned()
            .collect();
        by_name(&mut rows, |c| (c.name.as_str(), c.id.get()));
        Ok(rows)
    }

    async fn find_category_by_name(&mut self, name: &str) -> StoreResult<Option<Category>> {
        Ok(self.work.categories.find(|c| c.name == name))
    }

    async fn find_category_by_slug(&mut self, slug: &Slug) -> StoreResult<Option<Category>> {
        Ok(self.work.categories.find(|c| &c.slug == slug))
    }

    async fn insert_category(&mut self, new: NewCategory) -> StoreResult<Category> {
        let probe = Category::from_new(CategoryId::new(0), new);
        self.work.check_category(&probe, None)?;
        let category = Category {
            id: CategoryId::new(self.work.categories.next_id()),
            ..probe
        };
        self.work.categories.put(category.clone());
        Ok(category)
    }

    async fn save_category(&mut self, category: &Category) -> StoreResult<()> {
        if !self.work.categories.contains(category.id) {
            return Err(StoreError::missing(CategoryId::ENTITY, category.id));
        }
        self.work.check_category(category, Some(category.id))?;
        self.work.categories.put(category.clone());
        Ok(())
    }

    async fn set_category_parent(
        &mut self,
        id: CategoryId,
        parent: Option<CategoryId>,
    ) -> StoreResult<()> {
        if let Some(parent) = parent {
            if !self.work.categories.contains(parent) {
                return Err(StoreError::foreign_key(constraints::CATEGORY_PARENT));
            }
        }
        if let Some(row) = self.work.categories.rows.get_mut(&id) {
            row.parent = parent;
        }
        Ok(())
    }

    async fn detach_children(&mut self, parent: CategoryId) -> StoreResult<u64> {
        let mut moved = 0;
        for child in self.work.categories.values_mut() {
            if child.parent == Some(parent) {
                child.parent = None;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn delete_category(&mut self, id: CategoryId) -> StoreResult<bool> {
        if self.work.categories.remove(id).is_none() {
            return Ok(false);
        }
        // ON DELETE SET NULL
        for child in self.work.categories.values_mut() {
            if child.parent == Some(id) {
                child.parent = None;
            }
        }
        for product in self.work.products.values_mut() {
            if product.category == Some(id) {
                product.category = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ProductRepository for InMemoryTransaction {
    async fn get_product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.work.products.get(id).cloned())
    }

    async fn list_products(&mut self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let mut rows: Vec<Product> = self
            .work
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        by_name(&mut rows, |p| (p.name.as_str(), p.id.get()));
        Ok(rows)
    }

    async fn products_by_ids(&mut self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.work.products.get(*id).cloned())
            .collect())
    }

    async fn find_product_by_code(&mut self, code: &str) -> StoreResult<Option<Product>> {
        Ok(self.work.products.find(|p| p.code.as_deref() == Some(code)))
    }

    async fn find_product_by_name(&mut self, name: &str) -> StoreResult<Option<Product>> {
        Ok(self.work.products.find(|p| p.name == name))
    }

    async fn insert_product(&mut self, new: NewProduct) -> StoreResult<Product> {
        let probe = Product::from_new(ProductId::new(0), new);
        self.work.check_product(&probe, None)?;
        let product = Product {
            id: ProductId::new(self.work.products.next_id()),
            ..probe
        };
        self.work.products.put(product.clone());
        Ok(product)
    }

    async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
        if !self.work.products.contains(product.id) {
            return Err(StoreError::missing(ProductId::ENTITY, product.id));
        }
        self.work.check_product(product, Some(product.id))?;
        self.work.products.put(product.clone());
        Ok(())
    }

    async fn detach_category_products(&mut self, category: CategoryId) -> StoreResult<u64> {
        let mut changed = 0;
        for product in self.work.products.values_mut() {
            if product.category == Some(category) {
                product.category = None;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_product(&mut self, id: ProductId) -> StoreResult<bool> {
        if self.work.products.remove(id).is_none() {
            return Ok(false);
        }
        // ON DELETE CASCADE
        self.work.combo_items.retain(|(_, product), _| *product != id);
        Ok(true)
    }
}

#[async_trait]
impl ComboRepository for InMemoryTransaction {
    async fn get_combo(&mut self, id: ComboId) -> StoreResult<Option<Combo>> {
        Ok(self.work.combos.get(id).cloned())
    }

    async fn list_combos(&mut self) -> StoreResult<Vec<Combo>> {
        let mut rows: Vec<Combo> = self.work.combos.values().cloned().collect();
        by_name(&mut rows, |c| (c.name.as_str(), c.id.get()));
        Ok(rows)
    }

    async fn insert_combo(&mut self, new: NewCombo) -> StoreResult<Combo> {
        let combo = Combo::from_new(ComboId::new(self.work.combos.next_id()), new);
        self.work.combos.put(combo.clone());
        Ok(combo)
    }

    async fn save_combo(&mut self, combo: &Combo) -> StoreResult<()> {
        if !self.work.combos.contains(combo.id) {
            return Err(StoreError::missing(ComboId::ENTITY, combo.id));
        }
        self.work.combos.put(combo.clone());
        Ok(())
    }

    async fn delete_combo(&mut self, id: ComboId) -> StoreResult<bool> {
        if self.work.combos.remove(id).is_none() {
            return Ok(false);
        }
        self.work.combo_items.retain(|(combo, _), _| *combo != id);
        Ok(true)
    }

    async fn combo_items(&mut self, combo: ComboId) -> StoreResult<Vec<ComboItem>> {
        Ok(self
            .work
            .combo_items
            .values()
            .filter(|i| i.combo == combo)
            .cloned()
            .collect())
    }

    async fn upsert_combo_item(&mut self, item: &ComboItem) -> StoreResult<()> {
        if !self.work.combos.contains(item.combo) {
            return Err(StoreError::foreign_key(constraints::COMBO_ITEM_COMBO));
        }
        if !self.work.products.contains(item.product) {
            return Err(StoreError::foreign_key(constraints::COMBO_ITEM_PRODUCT));
        }
        self.work
            .combo_items
            .insert((item.combo, item.product), item.clone());
        Ok(())
    }

    async fn remove_combo_item(&mut self, combo: ComboId, product: ProductId) -> StoreResult<bool> {
        Ok(self.work.combo_items.remove(&(combo, product)).is_some())
    }

    async fn remove_items_for_product(&mut self, product: ProductId) -> StoreResult<u64> {
        let before = self.work.combo_items.len();
        self.work.combo_items.retain(|(_, p), _| *p != product);
        Ok((before - self.work.combo_items.len()) as u64)
    }
}

#[async_trait]
impl StaffRepository for InMemoryTransaction {
    async fn get_staff(&mut self, role: StaffRole, id: StaffId) -> StoreResult<Option<StaffMember>> {
        Ok(self.work.staff.get(id).filter(|s| s.role == role).cloned())
    }

    async fn list_staff(&mut self, role: StaffRole) -> StoreResult<Vec<StaffMember>> {
        let mut rows: Vec<StaffMember> = self
            .work
            .staff
            .values()
            .filter(|s| s.role == role)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (&a.apellido, &a.nombre, a.id).cmp(&(&b.apellido, &b.nombre, b.id)));
        Ok(rows)
    }

    async fn find_staff_by_dni(&mut self, role: StaffRole, dni: &str) -> StoreResult<Option<StaffMember>> {
        Ok(self.work.staff.find(|s| s.role == role && s.dni == dni))
    }

    async fn find_staff_by_email(
        &mut self,
        role: StaffRole,
        email: &str,
    ) -> StoreResult<Option<StaffMember>> {
        Ok(self.work.staff.find(|s| s.role == role && s.email == email))
    }

    async fn insert_staff(&mut self, new: NewStaff) -> StoreResult<StaffMember> {
        let probe = StaffMember::from_new(StaffId::new(0), new);
        self.work.check_staff(&probe, None)?;
        let member = StaffMember {
            id: StaffId::new(self.work.staff.next_id()),
            ..probe
        };
        self.work.staff.put(member.clone());
        Ok(member)
    }

    async fn save_staff(&mut self, member: &StaffMember) -> StoreResult<()> {
        if !self.work.staff.get(member.id).is_some_and(|s| s.role == member.role) {
            return Err(StoreError::missing(StaffId::ENTITY, member.id));
        }
        self.work.check_staff(member, Some(member.id))?;
        self.work.staff.put(member.clone());
        Ok(())
    }

    async fn delete_staff(&mut self, role: StaffRole, id: StaffId) -> StoreResult<bool> {
        if self.work.staff.get(id).is_some_and(|s| s.role == role) {
            self.work.staff.remove(id);
            return Ok(true);
        }
        Ok(false)
    }
}
