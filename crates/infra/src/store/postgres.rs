//! Postgres-backed store.
//!
//! One [`PostgresTransaction`] wraps one SQL transaction; dropping it without
//! committing rolls the SQL transaction back. Uniqueness and referential
//! integrity are enforced by the schema in [`super::schema`].
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation { constraint }` |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation { constraint }` |
//! | Database (other) | Any other | `Backend` |
//! | `UPDATE` affecting zero rows | N/A | `MissingRow { entity, id }` |
//! | PoolClosed / RowNotFound / Other | N/A | `Backend` |

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;

use stockconf_catalog::{
    Category, CategoryId, NewCategory, NewProduct, Price, Product, ProductId, ProductQuery, Slug,
};
use stockconf_combos::{Combo, ComboId, ComboItem, NewCombo, Quantity};
use stockconf_staff::{NewStaff, StaffId, StaffMember, StaffRole};

use super::schema::SCHEMA;
use super::{
    CategoryRepository, ComboRepository, ProductRepository, StaffRepository, Store, StoreError,
    StoreResult, Transaction,
};

/// Postgres-backed store over a connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create any missing tables, constraints and indexes.
    #[instrument(skip(self), err)]
    pub async fn apply_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("apply_schema", e))?;
        }
        tracing::info!(statements = SCHEMA.len(), "schema applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

const CATEGORY_COLUMNS: &str = "id, name, slug, parent_id";
const PRODUCT_COLUMNS: &str =
    "id, code, name, description, category_id, price, stock, available, created, updated";
const COMBO_COLUMNS: &str = "id, name, description, special_price, available, created_at";
const STAFF_COLUMNS: &str = "id, role, nombre, apellido, dni, email, direccion, telefono, \
                             fecha_alta, fecha_baja, activo";

#[async_trait]
impl CategoryRepository for PostgresTransaction {
    async fn get_category(&mut self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_category", e))?;
        Ok(row.map(Category::from))
    }

    async fn list_categories(&mut self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name, id"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn list_child_categories(&mut self, parent: CategoryId) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE parent_id = $1 ORDER BY name, id"
        ))
        .bind(parent.get())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_child_categories", e))?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_category_by_name(&mut self, name: &str) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_category_by_name", e))?;
        Ok(row.map(Category::from))
    }

    async fn find_category_by_slug(&mut self, slug: &Slug) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_category_by_slug", e))?;
        Ok(row.map(Category::from))
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    async fn insert_category(&mut self, new: NewCategory) -> StoreResult<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories (name, slug, parent_id) VALUES ($1, $2, $3) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.slug.as_str())
        .bind(new.parent.map(CategoryId::get))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(row.into())
    }

    async fn save_category(&mut self, category: &Category) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE categories SET name = $2, slug = $3, parent_id = $4 WHERE id = $1",
        )
        .bind(category.id.get())
        .bind(&category.name)
        .bind(category.slug.as_str())
        .bind(category.parent.map(CategoryId::get))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_category", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::missing(CategoryId::ENTITY, category.id));
        }
        Ok(())
    }

    async fn set_category_parent(
        &mut self,
        id: CategoryId,
        parent: Option<CategoryId>,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE categories SET parent_id = $2 WHERE id = $1")
            .bind(id.get())
            .bind(parent.map(CategoryId::get))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_category_parent", e))?;
        Ok(())
    }

    async fn detach_children(&mut self, parent: CategoryId) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE categories SET parent_id = NULL WHERE parent_id = $1")
            .bind(parent.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("detach_children", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_category(&mut self, id: CategoryId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductRepository for PostgresTransaction {
    async fn get_product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;
        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_products(&mut self, query: &ProductQuery) -> StoreResult<Vec<Product>> {
        let filter = &query.filter;
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE available = $1
              AND ($2::BIGINT IS NULL OR category_id = $2)
              AND ($3::TEXT IS NULL
                   OR ($3 = 'in_stock' AND stock > 0)
                   OR ($3 = 'out_of_stock' AND stock = 0))
              AND ($4::TEXT IS NULL
                   OR strpos(lower(name), lower($4)) > 0
                   OR strpos(lower(COALESCE(code, '')), lower($4)) > 0)
            ORDER BY name, id
            "#
        ))
        .bind(query.listing.available())
        .bind(filter.category.map(CategoryId::get))
        .bind(filter.stock_status.map(|s| s.as_str()))
        .bind(filter.search_term())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn products_by_ids(&mut self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("products_by_ids", e))?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn find_product_by_code(&mut self, code: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_product_by_code", e))?;
        row.map(Product::try_from).transpose()
    }

    async fn find_product_by_name(&mut self, name: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_product_by_name", e))?;
        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self, new), fields(name = %new.fields.name), err)]
    async fn insert_product(&mut self, new: NewProduct) -> StoreResult<Product> {
        let f = &new.fields;
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products \
             (code, name, description, category_id, price, stock, available, created, updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(f.code.as_deref())
        .bind(&f.name)
        .bind(&f.description)
        .bind(f.category.map(CategoryId::get))
        .bind(f.price.amount())
        .bind(f.stock)
        .bind(f.available)
        .bind(new.now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Product::try_from(row)
    }

    async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET code = $2, name = $3, description = $4, category_id = $5,
                price = $6, stock = $7, available = $8, updated = $9
            WHERE id = $1
            "#,
        )
        .bind(product.id.get())
        .bind(product.code.as_deref())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category.map(CategoryId::get))
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(product.available)
        .bind(product.updated)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::missing(ProductId::ENTITY, product.id));
        }
        Ok(())
    }

    async fn detach_category_products(&mut self, category: CategoryId) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE products SET category_id = NULL WHERE category_id = $1")
            .bind(category.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("detach_category_products", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_product(&mut self, id: ProductId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ComboRepository for PostgresTransaction {
    async fn get_combo(&mut self, id: ComboId) -> StoreResult<Option<Combo>> {
        let row = sqlx::query_as::<_, ComboRow>(&format!(
            "SELECT {COMBO_COLUMNS} FROM combos WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_combo", e))?;
        row.map(Combo::try_from).transpose()
    }

    async fn list_combos(&mut self) -> StoreResult<Vec<Combo>> {
        let rows = sqlx::query_as::<_, ComboRow>(&format!(
            "SELECT {COMBO_COLUMNS} FROM combos ORDER BY name, id"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_combos", e))?;
        rows.into_iter().map(Combo::try_from).collect()
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    async fn insert_combo(&mut self, new: NewCombo) -> StoreResult<Combo> {
        let row = sqlx::query_as::<_, ComboRow>(&format!(
            "INSERT INTO combos (name, description, special_price, available, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMBO_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.description.as_deref())
        .bind(new.special_price.map(Price::amount))
        .bind(new.available)
        .bind(new.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_combo", e))?;
        Combo::try_from(row)
    }

    async fn save_combo(&mut self, combo: &Combo) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE combos SET name = $2, description = $3, special_price = $4, available = $5 \
             WHERE id = $1",
        )
        .bind(combo.id.get())
        .bind(&combo.name)
        .bind(combo.description.as_deref())
        .bind(combo.special_price.map(Price::amount))
        .bind(combo.available)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_combo", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::missing(ComboId::ENTITY, combo.id));
        }
        Ok(())
    }

    async fn delete_combo(&mut self, id: ComboId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM combos WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_combo", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn combo_items(&mut self, combo: ComboId) -> StoreResult<Vec<ComboItem>> {
        let rows = sqlx::query_as::<_, ComboItemRow>(
            "SELECT combo_id, product_id, quantity FROM combo_items \
             WHERE combo_id = $1 ORDER BY product_id",
        )
        .bind(combo.get())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("combo_items", e))?;
        rows.into_iter().map(ComboItem::try_from).collect()
    }

    async fn upsert_combo_item(&mut self, item: &ComboItem) -> StoreResult<()> {
        let quantity = i32::try_from(item.quantity.get())
            .map_err(|_| StoreError::Backend(format!("quantity {} out of range", item.quantity)))?;
        sqlx::query(
            r#"
            INSERT INTO combo_items (combo_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (combo_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(item.combo.get())
        .bind(item.product.get())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_combo_item", e))?;
        Ok(())
    }

    async fn remove_combo_item(&mut self, combo: ComboId, product: ProductId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM combo_items WHERE combo_id = $1 AND product_id = $2")
            .bind(combo.get())
            .bind(product.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("remove_combo_item", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_items_for_product(&mut self, product: ProductId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM combo_items WHERE product_id = $1")
            .bind(product.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("remove_items_for_product", e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StaffRepository for PostgresTransaction {
    async fn get_staff(&mut self, role: StaffRole, id: StaffId) -> StoreResult<Option<StaffMember>> {
        let row = sqlx::query_as::<_, StaffRow>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE id = $1 AND role = $2"
        ))
        .bind(id.get())
        .bind(role.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("get_staff", e))?;
        row.map(StaffMember::try_from).transpose()
    }

    async fn list_staff(&mut self, role: StaffRole) -> StoreResult<Vec<StaffMember>> {
        let rows = sqlx::query_as::<_, StaffRow>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE role = $1 ORDER BY apellido, nombre, id"
        ))
        .bind(role.as_str())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_staff", e))?;
        rows.into_iter().map(StaffMember::try_from).collect()
    }

    async fn find_staff_by_dni(&mut self, role: StaffRole, dni: &str) -> StoreResult<Option<StaffMember>> {
        let row = sqlx::query_as::<_, StaffRow>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE role = $1 AND dni = $2"
        ))
        .bind(role.as_str())
        .bind(dni)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_staff_by_dni", e))?;
        row.map(StaffMember::try_from).transpose()
    }

    async fn find_staff_by_email(
        &mut self,
        role: StaffRole,
        email: &str,
    ) -> StoreResult<Option<StaffMember>> {
        let row = sqlx::query_as::<_, StaffRow>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE role = $1 AND email = $2"
        ))
        .bind(role.as_str())
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_staff_by_email", e))?;
        row.map(StaffMember::try_from).transpose()
    }

    #[instrument(skip(self, new), fields(role = %new.role), err)]
    async fn insert_staff(&mut self, new: NewStaff) -> StoreResult<StaffMember> {
        let f = &new.fields;
        let row = sqlx::query_as::<_, StaffRow>(&format!(
            "INSERT INTO staff \
             (role, nombre, apellido, dni, email, direccion, telefono, fecha_alta, fecha_baja, activo) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, TRUE) \
             RETURNING {STAFF_COLUMNS}"
        ))
        .bind(new.role.as_str())
        .bind(&f.nombre)
        .bind(&f.apellido)
        .bind(&f.dni)
        .bind(&f.email)
        .bind(&f.direccion)
        .bind(&f.telefono)
        .bind(f.fecha_alta)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_staff", e))?;
        StaffMember::try_from(row)
    }

    async fn save_staff(&mut self, member: &StaffMember) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE staff
            SET nombre = $3, apellido = $4, dni = $5, email = $6, direccion = $7,
                telefono = $8, fecha_alta = $9, fecha_baja = $10, activo = $11
            WHERE id = $1 AND role = $2
            "#,
        )
        .bind(member.id.get())
        .bind(member.role.as_str())
        .bind(&member.nombre)
        .bind(&member.apellido)
        .bind(&member.dni)
        .bind(&member.email)
        .bind(&member.direccion)
        .bind(&member.telefono)
        .bind(member.fecha_alta)
        .bind(member.fecha_baja)
        .bind(member.activo)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_staff", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::missing(StaffId::ENTITY, member.id));
        }
        Ok(())
    }

    async fn delete_staff(&mut self, role: StaffRole, id: StaffId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM staff WHERE id = $1 AND role = $2")
            .bind(id.get())
            .bind(role.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_staff", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation { constraint },
                Some("23503") => StoreError::ForeignKeyViolation { constraint },
                _ => StoreError::Backend(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                )),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn corrupt(what: &str, detail: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("invalid stored {what}: {detail}"))
}

// SQLx row types

#[derive(Debug)]
struct CategoryRow {
    id: i64,
    name: String,
    slug: String,
    parent_id: Option<i64>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            parent_id: row.try_get("parent_id")?,
        })
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
            parent: row.parent_id.map(CategoryId::new),
        }
    }
}

#[derive(Debug)]
struct ProductRow {
    id: i64,
    code: Option<String>,
    name: String,
    description: String,
    category_id: Option<i64>,
    price: Decimal,
    stock: i64,
    available: bool,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category_id: row.try_get("category_id")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            available: row.try_get("available")?,
            created: row.try_get("created")?,
            updated: row.try_get("updated")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::try_from(row.price).map_err(|e| corrupt("product price", e))?;
        Ok(Product {
            id: ProductId::new(row.id),
            code: row.code,
            name: row.name,
            description: row.description,
            category: row.category_id.map(CategoryId::new),
            price,
            stock: row.stock,
            available: row.available,
            created: row.created,
            updated: row.updated,
        })
    }
}

#[derive(Debug)]
struct ComboRow {
    id: i64,
    name: String,
    description: Option<String>,
    special_price: Option<Decimal>,
    available: bool,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ComboRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ComboRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            special_price: row.try_get("special_price")?,
            available: row.try_get("available")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ComboRow> for Combo {
    type Error = StoreError;

    fn try_from(row: ComboRow) -> Result<Self, Self::Error> {
        let special_price = row
            .special_price
            .map(|p| Price::for_field("special_price", p))
            .transpose()
            .map_err(|e| corrupt("combo special_price", e))?;
        Ok(Combo {
            id: ComboId::new(row.id),
            name: row.name,
            description: row.description,
            special_price,
            available: row.available,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug)]
struct ComboItemRow {
    combo_id: i64,
    product_id: i64,
    quantity: i32,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ComboItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ComboItemRow {
            combo_id: row.try_get("combo_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

impl TryFrom<ComboItemRow> for ComboItem {
    type Error = StoreError;

    fn try_from(row: ComboItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity)
            .ok()
            .and_then(Quantity::new)
            .ok_or_else(|| corrupt("combo item quantity", row.quantity))?;
        Ok(ComboItem {
            combo: ComboId::new(row.combo_id),
            product: ProductId::new(row.product_id),
            quantity,
        })
    }
}

#[derive(Debug)]
struct StaffRow {
    id: i64,
    role: String,
    nombre: String,
    apellido: String,
    dni: String,
    email: String,
    direccion: String,
    telefono: String,
    fecha_alta: NaiveDate,
    fecha_baja: Option<NaiveDate>,
    activo: bool,
}

impl<'r> sqlx::FromRow<'r, PgRow> for StaffRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StaffRow {
            id: row.try_get("id")?,
            role: row.try_get("role")?,
            nombre: row.try_get("nombre")?,
            apellido: row.try_get("apellido")?,
            dni: row.try_get("dni")?,
            email: row.try_get("email")?,
            direccion: row.try_get("direccion")?,
            telefono: row.try_get("telefono")?,
            fecha_alta: row.try_get("fecha_alta")?,
            fecha_baja: row.try_get("fecha_baja")?,
            activo: row.try_get("activo")?,
        })
    }
}

impl TryFrom<StaffRow> for StaffMember {
    type Error = StoreError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let role: StaffRole = row.role.parse().map_err(|e| corrupt("staff role", e))?;
        Ok(StaffMember {
            id: StaffId::new(row.id),
            role,
            nombre: row.nombre,
            apellido: row.apellido,
            dni: row.dni,
            email: row.email,
            direccion: row.direccion,
            telefono: row.telefono,
            fecha_alta: row.fecha_alta,
            fecha_baja: row.fecha_baja,
            activo: row.activo,
        })
    }
}
