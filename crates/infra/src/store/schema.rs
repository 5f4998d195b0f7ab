//! PostgreSQL schema. Every statement is idempotent.

/// Statements run in order by [`super::PostgresStore::apply_schema`].
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        slug VARCHAR(100) NOT NULL,
        parent_id BIGINT NULL,
        CONSTRAINT categories_name_key UNIQUE (name),
        CONSTRAINT categories_slug_key UNIQUE (slug),
        CONSTRAINT categories_parent_id_fkey FOREIGN KEY (parent_id)
            REFERENCES categories (id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        code VARCHAR(50) NULL,
        name VARCHAR(200) NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category_id BIGINT NULL,
        price NUMERIC(10, 2) NOT NULL,
        stock BIGINT NOT NULL,
        available BOOLEAN NOT NULL DEFAULT TRUE,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT products_code_key UNIQUE (code),
        CONSTRAINT products_name_key UNIQUE (name),
        CONSTRAINT products_price_check CHECK (price >= 0),
        CONSTRAINT products_category_id_fkey FOREIGN KEY (category_id)
            REFERENCES categories (id) ON DELETE SET NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS products_available_name_idx ON products (available, name)",
    r#"
    CREATE TABLE IF NOT EXISTS combos (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        description TEXT NULL,
        special_price NUMERIC(10, 2) NULL,
        available BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS combo_items (
        combo_id BIGINT NOT NULL,
        product_id BIGINT NOT NULL,
        quantity INTEGER NOT NULL DEFAULT 1,
        CONSTRAINT combo_items_pkey PRIMARY KEY (combo_id, product_id),
        CONSTRAINT combo_items_quantity_check CHECK (quantity >= 1),
        CONSTRAINT combo_items_combo_id_fkey FOREIGN KEY (combo_id)
            REFERENCES combos (id) ON DELETE CASCADE,
        CONSTRAINT combo_items_product_id_fkey FOREIGN KEY (product_id)
            REFERENCES products (id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staff (
        id BIGSERIAL PRIMARY KEY,
        role VARCHAR(16) NOT NULL,
        nombre VARCHAR(50) NOT NULL,
        apellido VARCHAR(50) NOT NULL,
        dni VARCHAR(15) NOT NULL,
        email VARCHAR(254) NOT NULL,
        direccion VARCHAR(100) NOT NULL,
        telefono VARCHAR(20) NOT NULL,
        fecha_alta DATE NOT NULL DEFAULT CURRENT_DATE,
        fecha_baja DATE NULL,
        activo BOOLEAN NOT NULL DEFAULT TRUE,
        CONSTRAINT staff_role_check CHECK (role IN ('vendedor', 'chofer')),
        CONSTRAINT staff_role_dni_key UNIQUE (role, dni),
        CONSTRAINT staff_role_email_key UNIQUE (role, email)
    )
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::constraints;

    #[test]
    fn schema_declares_every_shared_constraint() {
        let ddl = SCHEMA.join("\n");
        for name in [
            constraints::CATEGORY_NAME,
            constraints::CATEGORY_SLUG,
            constraints::CATEGORY_PARENT,
            constraints::PRODUCT_CODE,
            constraints::PRODUCT_NAME,
            constraints::PRODUCT_CATEGORY,
            constraints::COMBO_ITEM_COMBO,
            constraints::COMBO_ITEM_PRODUCT,
            constraints::STAFF_DNI,
            constraints::STAFF_EMAIL,
        ] {
            assert!(ddl.contains(name), "{name}");
        }
    }

    #[test]
    fn every_statement_is_idempotent() {
        for statement in SCHEMA {
            assert!(statement.contains("IF NOT EXISTS"), "{statement}");
        }
    }
}
