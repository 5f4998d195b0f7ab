//! Service-level tests against the in-memory store.
//!
//! Verifies:
//! - Category deletion detaches instead of cascading
//! - Cycle prevention leaves the hierarchy untouched
//! - Trash / restore / purge lifecycle of products
//! - Combo derived price and stock, item replace-by-diff
//! - Staff validation and activation lifecycle
//! - Failed operations roll back every write

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use stockconf_catalog::{
        CatalogPolicy, CategoryId, CategoryInput, CategoryListing, CategoryUpdate, ProductFilter,
        ProductId, ProductInput, SlugPolicy, StockStatus,
    };
    use stockconf_combos::ComboInput;
    use stockconf_staff::{StaffInput, StaffRole};

    use crate::services::{Backoffice, CategoryDeletion, ServiceError};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn backoffice() -> Backoffice {
        Backoffice::in_memory(CatalogPolicy::default())
    }

    fn field(err: &ServiceError) -> Vec<String> {
        err.field_errors()
            .map(|e| e.iter().map(|f| f.field.clone()).collect())
            .unwrap_or_default()
    }

    async fn category(app: &Backoffice, name: &str, parent: Option<CategoryId>) -> CategoryId {
        let mut input = CategoryInput::new(name);
        input.parent = parent;
        app.catalog.create_category(input).await.unwrap().id
    }

    async fn product(app: &Backoffice, name: &str, price: &str, stock: i64) -> ProductId {
        app.catalog
            .create_product(ProductInput::new(name, dec(price), stock))
            .await
            .unwrap()
            .id
    }

    fn vendedor(nombre: &str, dni: &str, email: &str) -> StaffInput {
        StaffInput {
            nombre: nombre.to_string(),
            apellido: "Perez".to_string(),
            dni: dni.to_string(),
            email: email.to_string(),
            direccion: "Av. Siempre Viva 742".to_string(),
            telefono: "3794123456".to_string(),
            fecha_alta: Some(day(2024, 1, 10)),
        }
    }

    // Categories

    #[tokio::test]
    async fn deleting_a_category_detaches_products_and_promotes_children() {
        let app = backoffice();
        let bebidas = category(&app, "Bebidas", None).await;
        let gaseosas = category(&app, "Gaseosas", Some(bebidas)).await;
        let aguas = category(&app, "Aguas", Some(bebidas)).await;
        let colas = category(&app, "Colas", Some(gaseosas)).await;

        let agua = app
            .catalog
            .create_product(ProductInput::new("Agua 500ml", dec("1.20"), 5).with_category(bebidas))
            .await
            .unwrap();
        let soda = app
            .catalog
            .create_product(ProductInput::new("Soda 1L", dec("0.90"), 3).with_category(bebidas))
            .await
            .unwrap();

        let summary = app.catalog.delete_category(bebidas).await.unwrap();
        assert_eq!(
            summary,
            CategoryDeletion {
                detached_products: 2,
                promoted_children: 2
            }
        );

        for id in [agua.id, soda.id] {
            let p = app.catalog.get_product(id).await.unwrap();
            assert_eq!(p.category, None);
        }
        for id in [gaseosas, aguas] {
            assert!(app.catalog.get_category(id).await.unwrap().is_root());
        }
        // Grandchildren keep their parent.
        assert_eq!(
            app.catalog.get_category(colas).await.unwrap().parent,
            Some(gaseosas)
        );
        assert!(app.catalog.get_category(bebidas).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn deleting_an_unknown_category_is_not_found() {
        let app = backoffice();
        let err = app.catalog.delete_category(CategoryId::new(99)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn category_cannot_move_under_itself_or_a_descendant() {
        let app = backoffice();
        let a = category(&app, "A", None).await;
        let b = category(&app, "B", Some(a)).await;
        let c = category(&app, "C", Some(b)).await;
        let before = app.catalog.list_categories(false).await.unwrap();

        for parent in [a, b, c] {
            let err = app
                .catalog
                .update_category(a, CategoryUpdate::new("A").with_parent(parent))
                .await
                .unwrap_err();
            assert_eq!(field(&err), vec!["parent"], "parent {parent}");
        }

        assert_eq!(app.catalog.list_categories(false).await.unwrap(), before);
    }

    #[tokio::test]
    async fn bulk_child_edits_are_applied_in_one_update() {
        let app = backoffice();
        let snacks = category(&app, "Snacks", None).await;
        let dulces = category(&app, "Dulces", None).await;
        let papas = category(&app, "Papas", Some(snacks)).await;
        let galletas = category(&app, "Galletas", Some(dulces)).await;

        app.catalog
            .update_category(
                snacks,
                CategoryUpdate::new("Snacks")
                    .adding([galletas])
                    .removing([papas, dulces]),
            )
            .await
            .unwrap();

        assert_eq!(
            app.catalog.get_category(galletas).await.unwrap().parent,
            Some(snacks)
        );
        assert!(app.catalog.get_category(papas).await.unwrap().is_root());
        // Not a child of Snacks, so removing it changes nothing.
        assert!(app.catalog.get_category(dulces).await.unwrap().is_root());

        let lookup = app.catalog.list_children(snacks).await.unwrap();
        let names: Vec<_> = lookup.results.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Galletas"]);
    }

    #[tokio::test]
    async fn adding_an_ancestor_as_child_is_rejected_without_writes() {
        let app = backoffice();
        let a = category(&app, "A", None).await;
        let b = category(&app, "B", Some(a)).await;
        let before = app.catalog.list_categories(false).await.unwrap();

        let err = app
            .catalog
            .update_category(b, CategoryUpdate::new("B renamed").with_parent(a).adding([a]))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["add_children"]);
        assert_eq!(app.catalog.list_categories(false).await.unwrap(), before);
    }

    #[tokio::test]
    async fn category_names_and_slugs_are_unique() {
        let app = backoffice();
        category(&app, "Lácteos", None).await;

        let err = app
            .catalog
            .create_category(CategoryInput::new("Lácteos"))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["name"]);

        // Different name, same slug.
        let err = app
            .catalog
            .create_category(CategoryInput::new("lacteos"))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["name"]);
    }

    #[tokio::test]
    async fn slug_follows_the_configured_policy() {
        let fixed = backoffice();
        let id = category(&fixed, "Fiambres", None).await;
        let renamed = fixed
            .catalog
            .update_category(id, CategoryUpdate::new("Quesos"))
            .await
            .unwrap();
        assert_eq!(renamed.slug.as_str(), "fiambres");

        let always = Backoffice::in_memory(CatalogPolicy {
            slug: SlugPolicy::Always,
            ..CatalogPolicy::default()
        });
        let id = category(&always, "Fiambres", None).await;
        let renamed = always
            .catalog
            .update_category(id, CategoryUpdate::new("Quesos Duros"))
            .await
            .unwrap();
        assert_eq!(renamed.slug.as_str(), "quesos-duros");
    }

    #[tokio::test]
    async fn root_listing_nests_children() {
        let app = backoffice();
        let bebidas = category(&app, "Bebidas", None).await;
        category(&app, "Aguas", Some(bebidas)).await;
        category(&app, "Almacen", None).await;

        let CategoryListing::Tree(roots) = app.catalog.list_categories(true).await.unwrap() else {
            panic!("expected nested listing");
        };
        let names: Vec<_> = roots.iter().map(|n| n.category.name.as_str()).collect();
        assert_eq!(names, vec!["Almacen", "Bebidas"]);
        assert_eq!(roots[1].children[0].category.name, "Aguas");
    }

    #[tokio::test]
    async fn unknown_parent_has_no_children() {
        let app = backoffice();
        let lookup = app.catalog.list_children(CategoryId::new(42)).await.unwrap();
        assert!(lookup.results.is_empty());
    }

    // Products

    #[tokio::test]
    async fn search_by_code_finds_exactly_that_product() {
        let app = backoffice();
        let created = app
            .catalog
            .create_product(ProductInput::new("Yerba 1kg", dec("4.50"), 12).with_code("P001"))
            .await
            .unwrap();
        product(&app, "Azucar 1kg", "1.10", 30).await;

        let found = app
            .catalog
            .list_products(ProductFilter::default().searching("P001"))
            .await
            .unwrap();
        assert_eq!(found, vec![created]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_name_or_code() {
        let app = backoffice();
        product(&app, "Galletitas de Agua", "1.00", 1).await;
        app.catalog
            .create_product(ProductInput::new("Soda", dec("1.00"), 1).with_code("AGU-9"))
            .await
            .unwrap();
        product(&app, "Fideos", "1.00", 1).await;

        let found = app
            .catalog
            .list_products(ProductFilter::default().searching("agu"))
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Galletitas de Agua", "Soda"]);
    }

    #[tokio::test]
    async fn negative_stock_is_neither_in_nor_out_of_stock() {
        let app = backoffice();
        product(&app, "Con stock", "1.00", 4).await;
        product(&app, "Sin stock", "1.00", 0).await;
        product(&app, "Sobrevendido", "1.00", -2).await;

        let names = |products: Vec<stockconf_catalog::Product>| {
            products.into_iter().map(|p| p.name).collect::<Vec<_>>()
        };
        let in_stock = app
            .catalog
            .list_products(ProductFilter::default().with_stock_status(StockStatus::InStock))
            .await
            .unwrap();
        let out_of_stock = app
            .catalog
            .list_products(ProductFilter::default().with_stock_status(StockStatus::OutOfStock))
            .await
            .unwrap();
        assert_eq!(names(in_stock), vec!["Con stock"]);
        assert_eq!(names(out_of_stock), vec!["Sin stock"]);
        assert_eq!(app.catalog.list_products(ProductFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn negative_stock_can_be_refused_by_policy() {
        let app = Backoffice::in_memory(CatalogPolicy {
            stock: stockconf_catalog::StockPolicy {
                allow_negative: false,
            },
            ..CatalogPolicy::default()
        });
        let err = app
            .catalog
            .create_product(ProductInput::new("Sobrevendido", dec("1.00"), -1))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["stock"]);
    }

    #[tokio::test]
    async fn filters_combine_conjunctively() {
        let app = backoffice();
        let bebidas = category(&app, "Bebidas", None).await;
        for (name, stock) in [("Cola", 5), ("Cola Zero", 0)] {
            app.catalog
                .create_product(ProductInput::new(name, dec("2.00"), stock).with_category(bebidas))
                .await
                .unwrap();
        }
        product(&app, "Cola de pescado", "3.00", 5).await;

        let found = app
            .catalog
            .list_products(
                ProductFilter::default()
                    .by_category(bebidas)
                    .with_stock_status(StockStatus::InStock)
                    .searching("cola"),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Cola");
    }

    #[tokio::test]
    async fn product_code_and_name_are_unique() {
        let app = backoffice();
        app.catalog
            .create_product(ProductInput::new("Arroz", dec("1.00"), 1).with_code("A1"))
            .await
            .unwrap();

        let err = app
            .catalog
            .create_product(ProductInput::new("Arroz", dec("1.00"), 1).with_code("A1"))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["code", "name"]);

        // Blank codes are not codes, so two products may have none.
        for name in ["Lentejas", "Garbanzos"] {
            app.catalog
                .create_product(ProductInput::new(name, dec("1.00"), 1).with_code("  "))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn product_in_unknown_category_is_not_found() {
        let app = backoffice();
        let err = app
            .catalog
            .create_product(
                ProductInput::new("Huerfano", dec("1.00"), 1).with_category(CategoryId::new(7)),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::NotFound {
                entity: "category",
                id: 7
            }
        );
    }

    #[tokio::test]
    async fn soft_delete_and_restore_are_idempotent() {
        let app = backoffice();
        let id = product(&app, "Harina", "0.80", 10).await;

        let trashed = app.catalog.soft_delete_product(id).await.unwrap();
        assert!(trashed.in_trash());
        let again = app.catalog.soft_delete_product(id).await.unwrap();
        assert_eq!(again, trashed);

        assert!(app.catalog.list_products(ProductFilter::default()).await.unwrap().is_empty());
        assert_eq!(app.catalog.list_trash().await.unwrap(), vec![trashed.clone()]);

        let restored = app.catalog.restore_product(id).await.unwrap();
        assert!(!restored.in_trash());
        let again = app.catalog.restore_product(id).await.unwrap();
        assert_eq!(again, restored);
        assert_eq!(restored.name, trashed.name);
        assert_eq!(restored.stock, trashed.stock);
        assert_eq!(restored.price, trashed.price);
    }

    #[tokio::test]
    async fn toggles_on_unknown_products_are_not_found() {
        let app = backoffice();
        let missing = ProductId::new(5);
        assert!(app.catalog.soft_delete_product(missing).await.unwrap_err().is_not_found());
        assert!(app.catalog.restore_product(missing).await.unwrap_err().is_not_found());
        assert!(app.catalog.purge_product(missing).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn editing_a_trashed_product_restores_only_when_configured() {
        let keep = backoffice();
        let id = product(&keep, "Aceite", "3.00", 2).await;
        keep.catalog.soft_delete_product(id).await.unwrap();
        let edited = keep
            .catalog
            .update_product(id, ProductInput::new("Aceite 900ml", dec("3.20"), 2))
            .await
            .unwrap();
        assert!(edited.in_trash());
        assert_eq!(edited.name, "Aceite 900ml");

        let restore = Backoffice::in_memory(CatalogPolicy {
            restore_on_update: true,
            ..CatalogPolicy::default()
        });
        let id = product(&restore, "Aceite", "3.00", 2).await;
        restore.catalog.soft_delete_product(id).await.unwrap();
        let edited = restore
            .catalog
            .update_product(id, ProductInput::new("Aceite", dec("3.00"), 2))
            .await
            .unwrap();
        assert!(!edited.in_trash());
    }

    #[tokio::test]
    async fn update_keeps_own_code_and_name() {
        let app = backoffice();
        let created = app
            .catalog
            .create_product(ProductInput::new("Te", dec("1.00"), 1).with_code("T1"))
            .await
            .unwrap();
        let updated = app
            .catalog
            .update_product(
                created.id,
                ProductInput::new("Te", dec("1.50"), 4).with_code("T1"),
            )
            .await
            .unwrap();
        assert_eq!(updated.price.amount(), dec("1.50"));
        assert_eq!(updated.created, created.created);
    }

    #[tokio::test]
    async fn purge_deletes_product_and_its_combo_lines() {
        let app = backoffice();
        let a = product(&app, "Pan", "1.00", 10).await;
        let b = product(&app, "Manteca", "2.00", 10).await;
        let combo = app
            .combos
            .create_combo(ComboInput::new("Desayuno").with_item(a, 1).with_item(b, 1))
            .await
            .unwrap();

        app.catalog.soft_delete_product(b).await.unwrap();
        app.catalog.purge_product(b).await.unwrap();

        assert!(app.catalog.get_product(b).await.unwrap_err().is_not_found());
        assert!(app.catalog.list_trash().await.unwrap().is_empty());
        let view = app.combos.get_combo_view(combo.combo.id).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].product, a);
    }

    // Combos

    #[tokio::test]
    async fn combo_price_is_the_item_sum_unless_overridden() {
        let app = backoffice();
        let a = product(&app, "Producto A", "10.00", 10).await;
        let b = product(&app, "Producto B", "5.50", 10).await;

        let view = app
            .combos
            .create_combo(ComboInput::new("Promo").with_item(a, 2).with_item(b, 1))
            .await
            .unwrap();
        assert_eq!(view.calculated_price, dec("25.50"));
        assert_eq!(view.items[0].subtotal, dec("20.00"));

        let view = app
            .combos
            .update_combo(
                view.combo.id,
                ComboInput::new("Promo")
                    .with_special_price("20.00")
                    .with_item(a, 2)
                    .with_item(b, 1),
            )
            .await
            .unwrap();
        assert_eq!(view.calculated_price, dec("20.00"));

        // Blank special price means unset.
        let view = app
            .combos
            .update_combo(
                view.combo.id,
                ComboInput::new("Promo")
                    .with_special_price("  ")
                    .with_item(a, 2)
                    .with_item(b, 1),
            )
            .await
            .unwrap();
        assert_eq!(view.combo.special_price, None);
        assert_eq!(view.calculated_price, dec("25.50"));
    }

    #[tokio::test]
    async fn combo_stock_is_limited_by_its_scarcest_product() {
        let app = backoffice();
        let a = product(&app, "Diez", "1.00", 10).await;
        let b = product(&app, "Siete", "1.00", 7).await;
        let view = app
            .combos
            .create_combo(ComboInput::new("Pack").with_item(a, 3).with_item(b, 2))
            .await
            .unwrap();
        assert_eq!(view.max_available_stock, 3);

        let empty = product(&app, "Agotado", "1.00", 0).await;
        let plenty = product(&app, "Mucho", "1.00", 1000).await;
        let view = app
            .combos
            .create_combo(ComboInput::new("Pack agotado").with_item(empty, 1).with_item(plenty, 1))
            .await
            .unwrap();
        assert_eq!(view.max_available_stock, 0);

        let view = app.combos.create_combo(ComboInput::new("Vacio")).await.unwrap();
        assert_eq!(view.max_available_stock, 0);
        assert_eq!(view.calculated_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn combo_view_reflects_current_product_state() {
        let app = backoffice();
        let a = product(&app, "Queso", "3.00", 9).await;
        let combo = app
            .combos
            .create_combo(ComboInput::new("Picada").with_item(a, 2))
            .await
            .unwrap();

        app.catalog
            .update_product(a, ProductInput::new("Queso", dec("4.00"), 3))
            .await
            .unwrap();

        let view = app.combos.get_combo_view(combo.combo.id).await.unwrap();
        assert_eq!(view.calculated_price, dec("8.00"));
        assert_eq!(view.max_available_stock, 1);
    }

    #[tokio::test]
    async fn combo_update_replaces_items_by_diff() {
        let app = backoffice();
        let a = product(&app, "A", "1.00", 10).await;
        let b = product(&app, "B", "1.00", 10).await;
        let c = product(&app, "C", "1.00", 10).await;
        let combo = app
            .combos
            .create_combo(ComboInput::new("Mix").with_item(a, 1).with_item(b, 2))
            .await
            .unwrap();

        let view = app
            .combos
            .update_combo(
                combo.combo.id,
                ComboInput::new("Mix").with_item(b, 5).with_item(c, 1),
            )
            .await
            .unwrap();

        let lines: Vec<_> = view
            .items
            .iter()
            .map(|l| (l.product, l.quantity.get()))
            .collect();
        assert_eq!(lines, vec![(b, 5), (c, 1)]);
        assert_eq!(view.combo.created_at, combo.combo.created_at);
    }

    #[tokio::test]
    async fn invalid_quantities_and_duplicates_are_rejected() {
        let app = backoffice();
        let a = product(&app, "A", "1.00", 10).await;

        let err = app
            .combos
            .create_combo(ComboInput::new("Malo").with_item(a, 0))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["items[0].quantity"]);

        let err = app
            .combos
            .create_combo(ComboInput::new("Doble").with_item(a, 1).with_item(a, 2))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["items"]);
        assert!(app.combos.list_combos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quantity_is_bounded_by_the_integer_column() {
        let app = backoffice();
        let a = product(&app, "A", "1.00", 10).await;
        let largest = i64::from(i32::MAX);

        let err = app
            .combos
            .create_combo(ComboInput::new("Enorme").with_item(a, largest + 1))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["items[0].quantity"]);
        assert!(app.combos.list_combos().await.unwrap().is_empty());

        let view = app
            .combos
            .create_combo(ComboInput::new("Mayorista").with_item(a, largest))
            .await
            .unwrap();
        assert_eq!(i64::from(view.items[0].quantity.get()), largest);
        assert_eq!(view.max_available_stock, 0);
    }

    #[tokio::test]
    async fn failed_combo_create_leaves_no_header_behind() {
        let app = backoffice();
        let a = product(&app, "A", "1.00", 10).await;

        let err = app
            .combos
            .create_combo(ComboInput::new("Roto").with_item(a, 1).with_item(ProductId::new(404), 1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::NotFound {
                entity: "product",
                id: 404
            }
        );
        assert!(app.combos.list_combos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_combo_update_rolls_back_header_and_items() {
        let app = backoffice();
        let a = product(&app, "A", "1.00", 10).await;
        let b = product(&app, "B", "1.00", 10).await;
        let before = app
            .combos
            .create_combo(ComboInput::new("Original").with_item(a, 1).with_item(b, 1))
            .await
            .unwrap();

        // Header is saved before the missing product is detected.
        let err = app
            .combos
            .update_combo(
                before.combo.id,
                ComboInput::new("Cambiado")
                    .with_item(a, 3)
                    .with_item(ProductId::new(404), 1),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let after = app.combos.get_combo_view(before.combo.id).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn combo_view_serializes_header_lines_and_derived_fields() {
        let app = backoffice();
        let a = product(&app, "Mate", "7.25", 8).await;
        let view = app
            .combos
            .create_combo(ComboInput::new("Matero").with_item(a, 2))
            .await
            .unwrap();

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Matero");
        assert_eq!(json["special_price"], serde_json::Value::Null);
        assert_eq!(json["max_available_stock"], 4);
        assert_eq!(json["items"][0]["product_name"], "Mate");
        assert_eq!(json["items"][0]["quantity"], 2);
    }

    #[tokio::test]
    async fn deleting_a_combo_keeps_its_products() {
        let app = backoffice();
        let a = product(&app, "A", "1.00", 10).await;
        let combo = app
            .combos
            .create_combo(ComboInput::new("Uno").with_item(a, 1))
            .await
            .unwrap();

        app.combos.delete_combo(combo.combo.id).await.unwrap();
        assert!(app.combos.get_combo_view(combo.combo.id).await.unwrap_err().is_not_found());
        assert!(app.combos.delete_combo(combo.combo.id).await.unwrap_err().is_not_found());
        assert_eq!(app.catalog.get_product(a).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn combos_are_listed_by_name_with_fresh_totals() {
        let app = backoffice();
        let a = product(&app, "A", "2.00", 4).await;
        for name in ["Zeta", "Alfa"] {
            app.combos
                .create_combo(ComboInput::new(name).with_item(a, 2))
                .await
                .unwrap();
        }
        let views = app.combos.list_combos().await.unwrap();
        let names: Vec<_> = views.iter().map(|v| v.combo.name.as_str()).collect();
        assert_eq!(names, vec!["Alfa", "Zeta"]);
        assert!(views.iter().all(|v| v.calculated_price == dec("4.00")));
        assert!(views.iter().all(|v| v.max_available_stock == 2));
    }

    // Staff

    #[tokio::test]
    async fn staff_fields_are_validated_at_the_boundary() {
        let app = backoffice();

        let err = app
            .staff
            .create_staff(StaffRole::Vendedor, vendedor("Juan3", "12345678", "j@x.com"))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["nombre"]);

        let mut input = vendedor("Juan", "12345678", "j@x.com");
        input.telefono = "555-1234".to_string();
        let err = app
            .staff
            .create_staff(StaffRole::Vendedor, input)
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["telefono"]);

        let member = app
            .staff
            .create_staff(StaffRole::Vendedor, vendedor("Juan", "12345678", "j@x.com"))
            .await
            .unwrap();
        assert_eq!(member.dni, "12345678");
        assert!(member.activo);
        assert_eq!(member.fecha_baja, None);
    }

    #[tokio::test]
    async fn dni_and_email_are_unique_within_a_role() {
        let app = backoffice();
        app.staff
            .create_staff(StaffRole::Vendedor, vendedor("Ana", "111", "ana@x.com"))
            .await
            .unwrap();

        let err = app
            .staff
            .create_staff(StaffRole::Vendedor, vendedor("Eva", "111", "ana@x.com"))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["dni", "email"]);

        // The same person may also be a driver.
        let chofer = app
            .staff
            .create_staff(StaffRole::Chofer, vendedor("Ana", "111", "ana@x.com"))
            .await
            .unwrap();
        assert!(app
            .staff
            .get_staff(StaffRole::Vendedor, chofer.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn staff_can_be_deactivated_and_reactivated() {
        let app = backoffice();
        let member = app
            .staff
            .create_staff(StaffRole::Chofer, vendedor("Luis", "222", "luis@x.com"))
            .await
            .unwrap();

        let err = app
            .staff
            .deactivate_staff(StaffRole::Chofer, member.id, Some(day(2023, 12, 31)))
            .await
            .unwrap_err();
        assert_eq!(field(&err), vec!["fecha_baja"]);

        let inactive = app
            .staff
            .deactivate_staff(StaffRole::Chofer, member.id, Some(day(2024, 6, 30)))
            .await
            .unwrap();
        assert!(!inactive.activo);
        assert_eq!(inactive.fecha_baja, Some(day(2024, 6, 30)));

        let roster = app.staff.list_staff(StaffRole::Chofer).await.unwrap();
        assert!(roster.activos.is_empty());
        assert_eq!(roster.inactivos.len(), 1);

        let active = app
            .staff
            .reactivate_staff(StaffRole::Chofer, member.id, Some(day(2024, 9, 1)))
            .await
            .unwrap();
        assert!(active.activo);
        assert_eq!(active.fecha_baja, None);
        assert_eq!(active.fecha_alta, day(2024, 9, 1));
    }

    #[tokio::test]
    async fn staff_update_keeps_start_date_when_omitted() {
        let app = backoffice();
        let member = app
            .staff
            .create_staff(StaffRole::Vendedor, vendedor("Rosa", "333", "rosa@x.com"))
            .await
            .unwrap();

        let mut input = vendedor("Rosa", "333", "rosa.nueva@x.com");
        input.fecha_alta = None;
        let updated = app
            .staff
            .update_staff(StaffRole::Vendedor, member.id, input)
            .await
            .unwrap();
        assert_eq!(updated.email, "rosa.nueva@x.com");
        assert_eq!(updated.fecha_alta, member.fecha_alta);

        app.staff.delete_staff(StaffRole::Vendedor, member.id).await.unwrap();
        assert!(app
            .staff
            .delete_staff(StaffRole::Vendedor, member.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn created_code_is_found_by_search(code in "[A-Z]{1,3}[0-9]{1,4}") {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let app = backoffice();
                    let created = app
                        .catalog
                        .create_product(
                            ProductInput::new("Buscado", dec("1.00"), 1).with_code(code.clone()),
                        )
                        .await
                        .unwrap();
                    app.catalog
                        .create_product(ProductInput::new("Otro", dec("1.00"), 1).with_code("zz"))
                        .await
                        .unwrap();

                    let found = app
                        .catalog
                        .list_products(ProductFilter::default().searching(code.to_lowercase()))
                        .await
                        .unwrap();
                    assert_eq!(found, vec![created]);
                });
            }
        }
    }
}
