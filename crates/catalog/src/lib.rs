//! Catalog domain module: categories, products and their listing rules.
//!
//! This crate contains business rules for the product catalog, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod category;
pub mod filter;
pub mod hierarchy;
pub mod policy;
pub mod product;

pub use category::{
    CATEGORY_NAME_MAX, Category, CategoryId, CategoryInput, CategoryUpdate, NewCategory, Slug,
    slugify,
};
pub use filter::{Listing, ProductFilter, ProductQuery, StockStatus};
pub use hierarchy::{
    CategoryListing, CategoryNode, ChildLookup, ChildSummary, Hierarchy, Reparent, build_forest,
};
pub use policy::{CatalogPolicy, SlugPolicy, StockPolicy};
pub use product::{
    NewProduct, PRODUCT_CODE_MAX, PRODUCT_NAME_MAX, Price, Product, ProductFields, ProductId,
    ProductInput,
};
