//! Combos domain module: product bundles with derived price and stock.
//!
//! Pure domain logic (no IO, no HTTP, no storage). Derived values are always
//! computed from the current product state handed in by the caller.

pub mod combo;
pub mod items;
pub mod pricing;
pub mod view;

pub use combo::{
    COMBO_NAME_MAX, Combo, ComboFields, ComboId, ComboInput, ComboItem, ComboLine, ComboLineInput,
    NewCombo, Quantity,
};
pub use items::{ItemChange, plan_item_changes};
pub use pricing::{StockLine, calculated_price, max_available_stock};
pub use view::{ComboLineView, ComboView};
