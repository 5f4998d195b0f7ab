//! Staff domain module (salespeople and drivers).
//!
//! Both roles share one record shape, told apart by [`StaffRole`]. Pure domain
//! logic (no IO, no HTTP, no storage).

pub mod member;
pub mod validation;

pub use member::{NewStaff, StaffFields, StaffId, StaffInput, StaffMember, StaffRole, StaffRoster};
pub use validation::{digits_only, letters_only};
