//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stored records are keyed by their id; ids are small `Copy` newtypes that
/// order the way the store assigned them.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + Into<i64>;

    /// Entity name used in error messages and logs.
    const ENTITY: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
