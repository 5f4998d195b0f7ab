//! Strongly-typed identifiers used across the domain.
//!
//! Every stored record is addressed by a positive integer id assigned by the
//! store. Each record kind gets its own newtype so ids cannot be mixed up.

/// Declare an integer record identifier newtype.
///
/// ```ignore
/// stockconf_core::record_id!(
///     /// Identifier of a category.
///     CategoryId, "category"
/// );
/// ```
#[macro_export]
macro_rules! record_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $t(pub i64);

        impl $t {
            /// Entity name used in error messages.
            pub const ENTITY: &'static str = $name;

            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|v| *v > 0)
                    .map(Self)
                    .ok_or_else(|| {
                        $crate::DomainError::validation("id", format!("invalid {} id: {s:?}", $name))
                    })
            }
        }
    };
}
