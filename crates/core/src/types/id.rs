//! Newtype IDs for type-safe entity references.
//!
//! Every store table allocates its own incrementing `i32` IDs. The
//! `define_id!` macro gives each table its own ID type so a `MenuItemId`
//! can never be passed where an `OrderId` is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>`, `Into<i32>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use tajine_house_core::define_id;
/// define_id!(TableId);
/// define_id!(ReservationId);
///
/// let table = TableId::new(4);
/// let reservation = ReservationId::new(4);
/// assert_eq!(table.as_i32(), reservation.as_i32());
///
/// // These are different types, so this won't compile:
/// // let _: TableId = reservation;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(CategoryId);
define_id!(MenuItemId);
define_id!(OrderId);
define_id!(OrderItemId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_bare_number() {
        let id = MenuItemId::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");

        let parsed: OrderId = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, OrderId::new(12));
    }

    #[test]
    fn test_from_str_trims_whitespace() {
        let id: CategoryId = " 3 ".parse().unwrap();
        assert_eq!(id.as_i32(), 3);
        assert!("three".parse::<CategoryId>().is_err());
    }

    #[test]
    fn test_ordering_follows_allocation_order() {
        let mut ids = vec![OrderId::new(3), OrderId::new(1), OrderId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![OrderId::new(1), OrderId::new(2), OrderId::new(3)]);
    }
}
