//! Identifiers assigned by the source map dataset.
//!
//! OpenStreetMap identifiers are signed 64-bit integers. The engine treats
//! them as opaque keys: it never derives new identifiers and never relies on
//! their numeric order for correctness.

use std::fmt;

/// Identifier of a point (an OSM node).
///
/// # Examples
/// ```
/// use waysplit_core::NodeId;
///
/// let id = NodeId::new(42);
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(i64);

/// Identifier of a polyline (an OSM way).
///
/// # Examples
/// ```
/// use waysplit_core::WayId;
///
/// let id = WayId::from(7);
/// assert_eq!(i64::from(id), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WayId(i64);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the raw identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

impl_id!(NodeId);
impl_id!(WayId);
