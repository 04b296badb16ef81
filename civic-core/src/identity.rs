//! Identity types for civic entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Opaque identifier issued by the identity provider for a staff or citizen account.
pub type PrincipalId = String;

/// Namespace for name-derived (UUIDv5) identifiers such as seeded categories.
pub const CIVIC_NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_2b8e_4d3a_5f90_a1b2_c3d4_e5f6_0718);

/// Common behaviour of the strongly-typed entity identifiers.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Display {
    /// Human-readable entity label used in error messages.
    const ENTITY_NAME: &'static str;

    /// Wrap a raw UUID.
    fn new(uuid: Uuid) -> Self;

    /// Access the raw UUID.
    fn as_uuid(&self) -> Uuid;

    /// Generate a fresh timestamp-sortable identifier.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $label;

            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a complaint category.
    CategoryId,
    "Category"
);
define_entity_id!(
    /// Identifier of a complaint record.
    ComplaintId,
    "Complaint"
);
define_entity_id!(
    /// Identifier of a status history ledger entry.
    HistoryEntryId,
    "StatusHistoryEntry"
);
define_entity_id!(
    /// Identifier of a feedback record.
    FeedbackId,
    "Feedback"
);

impl CategoryId {
    /// Stable identifier derived from a category name.
    ///
    /// Seeding the default catalogue twice yields the same ids.
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&CIVIC_NAMESPACE, name.trim().to_lowercase().as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_id_from_name_is_stable() {
        let a = CategoryId::from_name("Water Supply");
        let b = CategoryId::from_name("  water supply ");
        assert_eq!(a, b);
        assert_ne!(a, CategoryId::from_name("Electricity"));
    }

    #[test]
    fn test_ids_roundtrip_through_strings() -> Result<(), uuid::Error> {
        let id = ComplaintId::now_v7();
        let parsed: ComplaintId = id.to_string().parse()?;
        assert_eq!(id, parsed);
        Ok(())
    }

    #[test]
    fn test_ids_serialize_as_bare_uuid() -> Result<(), serde_json::Error> {
        let uuid = Uuid::now_v7();
        let json = serde_json::to_string(&FeedbackId::new(uuid))?;
        assert_eq!(json, format!("\"{}\"", uuid));
        Ok(())
    }
}
