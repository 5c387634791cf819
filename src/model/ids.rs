//! Type-safe identifiers.
//!
//! Every aggregate and child record gets its own UUID newtype, so a `DeliveryId` can never be
//! passed where an `ExecutionId` is expected. `Display` prefixes the kind (`delivery_<uuid>`),
//! which is also the form written to logs and audit entries.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a planned distribution day.
    ScheduleId,
    "schedule"
);
entity_id!(
    /// Identifier of one operational run of a schedule.
    ExecutionId,
    "execution"
);
entity_id!(DeliveryId, "delivery");
entity_id!(IssueId, "issue");
entity_id!(AssignmentId, "assignment");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_prefixed() {
        let uuid = Uuid::nil();
        assert_eq!(
            DeliveryId::from(uuid).to_string(),
            "delivery_00000000-0000-0000-0000-000000000000"
        );
        assert!(ScheduleId::new().to_string().starts_with("schedule_"));
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(ExecutionId::new(), ExecutionId::new());
    }
}
