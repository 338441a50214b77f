//! Identifiers
//!
//! All identifiers are opaque strings. Milestone and sub-stage ids are
//! stable machine keys, distinct from the display titles they label.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a lead, project or service request
    EntityId
);

string_id!(
    /// Stable identifier of a milestone, also its TAT-table key
    MilestoneId
);

string_id!(
    /// Identifier of a sub-stage descriptor in a hierarchical catalog
    SubstageId
);

string_id!(
    /// Identifier of the user performing a mutation
    ActorId
);

impl EntityId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl SubstageId {
    /// The milestone generated for this sub-stage shares its id.
    pub fn as_milestone(&self) -> MilestoneId {
        MilestoneId(self.0.clone())
    }
}
