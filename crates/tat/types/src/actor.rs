//! Actors and their update rights
//!
//! Authentication happens elsewhere; the engine only sees who is acting and
//! in which role.

use crate::{ActorId, TatError, TatResult};
use serde::{Deserialize, Serialize};

/// Role of the acting user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The single privileged role: may roll back stages and lower percentages
    SuperAdmin,
    Manager,
    Staff,
    /// Read-only
    Viewer,
}

impl Role {
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    pub fn can_update(&self) -> bool {
        !matches!(self, Self::Viewer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
            Self::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user performing a mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: ActorId::new(id),
            role,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    pub fn require_update_rights(&self, action: &str) -> TatResult<()> {
        if self.role.can_update() {
            Ok(())
        } else {
            Err(TatError::Forbidden {
                actor: self.id.clone(),
                action: action.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_super_admin_is_privileged() {
        assert!(Role::SuperAdmin.is_privileged());
        assert!(!Role::Manager.is_privileged());
        assert!(!Role::Staff.is_privileged());
        assert!(!Role::Viewer.is_privileged());
    }

    #[test]
    fn test_viewer_is_forbidden() {
        let viewer = Actor::new("v1", Role::Viewer);
        let err = viewer.require_update_rights("change stage").unwrap_err();
        assert!(matches!(err, TatError::Forbidden { .. }));
        assert!(Actor::new("s1", Role::Staff)
            .require_update_rights("change stage")
            .is_ok());
    }

    #[test]
    fn test_role_wire_names() {
        let actor: Actor = serde_json::from_str(r#"{"id":"u1","role":"super_admin"}"#).unwrap();
        assert!(actor.is_privileged());
    }
}
