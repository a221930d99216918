use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::UserRole;

/// Offset added to person ids when they key membership edges, so that person
/// ids never collide with system user ids in `project-users.json`.
pub const PERSON_ID_OFFSET: u32 = 1000;

/// Identity of an authenticated actor, tagged with the record kind it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PrincipalId {
    User(u32),
    Person(u32),
}

impl PrincipalId {
    /// Id used to key membership edges.
    pub fn effective_id(self) -> u32 {
        match self {
            PrincipalId::User(id) => id,
            PrincipalId::Person(id) => id + PERSON_ID_OFFSET,
        }
    }

    pub fn from_effective_id(effective_id: u32) -> Self {
        if effective_id >= PERSON_ID_OFFSET {
            PrincipalId::Person(effective_id - PERSON_ID_OFFSET)
        } else {
            PrincipalId::User(effective_id)
        }
    }

    pub fn raw_id(self) -> u32 {
        match self {
            PrincipalId::User(id) | PrincipalId::Person(id) => id,
        }
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalId::User(id) => write!(f, "user:{id}"),
            PrincipalId::Person(id) => write!(f, "person:{id}"),
        }
    }
}

/// A resolved principal: who is asking and with which role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub role: UserRole,
}

impl Principal {
    pub fn new(id: PrincipalId, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn effective_id(&self) -> u32 {
        self.id.effective_id()
    }
}

/// Principal summary returned by the API; never carries password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalInfo {
    pub id: PrincipalId,
    pub effective_id: u32,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_effective_id_is_offset() {
        assert_eq!(PrincipalId::Person(4).effective_id(), 1004);
        assert_eq!(PrincipalId::User(7).effective_id(), 7);
    }

    #[test]
    fn test_from_effective_id_splits_on_offset() {
        assert_eq!(PrincipalId::from_effective_id(3), PrincipalId::User(3));
        assert_eq!(PrincipalId::from_effective_id(1000), PrincipalId::Person(0));
        assert_eq!(PrincipalId::from_effective_id(1012), PrincipalId::Person(12));
    }

    #[test]
    fn test_principal_id_serializes_tagged() {
        let json = serde_json::to_value(PrincipalId::Person(2)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "person", "id": 2 }));
    }
}
