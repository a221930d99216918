use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{PrincipalId, PrincipalInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    #[serde(alias = "Active")]
    Active,
    #[serde(alias = "Inactive")]
    Inactive,
}

/// System user as stored in `users.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct User {
    pub id: u32,
    pub email: String,
    #[ts(skip)]
    pub password: String,
    #[serde(rename = "username")]
    pub display_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub status: UserStatus,
}

impl User {
    pub fn principal_id(&self) -> PrincipalId {
        PrincipalId::User(self.id)
    }

    pub fn info(&self) -> PrincipalInfo {
        PrincipalInfo {
            id: self.principal_id(),
            effective_id: self.principal_id().effective_id(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

/// Fields for a user that does not exist yet; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Partial update merged into an existing user; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_reads_legacy_json() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 3,
            "email": "user@desa.ca",
            "password": "user123",
            "username": "Regular User",
            "role": "user",
            "status": "active"
        }))
        .unwrap();

        assert_eq!(user.display_name, "Regular User");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.status, UserStatus::Active);
    }
}
