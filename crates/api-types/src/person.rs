use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{PrincipalId, PrincipalInfo, UserRole, some_if_present};

pub const DEFAULT_PERSON_ROLE: &str = "Team Member";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub enum PersonStatus {
    #[default]
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "inactive")]
    Inactive,
}

fn default_person_role() -> String {
    DEFAULT_PERSON_ROLE.to_string()
}

/// Directory entry as stored in `people.json`. Invited people gain a
/// `password` once they accept their invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: u32,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Derived from the membership index; never authoritative.
    #[serde(rename = "projects", default)]
    pub projects_count: u32,
    #[serde(default = "default_person_role")]
    pub role: String,
    #[serde(default)]
    pub status: PersonStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Person {
    pub fn principal_id(&self) -> PrincipalId {
        PrincipalId::Person(self.id)
    }

    /// The directory role is a free-form label; only "admin" grants admin access.
    pub fn access_role(&self) -> UserRole {
        if self.role.trim().eq_ignore_ascii_case("admin") {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }

    /// People can only sign in after accepting an invitation.
    pub fn can_sign_in(&self) -> bool {
        self.password.is_some()
    }

    pub fn info(&self) -> PrincipalInfo {
        PrincipalInfo {
            id: self.principal_id(),
            effective_id: self.principal_id().effective_id(),
            email: self.email.clone(),
            display_name: self.name.clone(),
            role: self.access_role(),
        }
    }

    pub fn profile(&self) -> PersonProfile {
        PersonProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
            phone: self.phone.clone(),
            projects: self.projects_count,
            role: self.role.clone(),
            status: self.status,
            registered: self.can_sign_in(),
        }
    }
}

/// Fields for a person that does not exist yet; the store assigns the id.
#[derive(Debug, Clone, Default)]
pub struct NewPerson {
    pub name: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub status: Option<PersonStatus>,
    pub password: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial update merged into an existing person; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePersonRequest {
    #[serde(default, deserialize_with = "some_if_present")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub status: Option<PersonStatus>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreatePersonRequest {
    pub name: String,
    pub email: String,
    #[ts(optional)]
    pub company: Option<String>,
    #[ts(optional)]
    pub phone: Option<String>,
    #[ts(optional)]
    pub role: Option<String>,
    #[ts(optional)]
    pub status: Option<PersonStatus>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpdatePersonRoleRequest {
    pub role: String,
}

/// Person as returned by the API; password material is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct PersonProfile {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub projects: u32,
    pub role: String,
    pub status: PersonStatus,
    pub registered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ListPeopleResponse {
    pub people: Vec<PersonProfile>,
}
