use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{PersonProfile, PrincipalInfo};

/// Invitations stay acceptable for 24 hours (86 400 000 ms) after creation.
pub const INVITATION_TTL_MILLIS: i64 = 86_400_000;

pub fn invitation_ttl() -> Duration {
    Duration::milliseconds(INVITATION_TTL_MILLIS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Used,
    Expired,
}

/// Invitation as stored in `invitations.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    #[ts(skip)]
    pub token: String,
    pub email: String,
    /// Comma separated project names or ids.
    pub projects: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl Invitation {
    pub fn new(token: String, email: String, projects: String, created_at: DateTime<Utc>) -> Self {
        Self {
            token,
            email,
            projects,
            created_at,
            expires_at: created_at + invitation_ttl(),
            used: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Status at `now`. Expiry is computed on read, never stored.
    pub fn status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.used {
            InvitationStatus::Used
        } else if self.is_expired(now) {
            InvitationStatus::Expired
        } else {
            InvitationStatus::Pending
        }
    }

    /// The project names or ids this invitation grants, trimmed, empties dropped.
    pub fn project_refs(&self) -> Vec<String> {
        self.projects
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateInvitationRequest {
    /// Comma separated email addresses.
    pub emails: String,
    /// Comma separated project names or ids.
    pub projects: String,
    #[ts(optional)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationResponse {
    pub emails_sent: usize,
    /// One acceptance link per address that had no account yet.
    pub invitation_links: Vec<String>,
    /// Addresses that already had an account and were granted the projects directly.
    pub granted_existing: Vec<String>,
    /// Addresses whose mail could not be delivered.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InvitationPreview {
    pub email: String,
    pub projects: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub existing_account: bool,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitationRequest {
    pub token: String,
    #[ts(optional)]
    pub first_name: Option<String>,
    #[ts(optional)]
    pub last_name: Option<String>,
    #[ts(optional)]
    pub password: Option<String>,
    #[ts(optional)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AcceptInvitationResponse {
    /// A new person was registered from the invitation.
    #[serde(rename_all = "camelCase")]
    Created {
        person: PersonProfile,
        effective_id: u32,
        assigned_projects: Vec<String>,
    },
    /// The email already had an account; projects were attached to it.
    #[serde(rename_all = "camelCase")]
    Merged {
        principal: PrincipalInfo,
        assigned_projects: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation(projects: &str) -> Invitation {
        Invitation::new("tok".into(), "new@x.com".into(), projects.into(), Utc::now())
    }

    #[test]
    fn test_expiry_is_24_hours_after_creation() {
        let inv = invitation("good");
        assert_eq!((inv.expires_at - inv.created_at).num_milliseconds(), 86_400_000);
    }

    #[test]
    fn test_status_is_computed_on_read() {
        let inv = invitation("good");
        assert_eq!(inv.status(inv.created_at), InvitationStatus::Pending);
        assert_eq!(inv.status(inv.expires_at), InvitationStatus::Pending);
        assert_eq!(
            inv.status(inv.expires_at + Duration::milliseconds(1)),
            InvitationStatus::Expired
        );
    }

    #[test]
    fn test_project_refs_trims_and_drops_empty() {
        let inv = invitation(" good, AMFUL ,, ");
        assert_eq!(inv.project_refs(), vec!["good".to_string(), "AMFUL".to_string()]);
    }
}
