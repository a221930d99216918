use db::{
    StoreError,
    models::{
        identity_errors::IdentityError, invitations::InvitationError, projects::ProjectError,
    },
};
use thiserror::Error;

use super::passwords::PasswordError;

/// Failure kinds surfaced by the service layer. Idempotent no-ops are not
/// errors; they come back as `false` from the add/remove operations.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invitation has expired")]
    InvitationExpired,
    #[error("invitation has already been used")]
    InvitationAlreadyUsed,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<IdentityError> for AccessError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::NotFound => AccessError::NotFound("person"),
            IdentityError::EmailTaken(email) => {
                AccessError::Conflict(format!("an account with email `{email}` already exists"))
            }
            IdentityError::IdSpaceExhausted(message) => AccessError::Validation(message),
            IdentityError::Store(error) => AccessError::Store(error),
        }
    }
}

impl From<ProjectError> for AccessError {
    fn from(error: ProjectError) -> Self {
        match error {
            ProjectError::NotFound => AccessError::NotFound("project"),
            ProjectError::Store(error) => AccessError::Store(error),
        }
    }
}

impl From<InvitationError> for AccessError {
    fn from(error: InvitationError) -> Self {
        match error {
            InvitationError::NotFound => AccessError::NotFound("invitation"),
            InvitationError::Expired => AccessError::InvitationExpired,
            InvitationError::AlreadyUsed => AccessError::InvitationAlreadyUsed,
            InvitationError::Store(error) => AccessError::Store(error),
        }
    }
}
