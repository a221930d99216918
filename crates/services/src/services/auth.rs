use api_types::{PersonStatus, PrincipalId, UserStatus};
use db::{
    DBService,
    models::identity::{Identity, IdentityRepository},
};
use tracing::instrument;

use super::{error::AccessError, passwords::verify_password};

pub struct AuthService;

impl AuthService {
    /// Checks credentials against system users first, then against people
    /// who have accepted an invitation.
    #[instrument(name = "auth.authenticate", skip(db, password))]
    pub async fn authenticate(
        db: &DBService,
        email: &str,
        password: &str,
    ) -> Result<Identity, AccessError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AccessError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let identity = IdentityRepository::resolve_email(db, email.trim())
            .await?
            .ok_or(AccessError::Unauthenticated)?;
        let stored = match &identity {
            Identity::User(user) => Some(user.password.as_str()),
            Identity::Person(person) => person.password.as_deref(),
        };
        let Some(stored) = stored else {
            return Err(AccessError::Unauthenticated);
        };
        if !verify_password(stored, password).await? {
            return Err(AccessError::Unauthenticated);
        }

        ensure_active(&identity)?;
        tracing::info!(principal = %identity.id(), "login succeeded");
        Ok(identity)
    }

    /// Reloads the principal behind a session so role and status changes take
    /// effect without a new login.
    pub async fn current(db: &DBService, id: PrincipalId) -> Result<Identity, AccessError> {
        let identity = IdentityRepository::find(db, id)
            .await?
            .ok_or(AccessError::Unauthenticated)?;
        ensure_active(&identity)?;
        Ok(identity)
    }
}

fn ensure_active(identity: &Identity) -> Result<(), AccessError> {
    let active = match identity {
        Identity::User(user) => user.status == UserStatus::Active,
        Identity::Person(person) => person.status == PersonStatus::Active,
    };
    if !active {
        return Err(AccessError::Forbidden("account is inactive"));
    }
    Ok(())
}
