use api_types::{NewUser, PERSON_ID_OFFSET, UpdateUser, User};

use super::{identity_errors::IdentityError, sequences::SequenceRepository};
use crate::{DBService, StoreError};

pub struct UserRepository;

impl UserRepository {
    pub async fn list(db: &DBService) -> Result<Vec<User>, StoreError> {
        db.users.read().await
    }

    pub async fn find_by_id(db: &DBService, id: u32) -> Result<Option<User>, StoreError> {
        Ok(db.users.read().await?.into_iter().find(|u| u.id == id))
    }

    /// Case-insensitive exact match; `Ok(None)` when nobody has the address.
    pub async fn find_by_email(db: &DBService, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        Ok(db
            .users
            .read()
            .await?
            .into_iter()
            .find(|u| u.email.to_lowercase() == email))
    }

    pub async fn create(db: &DBService, new_user: NewUser) -> Result<User, IdentityError> {
        let mut users = db.users.write().await?;
        let email = new_user.email.to_lowercase();
        if users.iter().any(|u| u.email.to_lowercase() == email) {
            return Err(IdentityError::EmailTaken(new_user.email));
        }

        let highest = users.iter().map(|u| u.id).max();
        let id = SequenceRepository::next_id(db, db.users.name(), highest).await?;
        // Person effective ids start at the offset; user ids must stay below it.
        if id >= PERSON_ID_OFFSET {
            return Err(IdentityError::IdSpaceExhausted(format!(
                "user id {id} would collide with person ids starting at {PERSON_ID_OFFSET}"
            )));
        }

        let user = User {
            id,
            email: new_user.email,
            password: new_user.password,
            display_name: new_user.display_name,
            role: new_user.role,
            status: new_user.status,
        };
        users.push(user.clone());
        users.commit().await?;

        tracing::info!(user_id = user.id, "created user");
        Ok(user)
    }

    pub async fn update(db: &DBService, id: u32, update: UpdateUser) -> Result<User, IdentityError> {
        let mut users = db.users.write().await?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(IdentityError::NotFound)?;

        if let Some(display_name) = update.display_name {
            user.display_name = display_name;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(status) = update.status {
            user.status = status;
        }
        if let Some(password) = update.password {
            user.password = password;
        }
        let updated = user.clone();

        users.commit().await?;
        Ok(updated)
    }

    pub async fn delete(db: &DBService, id: u32) -> Result<bool, StoreError> {
        let mut users = db.users.write().await?;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Ok(false);
        }
        users.commit().await?;
        Ok(true)
    }
}
