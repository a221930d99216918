//! Lookups that span both identity record kinds.

use api_types::{Person, Principal, PrincipalId, PrincipalInfo, User};

use super::{people::PersonRepository, users::UserRepository};
use crate::{DBService, StoreError};

/// A user or person record found by a cross-kind lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(User),
    Person(Person),
}

impl Identity {
    pub fn id(&self) -> PrincipalId {
        match self {
            Identity::User(user) => user.principal_id(),
            Identity::Person(person) => person.principal_id(),
        }
    }

    pub fn principal(&self) -> Principal {
        match self {
            Identity::User(user) => Principal::new(user.principal_id(), user.role),
            Identity::Person(person) => Principal::new(person.principal_id(), person.access_role()),
        }
    }

    pub fn info(&self) -> PrincipalInfo {
        match self {
            Identity::User(user) => user.info(),
            Identity::Person(person) => person.info(),
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Identity::User(user) => &user.email,
            Identity::Person(person) => &person.email,
        }
    }
}

pub struct IdentityRepository;

impl IdentityRepository {
    /// System users win over people when both hold the same address.
    pub async fn resolve_email(db: &DBService, email: &str) -> Result<Option<Identity>, StoreError> {
        if let Some(user) = UserRepository::find_by_email(db, email).await? {
            return Ok(Some(Identity::User(user)));
        }
        Ok(PersonRepository::find_by_email(db, email)
            .await?
            .map(Identity::Person))
    }

    pub async fn find(db: &DBService, id: PrincipalId) -> Result<Option<Identity>, StoreError> {
        Ok(match id {
            PrincipalId::User(id) => UserRepository::find_by_id(db, id).await?.map(Identity::User),
            PrincipalId::Person(id) => PersonRepository::find_by_id(db, id)
                .await?
                .map(Identity::Person),
        })
    }
}
