use thiserror::Error;

use crate::StoreError;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity record not found")]
    NotFound,
    #[error("an account with email `{0}` already exists")]
    EmailTaken(String),
    #[error("id space exhausted: {0}")]
    IdSpaceExhausted(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
