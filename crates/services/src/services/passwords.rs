//! Password secrets stored as Argon2id PHC strings (`$argon2id$...`).
//!
//! Seed data still carries plaintext passwords; those are compared as-is so
//! existing accounts keep working until their password is next changed.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

const PHC_PREFIX: &str = "$argon2";
const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hashes on the blocking pool; Argon2 is deliberately slow.
pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_blocking(&password)).await?
}

pub async fn verify_password(stored: &str, candidate: &str) -> Result<bool, PasswordError> {
    if !is_hashed(stored) {
        return Ok(bool::from(stored.as_bytes().ct_eq(candidate.as_bytes())));
    }
    let stored = stored.to_string();
    let candidate = candidate.to_string();
    Ok(tokio::task::spawn_blocking(move || verify_blocking(&stored, &candidate)).await?)
}

pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with(PHC_PREFIX)
}

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn verify_blocking(stored: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(error) => {
            tracing::warn!(%error, "stored password hash is malformed");
            false
        }
    }
}
