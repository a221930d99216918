//! Session tokens: HS256 JWTs whose subject is the principal id.

use std::{collections::HashMap, time::Duration};

use api_types::PrincipalId;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("jwt secret is not valid base64")]
    InvalidSecret,
    #[error("session token is malformed")]
    Malformed,
    #[error("session token signature is invalid")]
    InvalidSignature,
    #[error("session token has expired")]
    Expired,
    #[error("session has been signed out")]
    Revoked,
    #[error("failed to sign session token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// `user:<id>` or `person:<id>`.
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn principal_id(&self) -> Result<PrincipalId, JwtError> {
        parse_subject(&self.sub).ok_or(JwtError::Malformed)
    }
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
    /// Signed-out token ids mapped to their expiry; entries past expiry are pruned.
    revoked: RwLock<HashMap<String, i64>>,
}

impl JwtService {
    pub fn new(secret: &SecretString, session_ttl: Duration) -> Result<Self, JwtError> {
        let key = BASE64_STANDARD
            .decode(secret.expose_secret().as_bytes())
            .map_err(|_| JwtError::InvalidSecret)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            validation,
            session_ttl,
            revoked: RwLock::new(HashMap::new()),
        })
    }

    pub fn issue(&self, principal: PrincipalId) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: principal.to_string(),
            jti: random_jti(),
            iat: now,
            exp: now + self.session_ttl.as_secs() as i64,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(JwtError::Encode)
    }

    pub async fn verify(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::Malformed,
            })?
            .claims;

        if self.revoked.read().await.contains_key(&claims.jti) {
            return Err(JwtError::Revoked);
        }
        Ok(claims)
    }

    pub async fn revoke(&self, claims: &SessionClaims) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp >= now);
        revoked.insert(claims.jti.clone(), claims.exp);
    }
}

fn random_jti() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn parse_subject(sub: &str) -> Option<PrincipalId> {
    let (kind, id) = sub.split_once(':')?;
    let id = id.parse().ok()?;
    match kind {
        "user" => Some(PrincipalId::User(id)),
        "person" => Some(PrincipalId::Person(id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        let secret = SecretString::new(BASE64_STANDARD.encode([42u8; 32]).into());
        JwtService::new(&secret, Duration::from_secs(3600)).unwrap()
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let jwt = service();
        let token = jwt.issue(PrincipalId::Person(4)).unwrap();
        let claims = jwt.verify(&token).await.unwrap();

        assert_eq!(claims.sub, "person:4");
        assert_eq!(claims.principal_id().unwrap(), PrincipalId::Person(4));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let jwt = service();
        let now = Utc::now().timestamp();
        let token = jwt
            .sign(&SessionClaims {
                sub: "user:1".into(),
                jti: "old".into(),
                iat: now - 7200,
                exp: now - 60,
            })
            .unwrap();

        assert!(matches!(jwt.verify(&token).await, Err(JwtError::Expired)));
    }

    #[tokio::test]
    async fn test_foreign_signature_is_rejected() {
        let other = JwtService::new(
            &SecretString::new(BASE64_STANDARD.encode([1u8; 32]).into()),
            Duration::from_secs(60),
        )
        .unwrap();
        let token = other.issue(PrincipalId::User(1)).unwrap();

        assert!(matches!(
            service().verify(&token).await,
            Err(JwtError::InvalidSignature)
        ));
        assert!(matches!(service().verify("garbage").await, Err(JwtError::Malformed)));
    }

    #[tokio::test]
    async fn test_revoked_session_is_rejected() {
        let jwt = service();
        let token = jwt.issue(PrincipalId::User(3)).unwrap();
        let claims = jwt.verify(&token).await.unwrap();
        jwt.revoke(&claims).await;

        assert!(matches!(jwt.verify(&token).await, Err(JwtError::Revoked)));
        // Other sessions of the same principal stay valid.
        let fresh = jwt.issue(PrincipalId::User(3)).unwrap();
        assert!(jwt.verify(&fresh).await.is_ok());
    }

    #[test]
    fn test_parse_subject() {
        assert_eq!(parse_subject("user:12"), Some(PrincipalId::User(12)));
        assert_eq!(parse_subject("person:0"), Some(PrincipalId::Person(0)));
        assert_eq!(parse_subject("admin:1"), None);
        assert_eq!(parse_subject("user:x"), None);
    }
}
