use std::{env, path::PathBuf, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3002";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3002";
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3_600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable `{0}`")]
    InvalidVar(&'static str),
}

/// Where collections are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    Directory(PathBuf),
    InMemory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub public_base_url: String,
    pub data: DataLocation,
    pub auth: AuthConfig,
    pub invitation_sweep_interval: Duration,
    pub seed_default_data: bool,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    session_ttl: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: SecretString, session_ttl: Duration) -> Self {
        Self {
            jwt_secret,
            session_ttl,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("SERVER_JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("SERVER_JWT_SECRET"))?;
        validate_jwt_secret(&jwt_secret)?;

        let session_ttl = Duration::from_secs(parse_secs(
            "SESSION_TTL_SECS",
            DEFAULT_SESSION_TTL_SECS,
        )?);

        Ok(Self::new(SecretString::new(jwt_secret.into()), session_ttl))
    }

    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr =
            env::var("SERVER_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        let public_base_url = env::var("SERVER_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string());

        let data = match env::var("DATA_DIR") {
            Ok(dir) if dir == ":memory:" => DataLocation::InMemory,
            Ok(dir) if !dir.is_empty() => DataLocation::Directory(PathBuf::from(dir)),
            _ => DataLocation::Directory(PathBuf::from("./data")),
        };

        let auth = AuthConfig::from_env()?;

        let invitation_sweep_interval = Duration::from_secs(parse_secs(
            "INVITATION_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?);

        let seed_default_data = match env::var("SEED_DEFAULT_DATA") {
            Ok(v) => parse_flag(&v).ok_or(ConfigError::InvalidVar("SEED_DEFAULT_DATA"))?,
            Err(_) => true,
        };

        Ok(Self {
            listen_addr,
            public_base_url,
            data,
            auth,
            invitation_sweep_interval,
            seed_default_data,
        })
    }
}

fn parse_secs(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::InvalidVar(name)),
        },
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" => Some(true),
        "0" => Some(false),
        v if v.eq_ignore_ascii_case("true") => Some(true),
        v if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// The secret must be base64 and decode to at least 32 bytes.
pub fn validate_jwt_secret(secret: &str) -> Result<(), ConfigError> {
    let decoded = BASE64_STANDARD
        .decode(secret.as_bytes())
        .map_err(|_| ConfigError::InvalidVar("SERVER_JWT_SECRET"))?;

    if decoded.len() < 32 {
        return Err(ConfigError::InvalidVar("SERVER_JWT_SECRET"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_secret_needs_32_decoded_bytes() {
        assert!(validate_jwt_secret(&BASE64_STANDARD.encode([7u8; 32])).is_ok());
        assert!(matches!(
            validate_jwt_secret(&BASE64_STANDARD.encode([7u8; 31])),
            Err(ConfigError::InvalidVar("SERVER_JWT_SECRET"))
        ));
        assert!(validate_jwt_secret("not base64!").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
