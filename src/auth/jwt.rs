use std::collections::HashMap;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::settings::AuthConfig;
use crate::utils::constants::JWT_KEY_ENV_PREFIX;

/// Why an inbound bearer token was rejected.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header missing")]
    MissingHeader,

    #[error("Invalid authorization header")]
    InvalidScheme,

    #[error("kid is not a string")]
    MissingKid,

    #[error("unknown key id '{0}'")]
    UnknownKid(String),

    #[error("token is expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_header",
            AuthError::InvalidScheme => "invalid_scheme",
            AuthError::MissingKid => "missing_kid",
            AuthError::UnknownKid(_) => "unknown_kid",
            AuthError::Expired => "expired",
            AuthError::Invalid(_) => "invalid",
        }
    }
}

/// Claims kept after verification.
#[derive(Debug, Clone, Deserialize)]
pub struct CallerClaims {
    #[serde(default)]
    pub sub: Option<String>,
}

/// Verifies HS256 bearer tokens whose `kid` header names a shared secret.
#[derive(Debug, Clone)]
pub struct Authenticator {
    audience: String,
    keys: HashMap<String, String>,
    keys_from_env: bool,
}

impl Authenticator {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            audience: cfg.audience.to_owned(),
            keys: cfg.keys.clone(),
            keys_from_env: cfg.keys_from_env,
        }
    }

    /// Check an `Authorization` header value.
    pub fn authorize(&self, header: Option<&str>) -> Result<CallerClaims, AuthError> {
        let header = header.filter(|h| !h.is_empty()).ok_or(AuthError::MissingHeader)?;
        let token = header.strip_prefix("Bearer ").ok_or(AuthError::InvalidScheme)?;
        self.verify(token)
    }

    pub fn verify(&self, token: &str) -> Result<CallerClaims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKid)?;
        let secret = self.secret_for(&kid).ok_or_else(|| AuthError::UnknownKid(kid.clone()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["aud"]);
        validation.validate_nbf = true;
        validation.leeway = 0;

        decode::<CallerClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(err),
            })
    }

    fn secret_for(&self, kid: &str) -> Option<String> {
        self.keys
            .get(kid)
            .cloned()
            .or_else(|| {
                self.keys_from_env
                    .then(|| std::env::var(format!("{}{}", JWT_KEY_ENV_PREFIX, kid)).ok())
                    .flatten()
            })
            .filter(|secret| !secret.is_empty())
    }
}
