use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::role::Role;
use crate::config::Config;
use crate::storage::ObjectId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("JWT_SECRET is not defined")]
    MissingSecret,
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// What a session token asserts: who the subject is and the role it held at issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaim {
    pub subject_id: ObjectId,
    pub role: Role,
}

/// Wire form of the signed payload. `sub` is left as a raw string: verification
/// proves who signed it, not that it names a well-formed subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub sub: String,
    pub user_level: i64,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn subject(&self) -> Option<ObjectId> { ObjectId::parse(&self.sub) }

    pub fn role(&self) -> Option<Role> { Role::from_level(self.user_level) }
}

/// Issues and verifies HS256 session tokens with a fixed lifetime.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: Option<&str>, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.filter(|s| !s.is_empty()).ok_or(TokenError::MissingSecret)?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, TokenError> {
        Self::new(cfg.jwt_secret.as_deref(), cfg.token_ttl)
    }

    pub fn issue(&self, claim: &SessionClaim) -> Result<String, TokenError> {
        self.issue_at(claim, chrono::Utc::now().timestamp())
    }

    /// Issue as if the current time were `issued_at` (unix seconds).
    pub fn issue_at(&self, claim: &SessionClaim, issued_at: i64) -> Result<String, TokenError> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| issued_at.checked_add(ttl))
            .ok_or_else(|| TokenError::Signing(format!("token lifetime of {}s is out of range", self.ttl.as_secs())))?;
        let claims = TokenClaims {
            sub: claim.subject_id.to_string(),
            user_level: claim.role.level(),
            iat: issued_at,
            exp,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        match decode::<TokenClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid(e.to_string())),
            },
        }
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod token_tests;
