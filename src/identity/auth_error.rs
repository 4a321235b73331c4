use crate::security::HashError;
use crate::storage::StoreError;

use super::token::TokenError;

/// Why a request could not be tied to a live subject. The variants are logged
/// precisely but collapse to a generic response outside the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unauthenticated {
    #[error("missing transport")]
    MissingTransport,
    #[error("missing token")]
    MissingToken,
    #[error("expired")]
    Expired,
    #[error("invalid")]
    Invalid,
    #[error("malformed claim")]
    MalformedClaim,
    #[error("subject gone")]
    SubjectGone,
    #[error("invalid role")]
    InvalidRole,
    #[error("store unavailable")]
    StoreUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not authenticated: {0}")]
    Unauthenticated(Unauthenticated),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    pub fn forbidden(reason: impl Into<String>) -> Self { AuthError::Forbidden(reason.into()) }
}

impl From<Unauthenticated> for AuthError {
    fn from(reason: Unauthenticated) -> Self { AuthError::Unauthenticated(reason) }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self { AuthError::Hashing(err.to_string()) }
}
