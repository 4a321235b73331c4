//! Request authentication: cookie → verified token → live subject → principal.
//!
//! The token only says who the caller was when it logged in. Every request
//! re-reads the subject so deleted accounts and changed roles take effect
//! immediately, and any store failure rejects the request.

use axum::http::HeaderMap;
use tracing::{debug, error, warn};

use super::auth_error::{AuthError, Unauthenticated};
use super::principal::Principal;
use super::role::{Role, BASELINE_ROLE};
use super::session::extract_session_token;
use super::token::{TokenError, TokenService};
use crate::storage::UserStore;

fn reject(reason: Unauthenticated) -> AuthError {
    match reason {
        Unauthenticated::MissingTransport | Unauthenticated::MissingToken | Unauthenticated::Expired => {
            debug!(target: "taskboard::auth", %reason, "authentication rejected");
        }
        _ => warn!(target: "taskboard::auth", %reason, "authentication rejected"),
    }
    AuthError::Unauthenticated(reason)
}

/// Authenticate a request from its headers.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService, users: &dyn UserStore) -> Result<Principal, AuthError> {
    let token = extract_session_token(headers).map_err(reject)?;
    authenticate_token(&token, tokens, users)
}

/// Authenticate a raw session token.
pub fn authenticate_token(token: &str, tokens: &TokenService, users: &dyn UserStore) -> Result<Principal, AuthError> {
    let claims = tokens.verify(token).map_err(|e| match e {
        TokenError::Expired => reject(Unauthenticated::Expired),
        other => {
            debug!(target: "taskboard::auth", error = %other, "token verification failed");
            reject(Unauthenticated::Invalid)
        }
    })?;

    let subject_id = claims.subject().ok_or_else(|| reject(Unauthenticated::MalformedClaim))?;

    let user = match users.find_user(&subject_id) {
        Ok(Some(u)) => u,
        Ok(None) => return Err(reject(Unauthenticated::SubjectGone)),
        Err(e) => {
            error!(target: "taskboard::auth", subject = %subject_id, error = %e, "user lookup failed during authentication");
            return Err(reject(Unauthenticated::StoreUnavailable));
        }
    };

    // Current stored role, not the one baked into the token.
    let role = Role::from_level(user.user_level).ok_or_else(|| reject(Unauthenticated::InvalidRole))?;
    if !role.at_least(BASELINE_ROLE) {
        warn!(target: "taskboard::auth", subject = %subject_id, %role, "subject below baseline role");
        return Err(AuthError::forbidden("insufficient level"));
    }

    if claims.user_level != role.level() {
        debug!(target: "taskboard::auth", subject = %subject_id, token_level = claims.user_level, current = %role, "role changed since token issue");
    }
    Ok(Principal::new(subject_id, role))
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod gate_tests;
