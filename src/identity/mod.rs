//!
//! taskboard identity module
//! -------------------------
//! Roles, session tokens, request authentication and the per-resource
//! authorization predicates. Keep the public surface thin and split
//! implementation across sub-modules.

mod auth_error;
mod authorizer;
mod gate;
mod principal;
mod provider;
mod request_context;
mod role;
mod session;
mod token;

#[cfg(test)]
mod test_support;

pub use auth_error::{AuthError, Unauthenticated};
pub use authorizer::{
    authorize_level_assignment, authorize_project, authorize_user, authorize_user_delete, project_access, user_access,
};
pub use gate::{authenticate, authenticate_token};
pub use principal::Principal;
pub use provider::{normalize_email, CredentialVerifier, LoginRequest, LoginResponse};
pub use request_context::RequestContext;
pub use role::{Role, RoleInput, BASELINE_ROLE};
pub use session::{extract_session_token, parse_cookie, CookieOptions, SameSite, SESSION_COOKIE};
pub use token::{SessionClaim, TokenClaims, TokenError, TokenService};
