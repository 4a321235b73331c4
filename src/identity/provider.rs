//! Login-time credential checks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auth_error::AuthError;
use super::role::Role;
use super::token::{SessionClaim, TokenService};
use crate::security::PasswordHashing;
use crate::storage::{UserRecord, UserStore};
use crate::tprintln;

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest").field("email", &self.email).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRecord,
    #[serde(skip)]
    pub claim: SessionClaim,
}

pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// Checks email/password pairs.
///
/// An unknown email still costs one hash comparison, against a dummy hash made
/// with the same parameters as real ones, so the two failure paths take the
/// same time.
pub struct CredentialVerifier {
    hashing: Arc<PasswordHashing>,
    dummy_hash: String,
}

impl CredentialVerifier {
    pub fn new(hashing: Arc<PasswordHashing>) -> Result<Self, AuthError> {
        let dummy_hash = hashing.hash("taskboard-dummy-password")?;
        Ok(Self { hashing, dummy_hash })
    }

    pub fn hashing(&self) -> &Arc<PasswordHashing> { &self.hashing }

    /// Returns the matching user only when the password checks out.
    pub async fn verify_credentials(
        &self,
        users: &dyn UserStore,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        let user = users.find_user_by_email(&normalize_email(email))?;
        let hash = match &user {
            Some(u) => u.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };
        let ok = self.hashing.verify_blocking(hash, password.to_string()).await;
        Ok(user.filter(|_| ok))
    }

    pub async fn login(&self, users: &dyn UserStore, tokens: &TokenService, req: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let Some(user) = self.verify_credentials(users, &req.email, &req.password).await? else {
            info!(target: "taskboard::auth", "login failed");
            return Err(AuthError::InvalidCredentials);
        };
        let Some(role) = Role::from_level(user.user_level) else {
            warn!(target: "taskboard::auth", user = %user.id, level = user.user_level, "stored level is not a role");
            return Err(AuthError::InvalidCredentials);
        };
        let claim = SessionClaim { subject_id: user.id.clone(), role };
        let token = tokens.issue(&claim)?;
        info!(target: "taskboard::auth", user = %user.id, %role, "login succeeded");
        tprintln!("auth.login user={} role={}", user.id, role);
        Ok(LoginResponse { token, user, claim })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::identity::test_support::*;
    use crate::storage::Store;

    fn verifier() -> CredentialVerifier { CredentialVerifier::new(cheap_hashing()).unwrap() }

    fn store_with(v: &CredentialVerifier, email: &str, password: &str, level: i64) -> (Store, UserRecord) {
        let store = Store::new();
        let mut u = user_with_level(email, level);
        u.password_hash = v.hashing().hash(password).unwrap();
        let u = store.users.insert(u).unwrap();
        (store, u)
    }

    fn req(email: &str, password: &str) -> LoginRequest {
        LoginRequest { email: email.into(), password: password.into() }
    }

    #[tokio::test]
    async fn login_issues_token_with_current_role() {
        let v = verifier();
        let tokens = tokens();
        let (store, u) = store_with(&v, "real@x.com", "right-password", 10);
        let res = v.login(&store, &tokens, &req("real@x.com", "right-password")).await.unwrap();
        assert_eq!(res.claim, SessionClaim { subject_id: u.id.clone(), role: Role::Developer });
        let claims = tokens.verify(&res.token).unwrap();
        assert_eq!(claims.subject(), Some(u.id));
        assert_eq!(claims.role(), Some(Role::Developer));
    }

    #[tokio::test]
    async fn email_is_trimmed_and_lowercased() {
        let v = verifier();
        let (store, _) = store_with(&v, "real@x.com", "pw", 20);
        assert!(v.login(&store, &tokens(), &req("  Real@X.com ", "pw")).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let v = verifier();
        let tokens = tokens();
        let (store, _) = store_with(&v, "real@x.com", "right-password", 10);
        let a = v.login(&store, &tokens, &req("nonexistent@x.com", "anything")).await;
        let b = v.login(&store, &tokens, &req("real@x.com", "wrongpassword")).await;
        assert!(matches!(a, Err(AuthError::InvalidCredentials)));
        assert!(matches!(b, Err(AuthError::InvalidCredentials)));
    }

    fn median(mut samples: Vec<Duration>) -> Duration {
        samples.sort();
        samples[samples.len() / 2]
    }

    #[tokio::test]
    async fn failure_paths_take_comparable_time() {
        let v = verifier();
        let tokens = tokens();
        let (store, _) = store_with(&v, "real@x.com", "right-password", 10);
        // Warm up the blocking pool.
        let _ = v.login(&store, &tokens, &req("real@x.com", "x")).await;

        // Interleaved rounds, compared by median so scheduler hiccups do not count.
        let rounds = 101;
        let mut unknown = Vec::with_capacity(rounds);
        let mut wrong = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            let t = Instant::now();
            let _ = v.login(&store, &tokens, &req("nonexistent@x.com", "anything")).await;
            unknown.push(t.elapsed());
            let t = Instant::now();
            let _ = v.login(&store, &tokens, &req("real@x.com", "wrongpassword")).await;
            wrong.push(t.elapsed());
        }
        let (unknown, wrong) = (median(unknown), median(wrong));
        let (lo, hi) = if unknown < wrong { (unknown, wrong) } else { (wrong, unknown) };
        tprintln!("timing median unknown={:?} wrong={:?}", unknown, wrong);
        assert!(hi.as_secs_f64() / lo.as_secs_f64().max(1e-9) < 2.0, "unknown={unknown:?} wrong={wrong:?}");
    }

    #[tokio::test]
    async fn undefined_stored_level_cannot_log_in() {
        let v = verifier();
        let (store, _) = store_with(&v, "odd@x.com", "pw", 15);
        assert!(matches!(v.login(&store, &tokens(), &req("odd@x.com", "pw")).await, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn debug_hides_password() {
        assert!(!format!("{:?}", req("a@b.c", "hunter2")).contains("hunter2"));
    }
}
