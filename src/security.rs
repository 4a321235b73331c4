//! Password hashing (Argon2id PHC strings).
//!
//! Whether a value is already a hash is decided by the caller and carried in
//! `Credential`; nothing here inspects string prefixes. Hashing and verification
//! are CPU heavy, so the async helpers run them on the blocking pool.

use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use password_hash::SaltString;

use crate::config::HashCost;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),
    #[error("salt generation failed: {0}")]
    Salt(String),
    #[error("hashing failed: {0}")]
    Hash(String),
    #[error("hashing task aborted: {0}")]
    Join(String),
}

/// A password as supplied to the store: either still plain text or already hashed.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Plain(String),
    Hashed(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Plain(_) => f.write_str("Credential::Plain(<redacted>)"),
            Credential::Hashed(_) => f.write_str("Credential::Hashed(<redacted>)"),
        }
    }
}

impl Credential {
    /// Produce the value to persist; only `Plain` is hashed.
    pub async fn into_hash(self, hashing: &Arc<PasswordHashing>) -> Result<String, HashError> {
        match self {
            Credential::Plain(p) => hashing.hash_blocking(p).await,
            Credential::Hashed(h) => Ok(h),
        }
    }
}

pub struct PasswordHashing {
    params: Params,
}

impl PasswordHashing {
    pub fn new(cost: HashCost) -> Result<Self, HashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| HashError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> { Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone()) }

    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| HashError::Salt(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| HashError::Salt(e.to_string()))?;
        let phc = self.argon2().hash_password(password.as_bytes(), &salt).map_err(|e| HashError::Hash(e.to_string()))?;
        Ok(phc.to_string())
    }

    /// Cost comes from the parameters embedded in `hash`, so hashes produced by this
    /// instance all take the same time to check.
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        if let Ok(parsed) = PasswordHash::new(hash) {
            self.argon2().verify_password(password.as_bytes(), &parsed).is_ok()
        } else { false }
    }

    pub async fn hash_blocking(self: &Arc<Self>, password: String) -> Result<String, HashError> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.hash(&password))
            .await
            .map_err(|e| HashError::Join(e.to_string()))?
    }

    pub async fn verify_blocking(self: &Arc<Self>, hash: String, password: String) -> bool {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.verify(&hash, &password)).await.unwrap_or(false)
    }
}
