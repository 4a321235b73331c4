//! Fixtures shared by the identity unit tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::principal::Principal;
use super::role::Role;
use super::token::TokenService;
use crate::config::HashCost;
use crate::security::PasswordHashing;
use crate::storage::{ObjectId, ProjectRecord, ProjectStore, Store, StoreError, UserRecord, UserStore};

pub const SECRET: &str = "0123456789abcdef0123456789abcdef";

pub fn tokens() -> TokenService {
    TokenService::new(Some(SECRET), Duration::from_secs(3600)).unwrap()
}

pub fn cheap_hashing() -> Arc<PasswordHashing> {
    Arc::new(PasswordHashing::new(HashCost { memory_kib: 1024, iterations: 1, parallelism: 1 }).unwrap())
}

pub fn user_with_level(email: &str, level: i64) -> UserRecord {
    let now = Utc::now();
    UserRecord {
        id: ObjectId::new(),
        name: "Test User".into(),
        email: email.into(),
        password_hash: String::new(),
        user_level: level,
        created_at: now,
        updated_at: now,
    }
}

pub fn add_user(store: &Store, email: &str, role: Role) -> UserRecord {
    store.users.insert(user_with_level(email, role.level())).unwrap()
}

pub fn add_project(store: &Store, name: &str, owner: &ObjectId) -> ProjectRecord {
    let now = Utc::now();
    store
        .projects
        .insert(ProjectRecord {
            id: ObjectId::new(),
            name: name.into(),
            description: String::new(),
            owner_id: owner.clone(),
            created_at: now,
            updated_at: now,
        })
        .unwrap()
}

pub fn principal(role: Role) -> Principal {
    Principal::new(ObjectId::new(), role)
}

/// A backend whose every read fails.
pub struct FailingStore;

impl UserStore for FailingStore {
    fn find_user(&self, _id: &ObjectId) -> Result<Option<UserRecord>, StoreError> { Err(StoreError::Unavailable("connection reset".into())) }
    fn find_user_by_email(&self, _email: &str) -> Result<Option<UserRecord>, StoreError> { Err(StoreError::Unavailable("connection reset".into())) }
    fn user_exists(&self, _id: &ObjectId) -> Result<bool, StoreError> { Err(StoreError::Unavailable("connection reset".into())) }
}

impl ProjectStore for FailingStore {
    fn find_project(&self, _id: &ObjectId) -> Result<Option<ProjectRecord>, StoreError> { Err(StoreError::Unavailable("connection reset".into())) }
}
