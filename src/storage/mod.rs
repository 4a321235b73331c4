//!
//! taskboard storage module
//! ------------------------
//! An in-memory document store holding the `users`, `projects` and `tasks`
//! collections. Documents are keyed by 24-hex-char object ids and the store
//! enforces the unique indexes the API relies on (user email, project name).
//!
//! The identity layer only sees the narrow `UserStore` / `ProjectStore` traits so
//! that another backend can stand in without touching authentication code. Every
//! trait method is fallible: callers in the authentication path treat an error as a
//! rejection, never as a pass.

use std::ops::Deref;
use std::sync::Arc;

mod collection;
mod object_id;
mod records;

pub use collection::{Collection, Document, UniqueKey};
pub use object_id::{InvalidObjectId, ObjectId};
pub use records::{ProjectRecord, TaskRecord, TaskStatus, UserRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate value for {collection}.{field}")]
    Duplicate { collection: &'static str, field: &'static str },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// User lookups needed by authentication and credential checks.
pub trait UserStore: Send + Sync {
    fn find_user(&self, id: &ObjectId) -> Result<Option<UserRecord>, StoreError>;
    /// `email` must already be normalized (trimmed, lower-cased).
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    fn user_exists(&self, id: &ObjectId) -> Result<bool, StoreError>;
}

/// Project lookups needed by ownership checks.
pub trait ProjectStore: Send + Sync {
    fn find_project(&self, id: &ObjectId) -> Result<Option<ProjectRecord>, StoreError>;
}

pub struct Store {
    pub users: Collection<UserRecord>,
    pub projects: Collection<ProjectRecord>,
    pub tasks: Collection<TaskRecord>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            users: Collection::new("users").with_unique("email", |u| u.email.clone()),
            projects: Collection::new("projects").with_unique("name", |p| p.name.clone()),
            tasks: Collection::new("tasks"),
        }
    }

    pub fn tasks_for_user(&self, user: &ObjectId) -> Vec<TaskRecord> {
        self.tasks.find(|t| t.assigned_to.as_ref() == Some(user))
    }

    pub fn tasks_for_project(&self, project: &ObjectId) -> Vec<TaskRecord> {
        self.tasks.find(|t| t.project.as_ref() == Some(project))
    }
}

impl Default for Store {
    fn default() -> Self { Self::new() }
}

impl UserStore for Store {
    fn find_user(&self, id: &ObjectId) -> Result<Option<UserRecord>, StoreError> { Ok(self.users.get(id)) }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.find_one(|u| u.email == email))
    }

    fn user_exists(&self, id: &ObjectId) -> Result<bool, StoreError> { Ok(self.users.contains(id)) }
}

impl ProjectStore for Store {
    fn find_project(&self, id: &ObjectId) -> Result<Option<ProjectRecord>, StoreError> { Ok(self.projects.get(id)) }
}

/// Cheaply clonable handle shared by all request handlers.
#[derive(Clone, Default)]
pub struct SharedStore(pub Arc<Store>);

impl SharedStore {
    pub fn new() -> Self { Self(Arc::new(Store::new())) }
}

impl Deref for SharedStore {
    type Target = Store;
    fn deref(&self) -> &Store { &self.0 }
}
