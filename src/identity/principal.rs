use serde::Serialize;

use super::role::Role;
use crate::storage::ObjectId;

/// The store-confirmed identity behind one in-flight request.
///
/// `role` is the subject's role as read from the store during authentication,
/// never the role embedded in the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub subject_id: ObjectId,
    pub role: Role,
}

impl Principal {
    pub fn new(subject_id: ObjectId, role: Role) -> Self { Self { subject_id, role } }

    pub fn is(&self, id: &ObjectId) -> bool { &self.subject_id == id }

    pub fn at_least(&self, threshold: Role) -> bool { self.role.at_least(threshold) }
}
