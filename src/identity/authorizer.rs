//! Per-resource authorization predicates.
//!
//! Ownership checks load the resource first and answer `NotFound` before any
//! ownership comparison, so a caller cannot probe for ids it does not own.

use tracing::debug;

use super::auth_error::AuthError;
use super::principal::Principal;
use super::role::Role;
use crate::storage::{ObjectId, ProjectRecord, ProjectStore, UserStore};

/// Owner of the project, or anyone holding at least `min_role`.
pub fn project_access(principal: &Principal, project: &ProjectRecord, min_role: Role) -> bool {
    principal.is(&project.owner_id) || principal.at_least(min_role)
}

pub fn authorize_project(
    projects: &dyn ProjectStore,
    principal: &Principal,
    project_id: &ObjectId,
    min_role: Role,
) -> Result<ProjectRecord, AuthError> {
    let project = projects.find_project(project_id)?.ok_or(AuthError::NotFound("Project"))?;
    if !project_access(principal, &project, min_role) {
        debug!(target: "taskboard::auth", subject = %principal.subject_id, project = %project_id, "project access denied");
        return Err(AuthError::forbidden("not the project owner"));
    }
    Ok(project)
}

/// At least `min_role`, or the target itself when `allow_self` is set.
pub fn user_access(principal: &Principal, target_id: Option<&ObjectId>, min_role: Role, allow_self: bool) -> bool {
    principal.at_least(min_role) || (allow_self && target_id.is_some_and(|id| principal.is(id)))
}

/// `target_id` is `None` for collection-level actions (list, create), which have
/// nothing to look up.
pub fn authorize_user(
    users: &dyn UserStore,
    principal: &Principal,
    target_id: Option<&ObjectId>,
    min_role: Role,
    allow_self: bool,
) -> Result<(), AuthError> {
    if let Some(id) = target_id {
        if !users.user_exists(id)? {
            return Err(AuthError::NotFound("User"));
        }
    }
    if !user_access(principal, target_id, min_role, allow_self) {
        debug!(target: "taskboard::auth", subject = %principal.subject_id, required = %min_role, "user access denied");
        return Err(AuthError::forbidden("insufficient level"));
    }
    Ok(())
}

/// An administrator may not remove their own account; everyone else may.
pub fn authorize_user_delete(principal: &Principal, target_id: &ObjectId) -> Result<(), AuthError> {
    if principal.is(target_id) && principal.role == Role::Admin {
        return Err(AuthError::forbidden("admins cannot self-delete"));
    }
    Ok(())
}

/// Nobody hands out a level above their own, admins included. `requested_level`
/// is the raw numeric value from the patch payload.
pub fn authorize_level_assignment(principal: &Principal, requested_level: i64) -> Result<(), AuthError> {
    if requested_level > principal.role.level() {
        return Err(AuthError::forbidden("cannot assign higher level than own"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::test_support::*;
    use crate::storage::Store;

    fn forbidden_reason(r: Result<impl std::fmt::Debug, AuthError>) -> String {
        match r {
            Err(AuthError::Forbidden(m)) => m,
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[test]
    fn owner_passes_admin_threshold() {
        let store = Store::new();
        let dev = principal(Role::Developer);
        let project = add_project(&store, "alpha", &dev.subject_id);
        assert!(authorize_project(&store, &dev, &project.id, Role::Admin).is_ok());
    }

    #[test]
    fn non_owner_developer_is_denied_admin_is_allowed() {
        let store = Store::new();
        let owner = principal(Role::Developer);
        let project = add_project(&store, "alpha", &owner.subject_id);
        let other = principal(Role::Developer);
        assert_eq!(forbidden_reason(authorize_project(&store, &other, &project.id, Role::Admin)), "not the project owner");
        assert!(authorize_project(&store, &principal(Role::Admin), &project.id, Role::Admin).is_ok());
    }

    #[test]
    fn missing_project_is_not_found_even_for_strangers() {
        let store = Store::new();
        let r = authorize_project(&store, &principal(Role::Developer), &ObjectId::new(), Role::Admin);
        assert!(matches!(r, Err(AuthError::NotFound("Project"))));
    }

    #[test]
    fn store_failure_is_not_an_allow() {
        let r = authorize_project(&FailingStore, &principal(Role::Admin), &ObjectId::new(), Role::Developer);
        assert!(matches!(r, Err(AuthError::Store(_))));
        let r = authorize_user(&FailingStore, &principal(Role::Admin), Some(&ObjectId::new()), Role::Admin, true);
        assert!(matches!(r, Err(AuthError::Store(_))));
    }

    #[test]
    fn self_or_role_for_users() {
        let store = Store::new();
        let me = add_user(&store, "me@example.com", Role::Developer);
        let other = add_user(&store, "other@example.com", Role::Developer);
        let p = Principal::new(me.id.clone(), Role::Developer);

        assert!(authorize_user(&store, &p, Some(&me.id), Role::Admin, true).is_ok());
        assert!(authorize_user(&store, &p, Some(&me.id), Role::Admin, false).is_err());
        assert!(authorize_user(&store, &p, Some(&other.id), Role::Admin, true).is_err());
        assert!(authorize_user(&store, &p, None, Role::Admin, true).is_err());
        assert!(authorize_user(&store, &principal(Role::Admin), Some(&other.id), Role::Admin, false).is_ok());
    }

    #[test]
    fn missing_user_is_not_found_before_access_check() {
        let store = Store::new();
        let r = authorize_user(&store, &principal(Role::Developer), Some(&ObjectId::new()), Role::Admin, true);
        assert!(matches!(r, Err(AuthError::NotFound("User"))));
    }

    #[test]
    fn only_admin_self_delete_is_denied() {
        let admin = principal(Role::Admin);
        assert_eq!(forbidden_reason(authorize_user_delete(&admin, &admin.subject_id)), "admins cannot self-delete");
        assert!(authorize_user_delete(&admin, &principal(Role::Admin).subject_id).is_ok());
        let dev = principal(Role::Developer);
        assert!(authorize_user_delete(&dev, &dev.subject_id).is_ok());
    }

    #[test]
    fn level_assignment_cannot_exceed_own() {
        let admin = principal(Role::Admin);
        assert_eq!(forbidden_reason(authorize_level_assignment(&admin, 30)), "cannot assign higher level than own");
        assert!(authorize_level_assignment(&admin, 20).is_ok());
        assert!(authorize_level_assignment(&admin, 10).is_ok());
        let dev = principal(Role::Developer);
        assert!(authorize_level_assignment(&dev, 20).is_err());
        assert!(authorize_level_assignment(&dev, 0).is_ok());
    }

    #[test]
    fn threshold_is_numeric() {
        for a in Role::ALL {
            for b in Role::ALL {
                let p = principal(a);
                assert_eq!(user_access(&p, None, b, false), a.level() >= b.level());
            }
        }
    }
}
