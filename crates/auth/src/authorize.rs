use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The message names the caller's actual role; clients rely on it.
    #[error("Forbidden: {actual} role cannot access user management APIs")]
    Forbidden { actual: Role, required: Role },
}

/// Authorize a principal against a required role.
///
/// - No IO
/// - No panics
/// - Exact match: there is no role hierarchy
pub fn authorize(principal: &Principal, required: Role) -> Result<(), AuthzError> {
    if principal.role == required {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            actual: principal.role,
            required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greengrocer_core::UserId;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: UserId::new(),
            role,
        }
    }

    #[test]
    fn same_role_is_allowed() {
        assert!(authorize(&principal(Role::Admin), Role::Admin).is_ok());
        assert!(authorize(&principal(Role::Manager), Role::Manager).is_ok());
    }

    #[test]
    fn no_hierarchy_between_roles() {
        assert!(authorize(&principal(Role::Manager), Role::Admin).is_err());
        assert!(authorize(&principal(Role::Admin), Role::Manager).is_err());
    }

    #[test]
    fn denial_names_the_actual_role() {
        let err = authorize(&principal(Role::Manager), Role::Admin).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Forbidden: Manager role cannot access user management APIs"
        );
    }
}
