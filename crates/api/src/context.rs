use greengrocer_auth::{Principal, Role};
use greengrocer_core::UserId;

/// Principal context for a request (authenticated identity + role).
///
/// Inserted into request extensions by the role-gate middleware; only
/// present on authenticated routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl From<Principal> for PrincipalContext {
    fn from(p: Principal) -> Self {
        Self::new(p.user_id, p.role)
    }
}
