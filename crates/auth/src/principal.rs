use greengrocer_core::UserId;

use crate::{JwtClaims, Role};

/// Identity of an authenticated caller, as decoded from a verified token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl From<&JwtClaims> for Principal {
    fn from(claims: &JwtClaims) -> Self {
        Self {
            user_id: claims.id,
            role: claims.user_type,
        }
    }
}
