//! Signed, time-limited bearer tokens (HS256 JWT).

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use greengrocer_core::UserId;

use crate::{JwtClaims, Role, TokenValidationError, validate_claims};

/// Lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No token was supplied with the request.
    #[error("token required")]
    Missing,

    /// Bad signature, malformed token or unusable claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Absent tokens (401) are reported differently from bad ones (403).
    pub fn is_missing(&self) -> bool {
        matches!(self, TokenError::Missing)
    }
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            other => TokenError::Invalid(other.to_string()),
        }
    }
}

/// Issues and verifies tokens with a single shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl core::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks are done by `validate_claims` against an explicit clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: TOKEN_TTL,
        }
    }

    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, TokenError> {
        self.issue_at(user_id, role, Utc::now())
    }

    pub fn issue_at(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(|e| TokenError::Signing(e.to_string()))?;
        let claims = JwtClaims {
            id: user_id,
            user_type: role,
            iat,
            exp: iat + ttl,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing);
        }

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            TokenError::Invalid(e.to_string())
        })?;

        if let Err(e) = validate_claims(&data.claims, now) {
            tracing::debug!(error = %e, user_id = %data.claims.id, "token outside its validity window");
            return Err(e.into());
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn issued_token_round_trips_identity_and_role() {
        let issuer = TokenIssuer::new(b"test-secret");
        let user_id = UserId::new();

        let token = issuer.issue(user_id, Role::Manager).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.id, user_id);
        assert_eq!(claims.user_type, Role::Manager);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_expires_after_one_hour() {
        let issuer = TokenIssuer::new(b"test-secret");
        let issued = Utc::now() - ChronoDuration::minutes(61);
        let token = issuer.issue_at(UserId::new(), Role::Admin, issued).unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
        assert!(issuer.verify_at(&token, issued + ChronoDuration::minutes(59)).is_ok());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = TokenIssuer::new(b"one").issue(UserId::new(), Role::Admin).unwrap();
        let err = TokenIssuer::new(b"two").verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
        assert!(!err.is_missing());
    }

    #[test]
    fn garbage_is_invalid_and_blank_is_missing() {
        let issuer = TokenIssuer::new(b"test-secret");
        assert!(matches!(issuer.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
        assert!(issuer.verify("  ").unwrap_err().is_missing());
    }
}
