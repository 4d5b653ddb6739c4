//! Authentication and authorization
//!
//! Identity and roles are established here, at the boundary; the dues
//! core below never inspects them.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

/// Role definitions
pub mod roles {
    /// May record payments, generate obligations and reminders, and
    /// manage initial debts
    pub const TREASURER: &str = "treasurer";
    /// May register members
    pub const SECRETARY: &str = "secretary";
    /// Wildcard role
    pub const ADMIN: &str = "admin";
}

/// Creates a new JWT token
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if e.to_string().contains("ExpiredSignature") {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Checks if the user carries the required role (admin passes everything)
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims
        .roles
        .iter()
        .any(|r| r == required_role || r == roles::ADMIN)
}

/// Handler-side guard: `Forbidden` unless the role is present
pub fn require_role(claims: &Claims, required_role: &str) -> Result<(), ApiError> {
    if has_role(claims, required_role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "role '{required_role}' required"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with(roles: &[&str]) -> Claims {
        Claims {
            sub: "user-1".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: Utc::now().timestamp(),
        }
    }

    #[test]
    fn token_round_trip() {
        let token =
            create_token("user-1", vec![roles::TREASURER.to_string()], "secret", 3600).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(has_role(&claims, roles::TREASURER));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("user-1", vec![], "secret", 3600).unwrap();
        assert!(validate_token(&token, "other").is_err());
    }

    #[test]
    fn admin_passes_any_role_check() {
        let claims = claims_with(&[roles::ADMIN]);
        assert!(require_role(&claims, roles::TREASURER).is_ok());
        assert!(require_role(&claims, roles::SECRETARY).is_ok());
    }

    #[test]
    fn missing_role_is_forbidden() {
        let claims = claims_with(&[roles::SECRETARY]);
        let err = require_role(&claims, roles::TREASURER).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
