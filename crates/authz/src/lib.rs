//! Authentication and authorization for the bookshop API.
//!
//! Bearer tokens are HS256 JWTs carrying the user id, email and roles. The
//! [`AuthUser`] extractor verifies the token; handlers then call
//! [`AuthUser::require`] for the role their endpoint needs.

mod password;
mod token;

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use bookshop_http::AppError;
use serde::{Deserialize, Serialize};

pub use password::{hash_password, verify_password};
pub use token::{Claims, JwtKeys};

/// Roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated identity extracted from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Fail with 403 unless the user holds `role`.
    pub fn require(&self, role: Role) -> Result<&Self, AppError> {
        if self.has_role(role) {
            Ok(self)
        } else {
            tracing::debug!(user_id = self.id, role = role.as_str(), "role check failed");
            Err(AppError::forbidden(format!("role {} required", role.as_str())))
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.uid,
            email: claims.sub,
            roles: claims.roles,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<JwtKeys>::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("invalid Authorization format"))?;

        let claims = keys.verify(token).map_err(|err| {
            tracing::debug!("JWT validation failed: {err}");
            AppError::unauthorized("invalid or expired token")
        })?;

        Ok(claims.into())
    }
}
