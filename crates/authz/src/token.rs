use bookshop_kernel::settings::AuthSettings;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::Role;

/// JWT claims for an authenticated bookshop user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    /// User id
    pub uid: i64,
    pub roles: Vec<Role>,
    /// Expiration (Unix timestamp seconds)
    pub exp: i64,
    /// Issued at (Unix timestamp seconds)
    pub iat: i64,
}

/// Signing and verification keys derived from the configured secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self {
            encoding: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            ttl: Duration::minutes(settings.token_ttl_minutes),
        }
    }

    /// Issue a signed token for the given user.
    pub fn issue(
        &self,
        user_id: i64,
        email: &str,
        roles: &[Role],
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: email.to_string(),
            uid: user_id,
            roles: roles.to_vec(),
            exp: (now + self.ttl).unix_timestamp(),
            iat: now.unix_timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::default();
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str, ttl_minutes: i64) -> JwtKeys {
        JwtKeys::from_settings(&AuthSettings {
            jwt_secret: secret.to_string(),
            token_ttl_minutes: ttl_minutes,
        })
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys("secret", 60);
        let token = keys.issue(1, "admin@example.com", &[Role::User, Role::Admin]).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.uid, 1);
        assert_eq!(claims.sub, "admin@example.com");
        assert_eq!(claims.roles, vec![Role::User, Role::Admin]);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = keys("one", 60).issue(1, "a@example.com", &[Role::User]).unwrap();
        assert!(keys("two", 60).verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys("secret", -10);
        let token = keys.issue(1, "a@example.com", &[Role::User]).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
