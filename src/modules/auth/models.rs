use bookshop_authz::Role;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Stored user row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<String>,
}

/// Registration request. Passwords must match.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "passwords_match"))]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 30, message = "size must be between 6 and 30"))]
    pub password: String,
    #[validate(length(min = 6, max = 30, message = "size must be between 6 and 30"))]
    pub confirm_password: String,
    #[validate(custom(function = "crate::utils::not_blank"))]
    pub first_name: String,
    #[validate(custom(function = "crate::utils::not_blank"))]
    pub last_name: String,
    #[serde(default)]
    pub shipping_address: Option<String>,
}

fn passwords_match(request: &RegisterRequest) -> Result<(), ValidationError> {
    if request.password != request.confirm_password {
        return Err(ValidationError::new("field_match").with_message("Passwords don't match".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<String>,
    pub roles: Vec<Role>,
}

impl UserResponse {
    pub fn from_record(record: UserRecord, roles: Vec<Role>) -> Self {
        Self {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            shipping_address: record.shipping_address,
            roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            email: "reader@example.com".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            first_name: "Ada".into(),
            last_name: "Reader".into(),
            shipping_address: None,
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn mismatched_passwords_fail() {
        let mut req = request();
        req.confirm_password = "secret2".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn short_password_and_blank_name_fail() {
        let mut req = request();
        req.password = "abc".into();
        req.confirm_password = "abc".into();
        req.last_name = "   ".into();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("last_name"));
    }
}
