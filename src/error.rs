//! Domain error shared by every bookshop service.

use bookshop_http::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopError {
    /// Entity missing, soft-deleted, or owned by someone else.
    #[error("{0}")]
    NotFound(String),

    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Business rule violation that is not a missing entity.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ShopResult<T> = Result<T, ShopError>;

impl ShopError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Map a UNIQUE violation to a conflict, anything else to persistence.
    pub fn from_write(err: sqlx::Error, conflict_message: impl Into<String>) -> Self {
        if bookshop_db::is_unique_violation(&err) {
            Self::Conflict(conflict_message.into())
        } else {
            Self::Persistence(err)
        }
    }
}

impl From<ShopError> for AppError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::NotFound(message) => AppError::not_found(message),
            ShopError::Validation { field, message } => AppError::validation(
                vec![serde_json::json!({ "field": field, "message": message })],
                format!("{field}: {message}"),
            ),
            ShopError::Conflict(message) => AppError::conflict(Vec::new(), message),
            ShopError::Unauthorized(message) => AppError::unauthorized(message),
            ShopError::Persistence(err) => {
                AppError::Internal(anyhow::Error::new(err).context("persistence failure"))
            }
            ShopError::Internal(err) => AppError::Internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn kinds_map_to_status_codes() {
        let cases = [
            (ShopError::not_found("book 1"), StatusCode::NOT_FOUND),
            (ShopError::validation("quantity", "must be at least 1"), StatusCode::BAD_REQUEST),
            (ShopError::conflict("empty cart"), StatusCode::CONFLICT),
            (ShopError::Unauthorized("bad credentials".into()), StatusCode::UNAUTHORIZED),
            (ShopError::Persistence(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn non_unique_write_errors_stay_persistence_failures() {
        let err = ShopError::from_write(sqlx::Error::PoolTimedOut, "duplicate");
        assert!(matches!(err, ShopError::Persistence(_)));
    }
}
