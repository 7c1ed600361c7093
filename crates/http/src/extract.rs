//! Request extractors that reject malformed input before it reaches a service.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::AppError;

/// JSON body that has been deserialized and passed `validator` checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| AppError::validation(field_details(&errors), "request validation failed"))?;

        Ok(ValidatedJson(value))
    }
}

/// Flatten validator output into `{field, code, message}` entries.
pub fn field_details(errors: &ValidationErrors) -> Vec<serde_json::Value> {
    let mut details = Vec::new();
    collect(errors, "", &mut details);
    details.sort_by(|a, b| a["field"].as_str().cmp(&b["field"].as_str()));
    details
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<serde_json::Value>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{path}: invalid value ({})", error.code));
                    out.push(serde_json::json!({
                        "field": path,
                        "code": error.code,
                        "message": message,
                    }));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Quantity {
        #[validate(range(min = 1, message = "quantity must be at least 1"))]
        quantity: i64,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidatedJson(value) = ValidatedJson::<Quantity>::from_request(json_request(r#"{"quantity": 3}"#), &())
            .await
            .unwrap();
        assert_eq!(value.quantity, 3);
    }

    #[tokio::test]
    async fn rejects_out_of_range_with_field_details() {
        let err = ValidatedJson::<Quantity>::from_request(json_request(r#"{"quantity": 0}"#), &())
            .await
            .unwrap_err();

        match &err {
            AppError::Validation { details, .. } => {
                assert_eq!(details[0]["field"], "quantity");
                assert_eq!(details[0]["message"], "quantity must be at least 1");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = ValidatedJson::<Quantity>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }
}
