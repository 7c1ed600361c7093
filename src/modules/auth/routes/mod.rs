use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use bookshop_http::{AppError, ValidatedJson};

use super::models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::state::AppState;
use crate::utils;

/// HTTP routes for registration and login.
pub fn router(state: AppState) -> Router {
    let prefix = utils::log_prefix("auth");
    tracing::debug!(target: "project.routes", %prefix, "auth routes registered");

    Router::new()
        .route("/registration", post(register))
        .route("/login", post(login))
        .with_state(state)
}

async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.users().register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(state.users().login(request).await?))
}
