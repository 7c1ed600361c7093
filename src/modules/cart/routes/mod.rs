use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use bookshop_authz::{AuthUser, Role};
use bookshop_http::{AppError, ValidatedJson};

use super::models::{AddToCartRequest, CartDto, UpdateQuantityRequest};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart))
        .route("/items/{id}", put(update_quantity).delete(remove_line_item))
        .with_state(state)
}

async fn get_cart(State(state): State<AppState>, user: AuthUser) -> Result<Json<CartDto>, AppError> {
    user.require(Role::User)?;
    Ok(Json(state.carts().get_cart(user.id).await?))
}

async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<AddToCartRequest>,
) -> Result<Json<CartDto>, AppError> {
    user.require(Role::User)?;
    let cart = state
        .carts()
        .add_to_cart(user.id, request.book_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateQuantityRequest>,
) -> Result<Json<CartDto>, AppError> {
    user.require(Role::User)?;
    let cart = state
        .carts()
        .update_quantity(user.id, id, request.quantity)
        .await?;
    Ok(Json(cart))
}

async fn remove_line_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require(Role::User)?;
    state.carts().remove_line_item(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
