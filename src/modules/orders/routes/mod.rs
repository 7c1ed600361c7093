use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use bookshop_authz::{AuthUser, Role};
use bookshop_http::{AppError, Page, PageParams, ValidatedJson};

use super::models::{OrderDto, OrderItemDto, PlaceOrderRequest, StatusUpdateRequest};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/{id}", patch(update_status).delete(delete_order))
        .route("/{id}/items", get(list_order_items))
        .route("/{id}/items/{item_id}", get(get_order_item))
        .with_state(state)
}

async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderDto>), AppError> {
    user.require(Role::User)?;
    let order = state
        .orders()
        .place_order(user.id, &request.shipping_address)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<OrderDto>>, AppError> {
    user.require(Role::User)?;
    Ok(Json(state.orders().get_orders(user.id, params.into()).await?))
}

async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<StatusUpdateRequest>,
) -> Result<Json<OrderDto>, AppError> {
    user.require(Role::User)?;
    let order = state
        .orders()
        .update_status(user.id, id, request.status)
        .await?;
    Ok(Json(order))
}

async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require(Role::User)?;
    state.orders().delete_order(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_order_items(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<OrderItemDto>>, AppError> {
    user.require(Role::User)?;
    Ok(Json(state.orders().get_order_line_items(user.id, id).await?))
}

async fn get_order_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(i64, i64)>,
) -> Result<Json<OrderItemDto>, AppError> {
    user.require(Role::User)?;
    Ok(Json(state.orders().get_order_line_item(user.id, id, item_id).await?))
}
