use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshop_authz::{AuthUser, Role};
use bookshop_http::{AppError, Page, PageParams, ValidatedJson};

use super::models::{Category, CategoryRequest};
use crate::modules::books::models::BookSummary;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/{id}/books", get(list_books_in_category))
        .with_state(state)
}

async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Category>>, AppError> {
    user.require(Role::User)?;
    Ok(Json(state.categories().find_all(params.into()).await?))
}

async fn get_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    user.require(Role::User)?;
    Ok(Json(state.categories().find_by_id(id).await?))
}

async fn list_books_in_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<BookSummary>>, AppError> {
    user.require(Role::User)?;
    Ok(Json(state.books().find_by_category(id, params.into()).await?))
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    user.require(Role::Admin)?;
    let category = state.categories().save(request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    user.require(Role::Admin)?;
    Ok(Json(state.categories().update(id, request).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require(Role::Admin)?;
    state.categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
