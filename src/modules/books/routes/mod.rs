use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshop_authz::{AuthUser, Role};
use bookshop_http::{AppError, Page, PageParams, ValidatedJson};

use super::models::{Book, BookRequest};
use crate::state::AppState;
use crate::utils;

/// Catalog routes. Reads need any signed-in user, writes need ADMIN.
pub fn router(state: AppState) -> Router {
    let prefix = utils::log_prefix("books");
    tracing::debug!(target: "project.routes", %prefix, "books routes registered");

    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .with_state(state)
}

async fn list_books(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Book>>, AppError> {
    Ok(Json(state.books().find_all(params.into()).await?))
}

async fn get_book(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.books().find_by_id(id).await?))
}

async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    user.require(Role::Admin)?;
    let book = state.books().save(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> Result<Json<Book>, AppError> {
    user.require(Role::Admin)?;
    Ok(Json(state.books().update(id, request).await?))
}

async fn delete_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require(Role::Admin)?;
    state.books().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
