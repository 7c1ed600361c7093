use bookshop_http::Pageable;
use sqlx::SqliteConnection;

use super::models::Category;

pub async fn find_all(
    conn: &mut SqliteConnection,
    pageable: Pageable,
) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, description FROM categories ORDER BY name, id LIMIT ?1 OFFSET ?2")
        .bind(pageable.limit())
        .bind(pageable.offset())
        .fetch_all(conn)
        .await
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
        .fetch_one(conn)
        .await?;
    Ok(total)
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, description FROM categories WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO categories (name, description) VALUES (?1, ?2)
         RETURNING id, name, description",
    )
    .bind(name)
    .bind(description)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE categories SET name = ?2, description = ?3 WHERE id = ?1
         RETURNING id, name, description",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(conn)
    .await
}

/// Returns false when no such category exists.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
