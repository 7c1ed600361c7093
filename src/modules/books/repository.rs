//! Catalog store. Reads go through the `live_books` view so soft-deleted
//! books never surface.

use bookshop_http::Pageable;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;

use super::models::BookRow;

const LIVE_COLUMNS: &str = "b.id, b.title, b.author, b.isbn, b.price, b.description, b.cover_image";

pub struct NewBook<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub isbn: &'a str,
    pub price: Decimal,
    pub description: Option<&'a str>,
    pub cover_image: Option<&'a str>,
}

pub async fn find_all(
    conn: &mut SqliteConnection,
    pageable: Pageable,
) -> Result<Vec<BookRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {LIVE_COLUMNS} FROM live_books b ORDER BY b.id LIMIT ?1 OFFSET ?2"
    ))
    .bind(pageable.limit())
    .bind(pageable.offset())
    .fetch_all(conn)
    .await
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM live_books")
        .fetch_one(conn)
        .await?;
    Ok(total)
}

pub async fn find_book_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<BookRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {LIVE_COLUMNS} FROM live_books b WHERE b.id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_books_by_category(
    conn: &mut SqliteConnection,
    category_id: i64,
    pageable: Pageable,
) -> Result<Vec<BookRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {LIVE_COLUMNS} FROM live_books b
         JOIN book_categories bc ON bc.book_id = b.id
         WHERE bc.category_id = ?1
         ORDER BY b.id LIMIT ?2 OFFSET ?3"
    ))
    .bind(category_id)
    .bind(pageable.limit())
    .bind(pageable.offset())
    .fetch_all(conn)
    .await
}

pub async fn count_by_category(
    conn: &mut SqliteConnection,
    category_id: i64,
) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM live_books b
         JOIN book_categories bc ON bc.book_id = b.id
         WHERE bc.category_id = ?1",
    )
    .bind(category_id)
    .fetch_one(conn)
    .await?;
    Ok(total)
}

pub async fn category_ids(conn: &mut SqliteConnection, book_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT category_id FROM book_categories WHERE book_id = ?1 ORDER BY category_id",
    )
    .bind(book_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn insert(conn: &mut SqliteConnection, book: &NewBook<'_>) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO books (title, author, isbn, price, description, cover_image)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id",
    )
    .bind(book.title)
    .bind(book.author)
    .bind(book.isbn)
    .bind(book.price.to_string())
    .bind(book.description)
    .bind(book.cover_image)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Returns false when the book does not exist or is soft-deleted.
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    book: &NewBook<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE books
         SET title = ?2, author = ?3, isbn = ?4, price = ?5, description = ?6, cover_image = ?7
         WHERE id = ?1 AND is_deleted = 0",
    )
    .bind(id)
    .bind(book.title)
    .bind(book.author)
    .bind(book.isbn)
    .bind(book.price.to_string())
    .bind(book.description)
    .bind(book.cover_image)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Replace the category assignments of a book.
pub async fn set_categories(
    conn: &mut SqliteConnection,
    book_id: i64,
    category_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM book_categories WHERE book_id = ?1")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    for category_id in category_ids {
        sqlx::query("INSERT INTO book_categories (book_id, category_id) VALUES (?1, ?2)")
            .bind(book_id)
            .bind(*category_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Returns false when the book does not exist or is already deleted.
pub async fn soft_delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE books SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
