//! Cart store. Every mutation of a cart's lines bumps `shopping_carts.version`
//! so order placement can detect a cart that changed underneath it.

use sqlx::SqliteConnection;

use super::models::{CartItemRow, CartRow};

pub async fn insert_cart(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO shopping_carts (user_id) VALUES (?1) RETURNING id")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
    Ok(id)
}

pub async fn find_cart_by_user_id(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<CartRow>, sqlx::Error> {
    sqlx::query_as("SELECT id, user_id, version FROM shopping_carts WHERE user_id = ?1")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

/// Lines of a cart with their live book resolved.
pub async fn find_items(
    conn: &mut SqliteConnection,
    cart_id: i64,
) -> Result<Vec<CartItemRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT ci.id, ci.book_id, b.title AS book_title, b.price AS unit_price, ci.quantity
         FROM cart_items ci
         JOIN live_books b ON b.id = ci.book_id
         WHERE ci.cart_id = ?1
         ORDER BY ci.id",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await
}

/// Add a line, merging into the existing line for the same book.
pub async fn upsert_item(
    conn: &mut SqliteConnection,
    cart_id: i64,
    book_id: i64,
    quantity: i64,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO cart_items (cart_id, book_id, quantity) VALUES (?1, ?2, ?3)
         ON CONFLICT (cart_id, book_id) DO UPDATE SET quantity = quantity + excluded.quantity
         RETURNING id",
    )
    .bind(cart_id)
    .bind(book_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Quantity of the line holding `book_id`, if the cart has one.
pub async fn find_item_quantity(
    conn: &mut SqliteConnection,
    cart_id: i64,
    book_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE cart_id = ?1 AND book_id = ?2")
            .bind(cart_id)
            .bind(book_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(quantity,)| quantity))
}

/// Cart id of a line, provided the line sits in a cart owned by `user_id`.
pub async fn find_line_item_by_id_and_user_id(
    conn: &mut SqliteConnection,
    item_id: i64,
    user_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT ci.cart_id FROM cart_items ci
         JOIN shopping_carts sc ON sc.id = ci.cart_id
         WHERE ci.id = ?1 AND sc.user_id = ?2",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(cart_id,)| cart_id))
}

pub async fn update_quantity(
    conn: &mut SqliteConnection,
    item_id: i64,
    quantity: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE cart_items SET quantity = ?2 WHERE id = ?1")
        .bind(item_id)
        .bind(quantity)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_line_item(conn: &mut SqliteConnection, item_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cart_items WHERE id = ?1")
        .bind(item_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn clear_items(conn: &mut SqliteConnection, cart_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn bump_version(conn: &mut SqliteConnection, cart_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE shopping_carts SET version = version + 1 WHERE id = ?1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Bump the version only if it still equals `expected`. Returns false when
/// the cart changed since it was read.
pub async fn compare_and_bump_version(
    conn: &mut SqliteConnection,
    cart_id: i64,
    expected: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE shopping_carts SET version = version + 1 WHERE id = ?1 AND version = ?2",
    )
    .bind(cart_id)
    .bind(expected)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Drop a book from every cart holding it.
pub async fn remove_book_from_carts(
    conn: &mut SqliteConnection,
    book_id: i64,
) -> Result<u64, sqlx::Error> {
    sqlx::query(
        "UPDATE shopping_carts SET version = version + 1
         WHERE id IN (SELECT cart_id FROM cart_items WHERE book_id = ?1)",
    )
    .bind(book_id)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query("DELETE FROM cart_items WHERE book_id = ?1")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
