//! Order store. Reads go through the `live_orders` view, which hides
//! soft-deleted orders.

use bookshop_http::Pageable;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use time::OffsetDateTime;

use super::models::{OrderItemRow, OrderRow, OrderStatus};

const ORDER_COLUMNS: &str = "id, user_id, status, total, order_date, shipping_address";

pub struct NewOrder<'a> {
    pub user_id: i64,
    pub status: OrderStatus,
    pub total: Decimal,
    pub order_date: OffsetDateTime,
    pub shipping_address: &'a str,
    pub items: &'a [NewOrderItem],
}

pub struct NewOrderItem {
    pub book_id: i64,
    pub quantity: i64,
    pub price: Decimal,
}

/// Insert an order together with its lines. Returns the order id.
pub async fn save_order(conn: &mut SqliteConnection, order: &NewOrder<'_>) -> Result<i64, sqlx::Error> {
    let (order_id,): (i64,) = sqlx::query_as(
        "INSERT INTO orders (user_id, status, total, order_date, shipping_address)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id",
    )
    .bind(order.user_id)
    .bind(order.status.as_str())
    .bind(order.total.to_string())
    .bind(order.order_date)
    .bind(order.shipping_address)
    .fetch_one(&mut *conn)
    .await?;

    for item in order.items {
        sqlx::query(
            "INSERT INTO order_items (order_id, book_id, quantity, price) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(order_id)
        .bind(item.book_id)
        .bind(item.quantity)
        .bind(item.price.to_string())
        .execute(&mut *conn)
        .await?;
    }

    Ok(order_id)
}

pub async fn find_orders_by_user_id(
    conn: &mut SqliteConnection,
    user_id: i64,
    pageable: Pageable,
) -> Result<Vec<OrderRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM live_orders WHERE user_id = ?1
         ORDER BY id DESC LIMIT ?2 OFFSET ?3"
    ))
    .bind(user_id)
    .bind(pageable.limit())
    .bind(pageable.offset())
    .fetch_all(conn)
    .await
}

pub async fn count_by_user_id(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM live_orders WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(total)
}

pub async fn find_order_by_id_and_user_id(
    conn: &mut SqliteConnection,
    order_id: i64,
    user_id: i64,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM live_orders WHERE id = ?1 AND user_id = ?2"
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn find_line_items_by_order_id(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> Result<Vec<OrderItemRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, book_id, quantity, price FROM order_items WHERE order_id = ?1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

pub async fn find_line_item_by_id_and_order_id(
    conn: &mut SqliteConnection,
    item_id: i64,
    order_id: i64,
) -> Result<Option<OrderItemRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, book_id, quantity, price FROM order_items WHERE id = ?1 AND order_id = ?2",
    )
    .bind(item_id)
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1 AND is_deleted = 0")
        .bind(order_id)
        .bind(status.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

/// Returns false when the user has no such live order.
pub async fn soft_delete(
    conn: &mut SqliteConnection,
    order_id: i64,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET is_deleted = 1 WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0",
    )
    .bind(order_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
