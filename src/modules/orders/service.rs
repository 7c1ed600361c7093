use bookshop_db::DbPool;
use bookshop_http::{Page, Pageable};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use time::OffsetDateTime;

use super::locks::PlacementLocks;
use super::models::{OrderDto, OrderItemDto, OrderRow, OrderStatus};
use super::repository::{self, NewOrder, NewOrderItem};
use crate::error::{ShopError, ShopResult};
use crate::modules::cart::{self, models::CartRow, service::require_cart};

/// A priced cart, not yet written.
struct OrderDraft {
    cart: CartRow,
    items: Vec<NewOrderItem>,
    total: Decimal,
}

/// Order placement, status changes and order reads.
#[derive(Clone)]
pub struct OrderService {
    db: DbPool,
    locks: PlacementLocks,
}

impl OrderService {
    pub fn new(db: DbPool, locks: PlacementLocks) -> Self {
        Self { db, locks }
    }

    /// Turn the user's cart into a PENDING order and empty the cart.
    ///
    /// Line prices are taken from the catalog now and never recomputed. The
    /// order insert and the cart clearing commit together or not at all.
    /// Placements for one user run one at a time, and the cart version must
    /// still match what was read or the placement is rejected.
    pub async fn place_order(&self, user_id: i64, shipping_address: &str) -> ShopResult<OrderDto> {
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(ShopError::validation("shipping_address", "must not be blank"));
        }

        let _guard = self.locks.acquire(user_id).await;
        let draft = self.draft_order(user_id).await?;
        self.commit_order(user_id, shipping_address, draft).await
    }

    /// Read the cart and price its lines at current catalog prices.
    async fn draft_order(&self, user_id: i64) -> ShopResult<OrderDraft> {
        let (cart, lines) = {
            let mut conn = self.db.acquire().await?;
            let cart = require_cart(&mut conn, user_id).await?;
            let lines = cart::repository::find_items(&mut conn, cart.id)
                .await?
                .into_iter()
                .map(|row| row.into_dto())
                .collect::<ShopResult<Vec<_>>>()?;
            (cart, lines)
        };

        if lines.is_empty() {
            tracing::info!(user_id, "order rejected: cart is empty");
            return Err(ShopError::conflict("Cannot place an empty order"));
        }

        let items = lines
            .iter()
            .map(|line| {
                let price = line
                    .unit_price
                    .checked_mul(Decimal::from(line.quantity))
                    .ok_or_else(|| total_out_of_range(user_id))?;
                Ok(NewOrderItem {
                    book_id: line.book_id,
                    quantity: line.quantity,
                    price,
                })
            })
            .collect::<ShopResult<Vec<_>>>()?;
        let total = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.price))
            .ok_or_else(|| total_out_of_range(user_id))?;

        Ok(OrderDraft { cart, items, total })
    }

    /// Write the order and clear the cart, provided the cart is still the
    /// one the draft was priced from.
    async fn commit_order(
        &self,
        user_id: i64,
        shipping_address: &str,
        draft: OrderDraft,
    ) -> ShopResult<OrderDto> {
        let OrderDraft { cart, items, total } = draft;

        let mut tx = self.db.begin().await?;
        if !cart::repository::compare_and_bump_version(&mut tx, cart.id, cart.version).await? {
            tracing::warn!(user_id, cart_id = cart.id, "order rejected: cart changed during placement");
            return Err(ShopError::conflict("Shopping cart changed while placing the order"));
        }

        let order_id = repository::save_order(
            &mut tx,
            &NewOrder {
                user_id,
                status: OrderStatus::Pending,
                total,
                order_date: OffsetDateTime::now_utc(),
                shipping_address,
                items: &items,
            },
        )
        .await?;
        let cleared = cart::repository::clear_items(&mut tx, cart.id).await?;
        let order = load_order(&mut tx, order_id, user_id).await?;
        tx.commit().await?;

        tracing::info!(user_id, order_id, %total, lines = cleared, "order placed");
        Ok(order)
    }

    /// Move an order to another status. Setting the current status again is
    /// rejected.
    pub async fn update_status(
        &self,
        user_id: i64,
        order_id: i64,
        status: OrderStatus,
    ) -> ShopResult<OrderDto> {
        let mut tx = self.db.begin().await?;
        let current = require_order(&mut tx, order_id, user_id).await?.status()?;
        if current == status {
            return Err(ShopError::conflict(format!(
                "Order already has status {}",
                status.as_str()
            )));
        }

        repository::update_status(&mut tx, order_id, status).await?;
        let order = load_order(&mut tx, order_id, user_id).await?;
        tx.commit().await?;

        tracing::info!(user_id, order_id, from = current.as_str(), to = status.as_str(), "order status changed");
        Ok(order)
    }

    pub async fn get_orders(&self, user_id: i64, pageable: Pageable) -> ShopResult<Page<OrderDto>> {
        let mut conn = self.db.acquire().await?;
        let rows = repository::find_orders_by_user_id(&mut conn, user_id, pageable).await?;
        let total = repository::count_by_user_id(&mut conn, user_id).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = line_items(&mut conn, row.id).await?;
            orders.push(row.into_dto(items)?);
        }
        Ok(Page::new(orders, pageable, total))
    }

    pub async fn get_order_line_items(&self, user_id: i64, order_id: i64) -> ShopResult<Vec<OrderItemDto>> {
        let mut conn = self.db.acquire().await?;
        require_order(&mut conn, order_id, user_id).await?;
        line_items(&mut conn, order_id).await
    }

    /// A line of an order, checked against both the order and its owner.
    pub async fn get_order_line_item(
        &self,
        user_id: i64,
        order_id: i64,
        item_id: i64,
    ) -> ShopResult<OrderItemDto> {
        let mut conn = self.db.acquire().await?;
        require_order(&mut conn, order_id, user_id).await?;
        repository::find_line_item_by_id_and_order_id(&mut conn, item_id, order_id)
            .await?
            .ok_or_else(|| {
                ShopError::not_found(format!("Can't find item {item_id} in order {order_id}"))
            })?
            .into_dto()
    }

    /// Soft delete; the order disappears from every read.
    pub async fn delete_order(&self, user_id: i64, order_id: i64) -> ShopResult<()> {
        let mut conn = self.db.acquire().await?;
        if !repository::soft_delete(&mut conn, order_id, user_id).await? {
            return Err(order_not_found(order_id));
        }
        tracing::info!(user_id, order_id, "order deleted");
        Ok(())
    }
}

async fn require_order(conn: &mut SqliteConnection, order_id: i64, user_id: i64) -> ShopResult<OrderRow> {
    repository::find_order_by_id_and_user_id(conn, order_id, user_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))
}

async fn line_items(conn: &mut SqliteConnection, order_id: i64) -> ShopResult<Vec<OrderItemDto>> {
    repository::find_line_items_by_order_id(conn, order_id)
        .await?
        .into_iter()
        .map(|row| row.into_dto())
        .collect()
}

async fn load_order(conn: &mut SqliteConnection, order_id: i64, user_id: i64) -> ShopResult<OrderDto> {
    let row = require_order(conn, order_id, user_id).await?;
    let items = line_items(conn, order_id).await?;
    row.into_dto(items)
}

fn total_out_of_range(user_id: i64) -> ShopError {
    tracing::info!(user_id, "order rejected: total out of range");
    ShopError::validation("quantity", "order total is out of range")
}

fn order_not_found(order_id: i64) -> ShopError {
    ShopError::not_found(format!("Can't find order by id: {order_id}"))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::modules::books::models::BookRequest;
    use crate::test_support;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[tokio::test]
    async fn placement_snapshots_prices_and_empties_cart() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "buyer@example.com").await;
        let a = test_support::book(&state, "isbn-a", dec("10.00")).await;
        let b = test_support::book(&state, "isbn-b", dec("5.00")).await;
        state.carts().add_to_cart(user.id, a.id, 2).await.unwrap();
        state.carts().add_to_cart(user.id, b.id, 1).await.unwrap();

        let order = state.orders().place_order(user.id, " 1 Main St ").await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.shipping_address, "1 Main St");
        assert_eq!(order.total, dec("25.00"));
        let prices: Vec<_> = order.order_items.iter().map(|i| i.price).collect();
        assert_eq!(prices, vec![dec("20.00"), dec("5.00")]);
        assert!(state.carts().get_cart(user.id).await.unwrap().cart_items.is_empty());
    }

    #[tokio::test]
    async fn catalog_price_change_does_not_touch_placed_order() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "snapshot@example.com").await;
        let book = test_support::book(&state, "isbn-snap", dec("10.00")).await;
        state.carts().add_to_cart(user.id, book.id, 2).await.unwrap();
        let order = state.orders().place_order(user.id, "Elm St 2").await.unwrap();

        state
            .books()
            .update(
                book.id,
                BookRequest {
                    title: book.title.clone(),
                    author: book.author.clone(),
                    isbn: book.isbn.clone(),
                    price: dec("99.99"),
                    description: None,
                    cover_image: None,
                    category_ids: vec![],
                },
            )
            .await
            .unwrap();

        let items = state.orders().get_order_line_items(user.id, order.id).await.unwrap();
        assert_eq!(items[0].price, dec("20.00"));
        let page = state.orders().get_orders(user.id, Pageable::default()).await.unwrap();
        assert_eq!(page.items[0].total, dec("20.00"));
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_creating_orders() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "empty@example.com").await;

        let err = state.orders().place_order(user.id, "Main St").await.unwrap_err();
        assert!(matches!(err, ShopError::Conflict(_)));
        assert_eq!(state.orders().get_orders(user.id, Pageable::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn overflowing_total_is_rejected_without_panicking() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "whale@example.com").await;
        let dear = test_support::book(&state, "isbn-dear", Decimal::MAX).await;
        let also_dear = test_support::book(&state, "isbn-also-dear", Decimal::MAX).await;

        // Line price overflows.
        state.carts().add_to_cart(user.id, dear.id, 2).await.unwrap();
        let err = state.orders().place_order(user.id, "Main St").await.unwrap_err();
        assert!(matches!(err, ShopError::Validation { field: "quantity", .. }));

        // Each line fits, their sum does not.
        let cart = state.carts().get_cart(user.id).await.unwrap();
        state.carts().update_quantity(user.id, cart.cart_items[0].id, 1).await.unwrap();
        state.carts().add_to_cart(user.id, also_dear.id, 1).await.unwrap();
        let err = state.orders().place_order(user.id, "Main St").await.unwrap_err();
        assert!(matches!(err, ShopError::Validation { field: "quantity", .. }));

        assert_eq!(state.orders().get_orders(user.id, Pageable::default()).await.unwrap().total, 0);
        assert_eq!(state.carts().get_cart(user.id).await.unwrap().cart_items.len(), 2);
    }

    #[tokio::test]
    async fn cart_changed_after_pricing_is_a_conflict() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "moving@example.com").await;
        let book = test_support::book(&state, "isbn-moving", dec("4.00")).await;
        state.carts().add_to_cart(user.id, book.id, 1).await.unwrap();

        let orders = state.orders();
        let draft = orders.draft_order(user.id).await.unwrap();
        assert_eq!(draft.total, dec("4.00"));
        state.carts().add_to_cart(user.id, book.id, 2).await.unwrap();

        let err = orders.commit_order(user.id, "Main St", draft).await.unwrap_err();
        assert!(matches!(err, ShopError::Conflict(_)));
        assert_eq!(orders.get_orders(user.id, Pageable::default()).await.unwrap().total, 0);
        let cart = state.carts().get_cart(user.id).await.unwrap();
        assert_eq!(cart.cart_items.len(), 1);
        assert_eq!(cart.cart_items[0].quantity, 3);

        // A fresh placement sees the new cart.
        let order = orders.place_order(user.id, "Main St").await.unwrap();
        assert_eq!(order.total, dec("12.00"));
    }

    #[tokio::test]
    async fn status_changes_and_rejects_no_op() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "status@example.com").await;
        let book = test_support::book(&state, "isbn-status", Decimal::ONE).await;
        state.carts().add_to_cart(user.id, book.id, 1).await.unwrap();
        let order = state.orders().place_order(user.id, "Main St").await.unwrap();

        let err = state
            .orders()
            .update_status(user.id, order.id, OrderStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::Conflict(_)));

        let updated = state
            .orders()
            .update_status(user.id, order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Delivered);

        // No forward-only rule.
        let back = state
            .orders()
            .update_status(user.id, order.id, OrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(back.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn orders_are_private_to_their_owner() {
        let state = test_support::state().await;
        let owner = test_support::user(&state, "mine@example.com").await;
        let other = test_support::user(&state, "yours@example.com").await;
        let book = test_support::book(&state, "isbn-private", Decimal::ONE).await;
        state.carts().add_to_cart(owner.id, book.id, 1).await.unwrap();
        let order = state.orders().place_order(owner.id, "Main St").await.unwrap();
        let item_id = order.order_items[0].id;

        assert!(matches!(
            state.orders().update_status(other.id, order.id, OrderStatus::Completed).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(matches!(
            state.orders().get_order_line_item(other.id, order.id, item_id).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(matches!(
            state.orders().get_order_line_item(owner.id, order.id + 1, item_id).await,
            Err(ShopError::NotFound(_))
        ));
        let item = state.orders().get_order_line_item(owner.id, order.id, item_id).await.unwrap();
        assert_eq!(item.book_id, book.id);
    }

    #[tokio::test]
    async fn deleted_order_disappears() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "delete@example.com").await;
        let book = test_support::book(&state, "isbn-delete", Decimal::ONE).await;
        state.carts().add_to_cart(user.id, book.id, 1).await.unwrap();
        let order = state.orders().place_order(user.id, "Main St").await.unwrap();

        state.orders().delete_order(user.id, order.id).await.unwrap();

        assert_eq!(state.orders().get_orders(user.id, Pageable::default()).await.unwrap().total, 0);
        assert!(matches!(
            state.orders().get_order_line_items(user.id, order.id).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(matches!(
            state.orders().delete_order(user.id, order.id).await,
            Err(ShopError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_placements_yield_one_order() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "race@example.com").await;
        let book = test_support::book(&state, "isbn-race", dec("3.50")).await;
        state.carts().add_to_cart(user.id, book.id, 2).await.unwrap();

        let user_id = user.id;
        let attempts: Vec<_> = (0..10)
            .map(|_| {
                let orders = state.orders();
                tokio::spawn(async move { orders.place_order(user_id, "Main St").await })
            })
            .collect();

        let mut placed = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => placed += 1,
                Err(err) => assert!(matches!(err, ShopError::Conflict(_))),
            }
        }

        assert_eq!(placed, 1);
        let page = state.orders().get_orders(user.id, Pageable::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].total, dec("7.00"));
    }
}
