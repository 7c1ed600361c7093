use bookshop_db::DbPool;
use sqlx::SqliteConnection;

use super::models::{CartDto, CartRow, MAX_LINE_QUANTITY};
use super::repository;
use crate::error::{ShopError, ShopResult};
use crate::modules::books::{self, service::book_not_found};

/// Per-user cart mutations. Keeps one line per book per cart.
#[derive(Clone)]
pub struct CartService {
    db: DbPool,
}

impl CartService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Create the empty cart of a user. A user has at most one cart; a second
    /// call fails with a conflict.
    pub async fn create_cart_for_user(&self, user_id: i64) -> ShopResult<CartDto> {
        let mut conn = self.db.acquire().await?;
        let cart_id = repository::insert_cart(&mut conn, user_id)
            .await
            .map_err(|err| ShopError::from_write(err, "User already has a shopping cart"))?;
        tracing::info!(user_id, cart_id, "shopping cart created");
        Ok(CartDto {
            id: cart_id,
            user_id,
            cart_items: Vec::new(),
        })
    }

    pub async fn get_cart(&self, user_id: i64) -> ShopResult<CartDto> {
        let mut conn = self.db.acquire().await?;
        let cart = require_cart(&mut conn, user_id).await?;
        snapshot(&mut conn, cart).await
    }

    /// Add `quantity` copies of a book, merging into an existing line.
    pub async fn add_to_cart(&self, user_id: i64, book_id: i64, quantity: i64) -> ShopResult<CartDto> {
        ensure_quantity(quantity)?;

        let mut tx = self.db.begin().await?;
        let cart = require_cart(&mut tx, user_id).await?;
        if books::repository::find_book_by_id(&mut tx, book_id)
            .await?
            .is_none()
        {
            return Err(book_not_found(book_id));
        }

        let existing = repository::find_item_quantity(&mut tx, cart.id, book_id)
            .await?
            .unwrap_or(0);
        match existing.checked_add(quantity) {
            Some(merged) if merged <= MAX_LINE_QUANTITY => {}
            _ => return Err(quantity_out_of_range()),
        }

        let item_id = repository::upsert_item(&mut tx, cart.id, book_id, quantity).await?;
        repository::bump_version(&mut tx, cart.id).await?;
        let dto = snapshot(&mut tx, cart).await?;
        tx.commit().await?;

        tracing::info!(user_id, cart_id = cart.id, item_id, book_id, quantity, "book added to cart");
        Ok(dto)
    }

    pub async fn update_quantity(&self, user_id: i64, item_id: i64, quantity: i64) -> ShopResult<CartDto> {
        ensure_quantity(quantity)?;

        let mut tx = self.db.begin().await?;
        let cart_id = require_owned_line(&mut tx, item_id, user_id).await?;
        repository::update_quantity(&mut tx, item_id, quantity).await?;
        repository::bump_version(&mut tx, cart_id).await?;
        let cart = require_cart(&mut tx, user_id).await?;
        let dto = snapshot(&mut tx, cart).await?;
        tx.commit().await?;

        tracing::info!(user_id, item_id, quantity, "cart line quantity updated");
        Ok(dto)
    }

    /// Hard delete of a line owned by the user.
    pub async fn remove_line_item(&self, user_id: i64, item_id: i64) -> ShopResult<()> {
        let mut tx = self.db.begin().await?;
        let cart_id = require_owned_line(&mut tx, item_id, user_id).await?;
        repository::delete_line_item(&mut tx, item_id).await?;
        repository::bump_version(&mut tx, cart_id).await?;
        tx.commit().await?;

        tracing::info!(user_id, item_id, "cart line removed");
        Ok(())
    }
}

fn ensure_quantity(quantity: i64) -> ShopResult<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(quantity_out_of_range());
    }
    Ok(())
}

fn quantity_out_of_range() -> ShopError {
    ShopError::validation(
        "quantity",
        format!("quantity must be between 1 and {MAX_LINE_QUANTITY}"),
    )
}

pub(crate) async fn require_cart(conn: &mut SqliteConnection, user_id: i64) -> ShopResult<CartRow> {
    repository::find_cart_by_user_id(conn, user_id)
        .await?
        .ok_or_else(|| ShopError::not_found(format!("Can't find shopping cart of user: {user_id}")))
}

async fn require_owned_line(conn: &mut SqliteConnection, item_id: i64, user_id: i64) -> ShopResult<i64> {
    repository::find_line_item_by_id_and_user_id(conn, item_id, user_id)
        .await?
        .ok_or_else(|| ShopError::not_found(format!("Can't find cart item by id: {item_id}")))
}

async fn snapshot(conn: &mut SqliteConnection, cart: CartRow) -> ShopResult<CartDto> {
    let cart_items = repository::find_items(conn, cart.id)
        .await?
        .into_iter()
        .map(|row| row.into_dto())
        .collect::<ShopResult<Vec<_>>>()?;
    Ok(CartDto {
        id: cart.id,
        user_id: cart.user_id,
        cart_items,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn adding_same_book_merges_line() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "merge@example.com").await;
        let book = test_support::book(&state, "isbn-merge", Decimal::new(1000, 2)).await;

        let first = state.carts().add_to_cart(user.id, book.id, 2).await.unwrap();
        assert_eq!(first.cart_items.len(), 1);

        let merged = state.carts().add_to_cart(user.id, book.id, 3).await.unwrap();
        assert_eq!(merged.cart_items.len(), 1);
        assert_eq!(merged.cart_items[0].quantity, 5);
        assert_eq!(merged.cart_items[0].id, first.cart_items[0].id);
        assert_eq!(merged.cart_items[0].unit_price, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn adding_new_book_adds_one_line() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "lines@example.com").await;
        let a = test_support::book(&state, "isbn-a", Decimal::ONE).await;
        let b = test_support::book(&state, "isbn-b", Decimal::TWO).await;

        state.carts().add_to_cart(user.id, a.id, 1).await.unwrap();
        let cart = state.carts().add_to_cart(user.id, b.id, 1).await.unwrap();
        assert_eq!(cart.cart_items.len(), 2);
    }

    #[tokio::test]
    async fn unknown_book_is_not_found() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "ghost@example.com").await;

        let err = state.carts().add_to_cart(user.id, 404, 1).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "qty@example.com").await;
        let book = test_support::book(&state, "isbn-qty", Decimal::ONE).await;
        let cart = state.carts().add_to_cart(user.id, book.id, 1).await.unwrap();
        let item_id = cart.cart_items[0].id;

        let err = state.carts().update_quantity(user.id, item_id, 0).await.unwrap_err();
        assert!(matches!(err, ShopError::Validation { .. }));

        let cart = state.carts().update_quantity(user.id, item_id, 7).await.unwrap();
        assert_eq!(cart.cart_items[0].quantity, 7);
    }

    #[tokio::test]
    async fn merged_quantity_past_the_limit_is_rejected() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "bulk@example.com").await;
        let book = test_support::book(&state, "isbn-bulk", Decimal::ONE).await;
        state.carts().add_to_cart(user.id, book.id, MAX_LINE_QUANTITY).await.unwrap();

        let err = state.carts().add_to_cart(user.id, book.id, 1).await.unwrap_err();
        assert!(matches!(err, ShopError::Validation { field: "quantity", .. }));
        let err = state.carts().add_to_cart(user.id, book.id, i64::MAX).await.unwrap_err();
        assert!(matches!(err, ShopError::Validation { field: "quantity", .. }));
        let err = state.carts().update_quantity(user.id, 1, i64::MAX).await.unwrap_err();
        assert!(matches!(err, ShopError::Validation { .. }));

        let cart = state.carts().get_cart(user.id).await.unwrap();
        assert_eq!(cart.cart_items.len(), 1);
        assert_eq!(cart.cart_items[0].quantity, MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn foreign_line_item_is_not_found() {
        let state = test_support::state().await;
        let owner = test_support::user(&state, "owner@example.com").await;
        let intruder = test_support::user(&state, "intruder@example.com").await;
        let book = test_support::book(&state, "isbn-own", Decimal::ONE).await;
        let cart = state.carts().add_to_cart(owner.id, book.id, 1).await.unwrap();
        let item_id = cart.cart_items[0].id;

        let err = state.carts().remove_line_item(intruder.id, item_id).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(_)));
        let err = state.carts().remove_line_item(intruder.id, 9_999).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(_)));
        let err = state.carts().update_quantity(intruder.id, item_id, 2).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(_)));

        state.carts().remove_line_item(owner.id, item_id).await.unwrap();
        assert!(state.carts().get_cart(owner.id).await.unwrap().cart_items.is_empty());
    }

    #[tokio::test]
    async fn second_cart_for_user_is_conflict() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "twice@example.com").await;

        let err = state.carts().create_cart_for_user(user.id).await.unwrap_err();
        assert!(matches!(err, ShopError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleted_book_leaves_carts() {
        let state = test_support::state().await;
        let user = test_support::user(&state, "gone@example.com").await;
        let book = test_support::book(&state, "isbn-gone", Decimal::ONE).await;
        state.carts().add_to_cart(user.id, book.id, 2).await.unwrap();

        state.books().delete(book.id).await.unwrap();

        assert!(state.carts().get_cart(user.id).await.unwrap().cart_items.is_empty());
    }
}
