use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ShopResult;
use crate::utils::parse_decimal;

/// Snapshot of a user's cart as shown to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartDto {
    pub id: i64,
    pub user_id: i64,
    pub cart_items: Vec<CartItemDto>,
}

/// Cart line with the book resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemDto {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct CartRow {
    pub id: i64,
    pub user_id: i64,
    pub version: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemRow {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub unit_price: String,
    pub quantity: i64,
}

impl CartItemRow {
    pub fn into_dto(self) -> ShopResult<CartItemDto> {
        Ok(CartItemDto {
            unit_price: parse_decimal("books.price", &self.unit_price)?,
            id: self.id,
            book_id: self.book_id,
            book_title: self.book_title,
            quantity: self.quantity,
        })
    }
}

/// Largest quantity a single cart line may hold. Keep in sync with the
/// `range` bounds on the request types below.
pub const MAX_LINE_QUANTITY: i64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub book_id: i64,
    #[validate(range(min = 1, max = 10000, message = "quantity must be between 1 and 10000"))]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, max = 10000, message = "quantity must be between 1 and 10000"))]
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(UpdateQuantityRequest { quantity: 0 }.validate().is_err());
        assert!(AddToCartRequest { book_id: 1, quantity: -3 }.validate().is_err());
        assert!(AddToCartRequest { book_id: 1, quantity: 1 }.validate().is_ok());
    }

    #[test]
    fn quantity_has_an_upper_bound() {
        let at_limit = AddToCartRequest { book_id: 1, quantity: MAX_LINE_QUANTITY };
        assert!(at_limit.validate().is_ok());
        let over = AddToCartRequest { book_id: 1, quantity: MAX_LINE_QUANTITY + 1 };
        assert!(over.validate().is_err());
        assert!(UpdateQuantityRequest { quantity: i64::MAX }.validate().is_err());
    }
}
