use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::error::{ShopError, ShopResult};
use crate::utils::parse_decimal;

/// Order lifecycle. Any change except a no-op is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(OrderStatus::Pending),
            "COMPLETED" => Some(OrderStatus::Completed),
            "DELIVERED" => Some(OrderStatus::Delivered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub order_date: OffsetDateTime,
    pub shipping_address: String,
    pub order_items: Vec<OrderItemDto>,
}

/// Immutable line of a placed order. `price` is unit price times quantity
/// at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDto {
    pub id: i64,
    pub book_id: i64,
    pub quantity: i64,
    pub price: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub total: String,
    pub order_date: OffsetDateTime,
    pub shipping_address: String,
}

impl OrderRow {
    pub fn status(&self) -> ShopResult<OrderStatus> {
        OrderStatus::parse(&self.status).ok_or_else(|| {
            ShopError::Internal(anyhow::anyhow!("unknown order status in storage: {}", self.status))
        })
    }

    pub fn into_dto(self, order_items: Vec<OrderItemDto>) -> ShopResult<OrderDto> {
        Ok(OrderDto {
            status: self.status()?,
            total: parse_decimal("orders.total", &self.total)?,
            id: self.id,
            user_id: self.user_id,
            order_date: self.order_date,
            shipping_address: self.shipping_address,
            order_items,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub book_id: i64,
    pub quantity: i64,
    pub price: String,
}

impl OrderItemRow {
    pub fn into_dto(self) -> ShopResult<OrderItemDto> {
        Ok(OrderItemDto {
            price: parse_decimal("order_items.price", &self.price)?,
            id: self.id,
            book_id: self.book_id,
            quantity: self.quantity,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(custom(function = "crate::utils::not_blank"))]
    pub shipping_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}
