use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ShopResult;
use crate::utils::parse_decimal;

/// Catalog book with its category ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub category_ids: Vec<i64>,
}

/// Catalog book without category ids, used for per-category listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

impl BookSummary {
    pub fn with_categories(self, category_ids: Vec<i64>) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            price: self.price,
            description: self.description,
            cover_image: self.cover_image,
            category_ids,
        }
    }
}

/// Row of the `live_books` view; price is stored as TEXT.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub price: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

impl BookRow {
    pub fn into_summary(self) -> ShopResult<BookSummary> {
        Ok(BookSummary {
            price: parse_decimal("books.price", &self.price)?,
            id: self.id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            description: self.description,
            cover_image: self.cover_image,
        })
    }
}

/// Create or update payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookRequest {
    #[validate(custom(function = "crate::utils::not_blank"))]
    pub title: String,
    #[validate(custom(function = "crate::utils::not_blank"))]
    pub author: String,
    #[validate(custom(function = "crate::utils::not_blank"))]
    pub isbn: String,
    #[validate(custom(function = "crate::utils::price_in_range"))]
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}
