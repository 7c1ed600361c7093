pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use async_trait::async_trait;
use axum::Router;
use bookshop_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::state::AppState;
use crate::utils::openapi::{
    array_of, empty_response, error_response, json_response, object_schema, operation, schema_ref,
};

/// Shopping carts, one per user
pub struct CartModule {
    state: AppState,
}

impl CartModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for CartModule {
    fn name(&self) -> &'static str {
        "cart"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "cart module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let tag = "Shopping cart";
        let int = json!({ "type": "integer", "format": "int64" });
        let quantity = json!({ "type": "integer", "minimum": 1 });

        Some(json!({
            "paths": {
                "/": {
                    "get": operation("Get my cart", tag, true, None, &[
                        ("200", json_response("Cart", schema_ref("Cart"))),
                    ]),
                    "post": operation("Add a book to my cart", tag, true, Some("AddToCartRequest"), &[
                        ("200", json_response("Updated cart", schema_ref("Cart"))),
                        ("400", error_response("Validation error")),
                        ("404", error_response("Unknown book")),
                    ])
                },
                "/items/{id}": {
                    "put": operation("Change line quantity", tag, true, Some("UpdateQuantityRequest"), &[
                        ("200", json_response("Updated cart", schema_ref("Cart"))),
                        ("400", error_response("Validation error")),
                        ("404", error_response("Not found")),
                    ]),
                    "delete": operation("Remove line", tag, true, None, &[
                        ("204", empty_response("Removed")),
                        ("404", error_response("Not found")),
                    ])
                }
            },
            "components": {
                "schemas": {
                    "Cart": object_schema(&[
                        ("id", int.clone()),
                        ("user_id", int.clone()),
                        ("cart_items", array_of("CartItem")),
                    ], &["id", "user_id", "cart_items"]),
                    "CartItem": object_schema(&[
                        ("id", int.clone()),
                        ("book_id", int.clone()),
                        ("book_title", json!({ "type": "string" })),
                        ("unit_price", json!({ "type": "string", "format": "decimal" })),
                        ("quantity", quantity.clone()),
                    ], &["id", "book_id", "book_title", "unit_price", "quantity"]),
                    "AddToCartRequest": object_schema(&[
                        ("book_id", int.clone()),
                        ("quantity", quantity.clone()),
                    ], &["book_id", "quantity"]),
                    "UpdateQuantityRequest": object_schema(&[("quantity", quantity)], &["quantity"])
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE shopping_carts (
                    id      INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
                    version INTEGER NOT NULL DEFAULT 0
                );
                CREATE TABLE cart_items (
                    id       INTEGER PRIMARY KEY AUTOINCREMENT,
                    cart_id  INTEGER NOT NULL REFERENCES shopping_carts (id) ON DELETE CASCADE,
                    book_id  INTEGER NOT NULL REFERENCES books (id),
                    quantity INTEGER NOT NULL CHECK (quantity >= 1),
                    UNIQUE (cart_id, book_id)
                );
                "#,
        }]
    }
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(CartModule::new(state))
}
