pub mod locks;
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

/// Order placement and tracking
pub struct OrdersModule {
    state: AppState,
}

impl OrdersModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for OrdersModule {
    fn name(&self) -> &'static str {
        "orders"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "orders module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let tag = "Orders";
        let int = json!({ "type": "integer", "format": "int64" });
        let decimal = json!({ "type": "string", "format": "decimal" });
        let status = json!({ "type": "string", "enum": ["PENDING", "COMPLETED", "DELIVERED"] });
        let page = json!({
            "type": "object",
            "properties": {
                "items": array_of("Order"),
                "page": { "type": "integer" },
                "size": { "type": "integer" },
                "total": { "type": "integer" }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "post": operation("Place an order from my cart", tag, true, Some("PlaceOrderRequest"), &[
                        ("201", json_response("Order placed", schema_ref("Order"))),
                        ("400", error_response("Validation error")),
                        ("409", error_response("Empty cart or cart changed concurrently")),
                    ]),
                    "get": operation("List my orders", tag, true, None, &[
                        ("200", json_response("Page of orders", page)),
                    ])
                },
                "/{id}": {
                    "patch": operation("Change order status", tag, true, Some("StatusUpdateRequest"), &[
                        ("200", json_response("Updated order", schema_ref("Order"))),
                        ("404", error_response("Not found")),
                        ("409", error_response("Order already has this status")),
                    ]),
                    "delete": operation("Delete order", tag, true, None, &[
                        ("204", empty_response("Deleted")),
                        ("404", error_response("Not found")),
                    ])
                },
                "/{id}/items": {
                    "get": operation("List order lines", tag, true, None, &[
                        ("200", json_response("Order lines", array_of("OrderItem"))),
                        ("404", error_response("Not found")),
                    ])
                },
                "/{id}/items/{item_id}": {
                    "get": operation("Get order line", tag, true, None, &[
                        ("200", json_response("Order line", schema_ref("OrderItem"))),
                        ("404", error_response("Not found")),
                    ])
                }
            },
            "components": {
                "schemas": {
                    "Order": object_schema(&[
                        ("id", int.clone()),
                        ("user_id", int.clone()),
                        ("status", status.clone()),
                        ("total", decimal.clone()),
                        ("order_date", json!({ "type": "string", "format": "date-time" })),
                        ("shipping_address", json!({ "type": "string" })),
                        ("order_items", array_of("OrderItem")),
                    ], &["id", "user_id", "status", "total", "order_date", "shipping_address", "order_items"]),
                    "OrderItem": object_schema(&[
                        ("id", int.clone()),
                        ("book_id", int.clone()),
                        ("quantity", json!({ "type": "integer", "minimum": 1 })),
                        ("price", decimal),
                    ], &["id", "book_id", "quantity", "price"]),
                    "PlaceOrderRequest": object_schema(
                        &[("shipping_address", json!({ "type": "string" }))],
                        &["shipping_address"],
                    ),
                    "StatusUpdateRequest": object_schema(&[("status", status)], &["status"])
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE orders (
                    id               INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id          INTEGER NOT NULL REFERENCES users (id),
                    status           TEXT NOT NULL CHECK (status IN ('PENDING', 'COMPLETED', 'DELIVERED')),
                    total            TEXT NOT NULL,
                    order_date       TEXT NOT NULL,
                    shipping_address TEXT NOT NULL CHECK (trim(shipping_address) <> ''),
                    is_deleted       INTEGER NOT NULL DEFAULT 0
                );
                CREATE INDEX orders_user ON orders (user_id);
                CREATE VIEW live_orders AS
                    SELECT * FROM orders WHERE is_deleted = 0;
                CREATE TABLE order_items (
                    id       INTEGER PRIMARY KEY AUTOINCREMENT,
                    order_id INTEGER NOT NULL REFERENCES orders (id),
                    book_id  INTEGER NOT NULL,
                    quantity INTEGER NOT NULL CHECK (quantity >= 1),
                    price    TEXT NOT NULL
                );
                CREATE INDEX order_items_order ON order_items (order_id);
                "#,
        }]
    }
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(OrdersModule::new(state))
}
