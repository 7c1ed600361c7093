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

/// Book catalog
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let tag = "Books";
        let page = json!({
            "type": "object",
            "properties": {
                "items": array_of("Book"),
                "page": { "type": "integer" },
                "size": { "type": "integer" },
                "total": { "type": "integer" }
            }
        });
        let book_fields = [
            ("title", json!({ "type": "string" })),
            ("author", json!({ "type": "string" })),
            ("isbn", json!({ "type": "string" })),
            ("price", json!({ "type": "string", "format": "decimal", "example": "19.99" })),
            ("description", json!({ "type": "string", "nullable": true })),
            ("cover_image", json!({ "type": "string", "nullable": true })),
        ];
        let ids = json!({ "type": "array", "items": { "type": "integer", "format": "int64" } });

        let mut book = vec![("id", json!({ "type": "integer", "format": "int64" }))];
        book.extend(book_fields.iter().cloned());
        let summary = book.clone();
        book.push(("category_ids", ids.clone()));

        let mut request = book_fields.to_vec();
        request.push(("category_ids", ids));

        Some(json!({
            "paths": {
                "/": {
                    "get": operation("List books", tag, true, None, &[
                        ("200", json_response("Page of books", page)),
                        ("401", error_response("Missing or invalid token")),
                    ]),
                    "post": operation("Create book", tag, true, Some("BookRequest"), &[
                        ("201", json_response("Created", schema_ref("Book"))),
                        ("400", error_response("Validation error")),
                        ("403", error_response("Admin role required")),
                        ("404", error_response("Unknown category")),
                        ("409", error_response("Duplicate isbn")),
                    ])
                },
                "/{id}": {
                    "get": operation("Get book", tag, true, None, &[
                        ("200", json_response("Book", schema_ref("Book"))),
                        ("404", error_response("Not found")),
                    ]),
                    "put": operation("Update book", tag, true, Some("BookRequest"), &[
                        ("200", json_response("Updated", schema_ref("Book"))),
                        ("404", error_response("Not found")),
                    ]),
                    "delete": operation("Delete book", tag, true, None, &[
                        ("204", empty_response("Deleted")),
                        ("404", error_response("Not found")),
                    ])
                }
            },
            "components": {
                "schemas": {
                    "Book": object_schema(&book, &["id", "title", "author", "isbn", "price", "category_ids"]),
                    "BookSummary": object_schema(&summary, &["id", "title", "author", "isbn", "price"]),
                    "BookRequest": object_schema(&request, &["title", "author", "isbn", "price"])
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE books (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    title       TEXT NOT NULL CHECK (trim(title) <> ''),
                    author      TEXT NOT NULL CHECK (trim(author) <> ''),
                    isbn        TEXT NOT NULL UNIQUE CHECK (trim(isbn) <> ''),
                    price       TEXT NOT NULL,
                    description TEXT,
                    cover_image TEXT,
                    is_deleted  INTEGER NOT NULL DEFAULT 0
                );
                CREATE VIEW live_books AS
                    SELECT * FROM books WHERE is_deleted = 0;
                CREATE TABLE book_categories (
                    book_id     INTEGER NOT NULL REFERENCES books (id) ON DELETE CASCADE,
                    category_id INTEGER NOT NULL REFERENCES categories (id) ON DELETE CASCADE,
                    PRIMARY KEY (book_id, category_id)
                );
                CREATE INDEX book_categories_category ON book_categories (category_id);
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
