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

/// Category taxonomy
pub struct CategoriesModule {
    state: AppState,
}

impl CategoriesModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for CategoriesModule {
    fn name(&self) -> &'static str {
        "categories"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "categories module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let tag = "Categories";
        let page = json!({
            "type": "object",
            "properties": {
                "items": array_of("Category"),
                "page": { "type": "integer" },
                "size": { "type": "integer" },
                "total": { "type": "integer" }
            }
        });
        let book_page = json!({
            "type": "object",
            "properties": {
                "items": array_of("BookSummary"),
                "page": { "type": "integer" },
                "size": { "type": "integer" },
                "total": { "type": "integer" }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": operation("List categories", tag, true, None, &[
                        ("200", json_response("Page of categories", page)),
                    ]),
                    "post": operation("Create category", tag, true, Some("CategoryRequest"), &[
                        ("201", json_response("Created", schema_ref("Category"))),
                        ("400", error_response("Validation error")),
                        ("403", error_response("Admin role required")),
                    ])
                },
                "/{id}": {
                    "get": operation("Get category", tag, true, None, &[
                        ("200", json_response("Category", schema_ref("Category"))),
                        ("404", error_response("Not found")),
                    ]),
                    "put": operation("Update category", tag, true, Some("CategoryRequest"), &[
                        ("200", json_response("Updated", schema_ref("Category"))),
                        ("404", error_response("Not found")),
                    ]),
                    "delete": operation("Delete category", tag, true, None, &[
                        ("204", empty_response("Deleted")),
                        ("404", error_response("Not found")),
                    ])
                },
                "/{id}/books": {
                    "get": operation("List books in category", tag, true, None, &[
                        ("200", json_response("Page of books", book_page)),
                    ])
                }
            },
            "components": {
                "schemas": {
                    "Category": object_schema(&[
                        ("id", json!({ "type": "integer", "format": "int64" })),
                        ("name", json!({ "type": "string" })),
                        ("description", json!({ "type": "string", "nullable": true })),
                    ], &["id", "name"]),
                    "CategoryRequest": object_schema(&[
                        ("name", json!({ "type": "string" })),
                        ("description", json!({ "type": "string", "nullable": true })),
                    ], &["name"])
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE categories (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    name        TEXT NOT NULL CHECK (trim(name) <> ''),
                    description TEXT
                );
                "#,
        }]
    }
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(CategoriesModule::new(state))
}
