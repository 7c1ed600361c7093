pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use async_trait::async_trait;
use axum::Router;
use bookshop_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::state::AppState;
use crate::utils::openapi::{error_response, json_response, object_schema, operation, schema_ref};

/// User accounts, registration and login
pub struct AuthModule {
    state: AppState,
}

impl AuthModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            token_ttl_minutes = ctx.settings.auth.token_ttl_minutes,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let string = json!({ "type": "string" });
        Some(json!({
            "paths": {
                "/registration": {
                    "post": operation(
                        "Register a new user",
                        "Authentication",
                        false,
                        Some("RegisterRequest"),
                        &[
                            ("201", json_response("User created", schema_ref("User"))),
                            ("400", error_response("Validation error")),
                            ("409", error_response("Email already registered")),
                        ],
                    )
                },
                "/login": {
                    "post": operation(
                        "Login and receive a JWT",
                        "Authentication",
                        false,
                        Some("LoginRequest"),
                        &[
                            ("200", json_response("Token issued", schema_ref("LoginResponse"))),
                            ("401", error_response("Invalid credentials")),
                        ],
                    )
                }
            },
            "components": {
                "schemas": {
                    "RegisterRequest": object_schema(
                        &[
                            ("email", json!({ "type": "string", "format": "email" })),
                            ("password", json!({ "type": "string", "minLength": 6, "maxLength": 30 })),
                            ("confirm_password", json!({ "type": "string", "minLength": 6, "maxLength": 30 })),
                            ("first_name", string.clone()),
                            ("last_name", string.clone()),
                            ("shipping_address", json!({ "type": "string", "nullable": true })),
                        ],
                        &["email", "password", "confirm_password", "first_name", "last_name"],
                    ),
                    "LoginRequest": object_schema(
                        &[
                            ("email", json!({ "type": "string", "format": "email" })),
                            ("password", string.clone()),
                        ],
                        &["email", "password"],
                    ),
                    "LoginResponse": object_schema(&[("token", string.clone())], &["token"]),
                    "User": object_schema(
                        &[
                            ("id", json!({ "type": "integer", "format": "int64" })),
                            ("email", string.clone()),
                            ("first_name", string.clone()),
                            ("last_name", string.clone()),
                            ("shipping_address", json!({ "type": "string", "nullable": true })),
                            ("roles", json!({ "type": "array", "items": { "type": "string", "enum": ["USER", "ADMIN"] } })),
                        ],
                        &["id", "email", "first_name", "last_name", "roles"],
                    )
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE users (
                    id               INTEGER PRIMARY KEY AUTOINCREMENT,
                    email            TEXT NOT NULL UNIQUE CHECK (email <> ''),
                    password_hash    TEXT NOT NULL,
                    first_name       TEXT NOT NULL,
                    last_name        TEXT NOT NULL,
                    shipping_address TEXT
                );
                CREATE TABLE user_roles (
                    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                    role    TEXT NOT NULL CHECK (role IN ('USER', 'ADMIN')),
                    PRIMARY KEY (user_id, role)
                );
                "#,
        }]
    }
}

/// Create a new instance of the auth module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthModule::new(state))
}
