//! Bookshop application library
//!
//! Catalog, carts and order placement, mounted as modules on the shared
//! kernel and HTTP crates.

pub mod app;
pub mod error;
pub mod modules;
pub mod state;
pub mod utils;

pub use app::App;
pub use error::{ShopError, ShopResult};
pub use state::AppState;

#[cfg(test)]
pub(crate) mod test_support {
    use bookshop_kernel::settings::{DatabaseSettings, Settings};
    use rust_decimal::Decimal;

    use crate::app::App;
    use crate::modules::auth::models::{RegisterRequest, UserResponse};
    use crate::modules::books::models::{Book, BookRequest};
    use crate::state::AppState;

    pub fn settings() -> Settings {
        Settings {
            database: DatabaseSettings::in_memory(),
            ..Settings::default()
        }
    }

    /// Fresh, migrated in-memory database.
    pub async fn state() -> AppState {
        App::bootstrap(&settings()).await.unwrap().state
    }

    pub async fn user(state: &AppState, email: &str) -> UserResponse {
        state
            .users()
            .register(RegisterRequest {
                email: email.into(),
                password: "secret1".into(),
                confirm_password: "secret1".into(),
                first_name: "Test".into(),
                last_name: "Reader".into(),
                shipping_address: None,
            })
            .await
            .unwrap()
    }

    pub async fn book(state: &AppState, isbn: &str, price: Decimal) -> Book {
        state
            .books()
            .save(BookRequest {
                title: format!("Book {isbn}"),
                author: "Anonymous".into(),
                isbn: isbn.into(),
                price,
                description: None,
                cover_image: None,
                category_ids: vec![],
            })
            .await
            .unwrap()
    }
}
