use std::sync::Arc;

use axum::extract::FromRef;
use bookshop_authz::JwtKeys;
use bookshop_db::DbPool;
use bookshop_kernel::settings::Settings;

use crate::modules::{
    auth::service::UserService, books::service::BookService, cart::service::CartService,
    categories::service::CategoryService, orders::locks::PlacementLocks,
    orders::service::OrderService,
};

/// Shared handles for request handlers. Holds no business data.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub keys: Arc<JwtKeys>,
    pub placement_locks: PlacementLocks,
}

impl AppState {
    pub fn new(db: DbPool, settings: &Settings) -> Self {
        Self {
            db,
            keys: Arc::new(JwtKeys::from_settings(&settings.auth)),
            placement_locks: PlacementLocks::default(),
        }
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.clone(), self.keys.clone())
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.db.clone())
    }

    pub fn books(&self) -> BookService {
        BookService::new(self.db.clone())
    }

    pub fn carts(&self) -> CartService {
        CartService::new(self.db.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.db.clone(), self.placement_locks.clone())
    }
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}
