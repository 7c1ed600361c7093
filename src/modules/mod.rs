pub mod auth;
pub mod books;
pub mod cart;
pub mod categories;
pub mod orders;

use bookshop_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register all bookshop modules. Migrations run in this order, so tables
/// are created after the tables they reference.
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register(auth::create_module(state.clone()));
    registry.register(categories::create_module(state.clone()));
    registry.register(books::create_module(state.clone()));
    registry.register(cart::create_module(state.clone()));
    registry.register(orders::create_module(state.clone()));
}
