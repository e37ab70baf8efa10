pub mod auth;
pub mod books;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod users;

use bookstore_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register every route module with the registry, in startup order
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) -> anyhow::Result<()> {
    registry.register(categories::create_module(state))?;
    registry.register(books::create_module(state))?;
    registry.register(orders::create_module(state))?;
    registry.register(payments::create_module(state))?;
    registry.register(users::create_module(state))?;
    registry.register(auth::create_module(state))?;
    Ok(())
}
