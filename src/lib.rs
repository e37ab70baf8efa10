//! Bookstore marketplace backend: route modules, shared state and startup.

pub mod app;
pub mod gateway;
pub mod modules;
pub mod responses;
pub mod state;

pub use app::{build_registry, migrate, run};
pub use state::AppState;
