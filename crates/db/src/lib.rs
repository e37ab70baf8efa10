//! Document store for the bookstore backend: record models, the `Store`
//! trait, and its in-memory and SurrealDB backends.

use std::sync::Arc;

use bookstore_kernel::settings::{DatabaseBackend, DatabaseSettings};

pub mod memory;
pub mod models;
pub mod store;
pub mod surreal;

pub use memory::MemoryStore;
pub use store::Store;
pub use surreal::SurrealStore;

/// Fresh record id; UUIDv7 keeps ids time-ordered.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Open the configured backend
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn Store>> {
    match settings.backend {
        DatabaseBackend::Memory => {
            tracing::info!(target: "bookstore-db", "using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Surreal => Ok(Arc::new(SurrealStore::connect(settings).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let first = new_id();
        let second = new_id();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[tokio::test]
    async fn memory_backend_is_the_default() {
        let store = connect(&DatabaseSettings::default()).await.unwrap();
        assert!(store.list_categories().await.unwrap().is_empty());
        assert_eq!(store.apply_migrations(&[]).await.unwrap(), 0);
    }
}
