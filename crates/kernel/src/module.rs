use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Borrowed view of process configuration handed to lifecycle hooks
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// Schema statement owned by one module, applied at most once per database.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

impl Migration {
    /// Identifier recorded once the migration has run, e.g. `books_001_init`
    pub fn key(&self, module: &str) -> String {
        format!("{module}_{}", self.id)
    }
}

/// A slice of the HTTP surface together with its startup and shutdown hooks.
///
/// Modules carry their own state; [`Module::routes`] returns a router with
/// that state already bound, so the application can merge it at the root
/// without knowing what the module holds.
#[async_trait]
pub trait Module: Sync + Send {
    /// Registry key; must be unique
    fn name(&self) -> &'static str;

    /// Runs before migrations
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with `paths` and optional `components.schemas`
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Runs once migrations have been applied and before the listener binds
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the server has drained
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_key_is_scoped_by_module() {
        let migration = Migration {
            id: "001_init",
            up: "DEFINE TABLE books SCHEMALESS;",
        };
        assert_eq!(migration.key("books"), "books_001_init");
        assert_ne!(migration.key("books"), migration.key("orders"));
    }
}
