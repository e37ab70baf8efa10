use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;

use bookstore_db::models::Category;
use bookstore_http::AppResult;
use bookstore_kernel::{InitCtx, Migration, Module};

use crate::state::AppState;

/// Static genre list shown on the storefront
pub struct CategoriesModule {
    state: AppState,
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
        Router::new()
            .route("/categories", get(list_categories))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/categories": {
                    "get": {
                        "summary": "List all categories",
                        "tags": ["Categories"],
                        "responses": {
                            "200": {
                                "description": "Every category",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Category" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Category": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" }
                        },
                        "required": ["id", "name"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: "DEFINE TABLE categories SCHEMALESS;",
        }]
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let seeded = seed_categories(&self.state, &ctx.settings.catalog.categories).await?;
        tracing::info!(module = self.name(), seeded, "categories module started");
        Ok(())
    }
}

/// Insert the configured names when the store holds no categories yet
async fn seed_categories(state: &AppState, names: &[String]) -> anyhow::Result<usize> {
    if !state.store.list_categories().await?.is_empty() {
        return Ok(0);
    }
    for name in names {
        state
            .store
            .insert_category(Category {
                id: String::new(),
                name: name.clone(),
                extra: Default::default(),
            })
            .await?;
    }
    Ok(names.len())
}

async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.store.list_categories().await?))
}

pub fn create_module(state: &AppState) -> Arc<dyn Module> {
    Arc::new(CategoriesModule {
        state: state.clone(),
    })
}
