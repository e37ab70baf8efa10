mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{delete, get, post},
    Router,
};
use serde_json::json;

use bookstore_kernel::{InitCtx, Migration, Module};

use crate::state::AppState;

/// Buyer orders against single books
pub struct OrdersModule {
    state: AppState,
}

#[async_trait]
impl Module for OrdersModule {
    fn name(&self) -> &'static str {
        "orders"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "orders module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let auth = &self.state.auth;

        // `/orders/{key}` is a buyer email on GET and an order id on DELETE.
        Router::new()
            .route("/orders", auth.authenticated(post(handlers::create_order)))
            .route(
                "/orders/{key}",
                auth.authenticated(get(handlers::list_buyer_orders)),
            )
            .route(
                "/orders/{key}",
                auth.authenticated(delete(handlers::delete_order)),
            )
            .route(
                "/orders-to-payment/{id}",
                auth.authenticated(get(handlers::order_for_payment)),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let secured = json!([{ "bearer": [] }]);
        let key = json!([{ "name": "key", "in": "path", "required": true, "schema": { "type": "string" } }]);

        Some(json!({
            "paths": {
                "/orders": {
                    "post": {
                        "summary": "Place an order",
                        "tags": ["Orders"],
                        "security": secured,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Order" } }
                            }
                        },
                        "responses": { "200": { "description": "Insert acknowledgement" } }
                    }
                },
                "/orders/{key}": {
                    "get": {
                        "summary": "List the caller's orders by buyer email",
                        "tags": ["Orders"],
                        "security": secured,
                        "parameters": key,
                        "responses": {
                            "200": {
                                "description": "Orders",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Order" } }
                                    }
                                }
                            }
                        }
                    },
                    "delete": {
                        "summary": "Delete an order by id",
                        "tags": ["Orders"],
                        "security": secured,
                        "parameters": key,
                        "responses": { "200": { "description": "Delete acknowledgement" } }
                    }
                },
                "/orders-to-payment/{id}": {
                    "get": {
                        "summary": "Fetch one order for checkout",
                        "tags": ["Orders"],
                        "security": secured,
                        "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "responses": { "200": { "description": "The order, or null" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Order": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "bookId": { "type": "string" },
                            "buyerEmail": { "type": "string", "format": "email" },
                            "paid": { "type": "boolean" },
                            "isReported": { "type": "boolean" },
                            "transactionId": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                DEFINE TABLE orders SCHEMALESS;
                DEFINE INDEX orders_buyer ON orders FIELDS buyerEmail;
                DEFINE INDEX orders_book ON orders FIELDS bookId;
                "#,
        }]
    }
}

pub fn create_module(state: &AppState) -> Arc<dyn Module> {
    Arc::new(OrdersModule {
        state: state.clone(),
    })
}
