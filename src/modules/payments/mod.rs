mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::post, Router};
use serde_json::json;

use bookstore_kernel::{InitCtx, Migration, Module};

use crate::state::AppState;

/// Payment intents and settlement of paid orders
pub struct PaymentsModule {
    state: AppState,
}

#[async_trait]
impl Module for PaymentsModule {
    fn name(&self) -> &'static str {
        "payments"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            currency = %ctx.settings.payments.currency,
            "payments module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/create-payment-intent",
                post(handlers::create_payment_intent),
            )
            .route(
                "/payments",
                self.state
                    .auth
                    .authenticated(post(handlers::record_payment)),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/create-payment-intent": {
                    "post": {
                        "summary": "Create a gateway payment intent",
                        "tags": ["Payments"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "price": { "type": "number", "exclusiveMinimum": 0 } },
                                        "required": ["price"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Client secret",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "clientSecret": { "type": "string" } }
                                        }
                                    }
                                }
                            },
                            "422": {
                                "description": "Price is not a positive number",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            }
                        }
                    }
                },
                "/payments": {
                    "post": {
                        "summary": "Record a payment and settle its order and book",
                        "tags": ["Payments"],
                        "security": [{ "bearer": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Payment" } }
                            }
                        },
                        "responses": {
                            "200": { "description": "Insert acknowledgement" },
                            "404": {
                                "description": "Order or book does not exist; nothing was written",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Payment": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "orderedId": { "type": "string" },
                            "bookId": { "type": "string" },
                            "transactionId": { "type": "string" },
                            "amount": { "type": "number" }
                        },
                        "required": ["orderedId", "bookId"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                DEFINE TABLE payments SCHEMALESS;
                DEFINE INDEX payments_transaction ON payments FIELDS transactionId;
                "#,
        }]
    }
}

pub fn create_module(state: &AppState) -> Arc<dyn Module> {
    Arc::new(PaymentsModule {
        state: state.clone(),
    })
}
