mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde_json::json;

use bookstore_db::models::Role;
use bookstore_kernel::{InitCtx, Migration, Module};

use crate::state::AppState;

/// Seller listings and their advertise/report/verify/sold flags
pub struct BooksModule {
    state: AppState,
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let auth = &self.state.auth;

        // `/books/{key}` is a seller email on GET and a book id on DELETE.
        Router::new()
            .route("/books", get(handlers::list_books))
            .route(
                "/books",
                auth.with_role(Role::Seller, post(handlers::create_book)),
            )
            .route(
                "/books/{key}",
                auth.with_role(Role::Seller, get(handlers::list_seller_books)),
            )
            .route(
                "/books/{key}",
                auth.with_role(Role::Seller, delete(handlers::delete_book)),
            )
            .route("/books-isAdvertised", get(handlers::list_advertised))
            .route(
                "/books-isAdvertised/{id}",
                auth.with_role(Role::Seller, put(handlers::set_advertised)),
            )
            .route(
                "/books-isReported",
                auth.with_role(Role::Admin, get(handlers::list_reported)),
            )
            .route(
                "/books-isReported/{id}",
                auth.authenticated(put(handlers::set_reported)),
            )
            .route(
                "/books-isReported/{id}",
                auth.with_role(Role::Admin, delete(handlers::delete_reported)),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_list = json!({
            "description": "Matching books",
            "content": {
                "application/json": {
                    "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                }
            }
        });
        let error = json!({
            "description": "Error",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
            }
        });
        let secured = json!([{ "bearer": [] }]);
        let flag_body = |field: &str| {
            let mut properties = serde_json::Map::new();
            properties.insert(
                field.to_string(),
                json!({ "type": "boolean", "default": true }),
            );
            json!({
                "required": false,
                "content": {
                    "application/json": {
                        "schema": { "type": "object", "properties": properties }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List books, optionally by category",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "id", "in": "query", "required": false,
                            "description": "Category id", "schema": { "type": "string" }
                        }],
                        "responses": { "200": book_list }
                    },
                    "post": {
                        "summary": "Create a listing (seller)",
                        "tags": ["Books"],
                        "security": secured,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
                            }
                        },
                        "responses": { "200": { "description": "Insert acknowledgement" }, "403": error }
                    }
                },
                "/books/{key}": {
                    "get": {
                        "summary": "List a seller's books (seller, own email only)",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [{ "name": "key", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "responses": { "200": book_list, "403": error }
                    },
                    "delete": {
                        "summary": "Delete a listing by id (seller)",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [{ "name": "key", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "responses": { "200": { "description": "Delete acknowledgement" }, "403": error }
                    }
                },
                "/books-isAdvertised": {
                    "get": {
                        "summary": "List advertised, unsold books",
                        "tags": ["Books"],
                        "responses": { "200": book_list }
                    }
                },
                "/books-isAdvertised/{id}": {
                    "put": {
                        "summary": "Set the advertised flag (seller)",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "requestBody": flag_body("isAdvertised"),
                        "responses": { "200": { "description": "Update acknowledgement" }, "404": error }
                    }
                },
                "/books-isReported": {
                    "get": {
                        "summary": "List reported books (admin)",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": { "200": book_list, "403": error }
                    }
                },
                "/books-isReported/{id}": {
                    "put": {
                        "summary": "Report a book",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "requestBody": flag_body("isReported"),
                        "responses": { "200": { "description": "Update acknowledgement" }, "404": error }
                    },
                    "delete": {
                        "summary": "Delete a reported book and its orders (admin)",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "responses": { "200": { "description": "Delete acknowledgement with order count" }, "403": error }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "categoryId": { "type": "string" },
                            "sellerEmail": { "type": "string", "format": "email" },
                            "price": { "type": "number" },
                            "isAdvertised": { "type": "boolean" },
                            "isReported": { "type": "boolean" },
                            "isSold": { "type": "boolean" },
                            "isVerified": { "type": "boolean" }
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
                DEFINE TABLE books SCHEMALESS;
                DEFINE INDEX books_category ON books FIELDS categoryId;
                DEFINE INDEX books_seller ON books FIELDS sellerEmail;
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(state: &AppState) -> Arc<dyn Module> {
    Arc::new(BooksModule {
        state: state.clone(),
    })
}
