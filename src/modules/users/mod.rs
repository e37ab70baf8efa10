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

/// Registration, role lookups and seller verification
pub struct UsersModule {
    state: AppState,
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let auth = &self.state.auth;

        Router::new()
            .route("/users", post(handlers::register_user))
            .route(
                "/users",
                auth.with_role(Role::Admin, get(handlers::list_users)),
            )
            .route(
                "/users/admin/{email}",
                auth.with_role(Role::Admin, get(handlers::admin_status)),
            )
            .route(
                "/users/seller",
                auth.with_role(Role::Seller, get(handlers::seller_status)),
            )
            .route(
                "/users/{id}",
                auth.with_role(Role::Admin, delete(handlers::delete_user)),
            )
            .route(
                "/users-seller/{id}",
                auth.with_role(Role::Admin, put(handlers::verify_seller)),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let secured = json!([{ "bearer": [] }]);
        let forbidden = json!({
            "description": "Caller lacks the required role",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
            }
        });
        let id_param = json!([{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }]);

        Some(json!({
            "paths": {
                "/users": {
                    "post": {
                        "summary": "Register a user; repeated emails are acknowledged false",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/User" } }
                            }
                        },
                        "responses": { "200": { "description": "Insert acknowledgement" } }
                    },
                    "get": {
                        "summary": "List users by role (admin)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": [{
                            "name": "role", "in": "query", "required": false,
                            "schema": { "type": "string", "enum": ["buyer", "seller", "admin"] }
                        }],
                        "responses": {
                            "200": {
                                "description": "Users",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/User" } }
                                    }
                                }
                            },
                            "403": forbidden
                        }
                    }
                },
                "/users/admin/{email}": {
                    "get": {
                        "summary": "Check admin status (admin)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": [{ "name": "email", "in": "path", "required": true, "schema": { "type": "string" } }],
                        "responses": { "200": { "description": "{\"isAdmin\": bool}" }, "403": forbidden }
                    }
                },
                "/users/seller": {
                    "get": {
                        "summary": "Check seller status (seller)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": [
                            { "name": "email", "in": "query", "required": true, "schema": { "type": "string" } },
                            { "name": "role", "in": "query", "required": false, "schema": { "type": "string" } }
                        ],
                        "responses": { "200": { "description": "{\"isSeller\": bool}" }, "403": forbidden }
                    }
                },
                "/users/{id}": {
                    "delete": {
                        "summary": "Delete a user (admin)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": id_param,
                        "responses": { "200": { "description": "Delete acknowledgement" }, "403": forbidden }
                    }
                },
                "/users-seller/{id}": {
                    "put": {
                        "summary": "Verify a seller and all of their books (admin)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": id_param,
                        "responses": {
                            "200": { "description": "Update acknowledgement with booksVerified" },
                            "403": forbidden,
                            "404": { "description": "No such user" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "userEmail": { "type": "string", "format": "email" },
                            "role": { "type": "string", "enum": ["buyer", "seller", "admin"] },
                            "isVerified": { "type": "boolean" }
                        },
                        "required": ["userEmail"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                DEFINE TABLE users SCHEMALESS;
                DEFINE INDEX users_email_unique ON users FIELDS userEmail UNIQUE;
                DEFINE INDEX users_role ON users FIELDS role;
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

pub fn create_module(state: &AppState) -> Arc<dyn Module> {
    Arc::new(UsersModule {
        state: state.clone(),
    })
}
