use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use bookstore_http::{AppError, AppResult, QueryParams};
use bookstore_kernel::{InitCtx, Module};

use crate::state::AppState;

/// Session token issuance for registered users
pub struct AuthModule {
    state: AppState,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            token_ttl_days = ctx.settings.auth.token_ttl_days,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/jwt", get(issue_token))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/jwt": {
                    "get": {
                        "summary": "Issue a session token for a registered email",
                        "tags": ["Auth"],
                        "parameters": [{ "name": "email", "in": "query", "required": true, "schema": { "type": "string" } }],
                        "responses": {
                            "200": {
                                "description": "Signed token",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "accessToken": { "type": "string" } }
                                        }
                                    }
                                }
                            },
                            "401": {
                                "description": "No user with this email",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }
}

async fn issue_token(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TokenQuery>,
) -> AppResult<Json<TokenResponse>> {
    if state.store.find_user_by_email(&query.email).await?.is_none() {
        tracing::warn!(email = %query.email, "token requested for unknown user");
        return Err(AppError::unauthorized("unauthorized access"));
    }

    let access_token = state
        .tokens()
        .issue(&query.email)
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(Json(TokenResponse { access_token }))
}

pub fn create_module(state: &AppState) -> Arc<dyn Module> {
    Arc::new(AuthModule {
        state: state.clone(),
    })
}
