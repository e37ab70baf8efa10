use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use bookstore_db::models::{Role, User};
use bookstore_http::{AppError, AppResult, JsonBody, PathParam, QueryParams};

use crate::{
    responses::{DeleteAck, InsertAck},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct SellerQuery {
    pub email: String,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStatus {
    pub is_seller: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerVerificationAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub books_verified: u64,
}

pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(mut user): JsonBody<User>,
) -> AppResult<Json<InsertAck>> {
    // Verification is granted by an admin, never self-declared.
    user.is_verified = false;
    let email = user.user_email.clone();

    match state.store.insert_user_if_absent(user).await? {
        Some(id) => {
            tracing::info!(user_id = %id, email = %email, "user registered");
            Ok(Json(InsertAck::inserted(id)))
        }
        None => {
            tracing::debug!(email = %email, "registration skipped; email already known");
            Ok(Json(InsertAck::rejected()))
        }
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<RoleQuery>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users(query.role).await?))
}

pub async fn admin_status(
    State(state): State<AppState>,
    PathParam(email): PathParam<String>,
) -> AppResult<Json<AdminStatus>> {
    let user = state.store.find_user_by_email(&email).await?;
    Ok(Json(AdminStatus {
        is_admin: user.is_some_and(|u| u.role == Role::Admin),
    }))
}

pub async fn seller_status(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SellerQuery>,
) -> AppResult<Json<SellerStatus>> {
    let requested = query.role.unwrap_or(Role::Seller);
    let user = state.store.find_user_by_email(&query.email).await?;
    Ok(Json(SellerStatus {
        is_seller: requested == Role::Seller && user.is_some_and(|u| u.role == Role::Seller),
    }))
}

pub async fn verify_seller(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> AppResult<Json<SellerVerificationAck>> {
    let outcome = state
        .store
        .verify_seller(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {id} not found")))?;

    tracing::info!(
        user_id = %id,
        books_verified = outcome.books_verified,
        "seller verified"
    );

    Ok(Json(SellerVerificationAck {
        acknowledged: true,
        matched_count: outcome.user.matched,
        modified_count: outcome.user.modified,
        books_verified: outcome.books_verified,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> AppResult<Json<DeleteAck>> {
    Ok(Json(DeleteAck::new(state.store.delete_user(&id).await?)))
}
