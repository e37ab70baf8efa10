use axum::{extract::State, Extension, Json};

use bookstore_authz::Claims;
use bookstore_db::models::Order;
use bookstore_http::{AppError, AppResult, JsonBody, PathParam};

use crate::{
    responses::{DeleteAck, InsertAck},
    state::AppState,
};

pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(mut order): JsonBody<Order>,
) -> AppResult<Json<InsertAck>> {
    // Payment state is owned by settlement.
    order.paid = false;
    order.transaction_id = None;

    let book_id = order.book_id.clone();
    let id = state.store.insert_order(order).await?;
    tracing::info!(order_id = %id, book_id = %book_id, "order placed");
    Ok(Json(InsertAck::inserted(id)))
}

pub async fn list_buyer_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(email): PathParam<String>,
) -> AppResult<Json<Vec<Order>>> {
    if claims.email != email {
        return Err(AppError::forbidden("forbidden access"));
    }
    Ok(Json(state.store.list_orders_by_buyer(&email).await?))
}

pub async fn delete_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> AppResult<Json<DeleteAck>> {
    Ok(Json(DeleteAck::new(state.store.delete_order(&id).await?)))
}

pub async fn order_for_payment(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> AppResult<Json<Option<Order>>> {
    Ok(Json(state.store.get_order(&id).await?))
}
