use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use bookstore_db::models::{Payment, Settlement};
use bookstore_http::{AppError, AppResult, JsonBody};

use crate::{gateway::to_minor_units, responses::InsertAck, state::AppState};

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<IntentRequest>,
) -> AppResult<Json<IntentResponse>> {
    let amount = to_minor_units(request.price).ok_or_else(|| {
        AppError::validation(
            vec![serde_json::json!({ "field": "price", "error": "must be a positive number" })],
            "invalid price",
        )
    })?;

    let client_secret = state
        .gateway
        .create_intent(amount, &state.settings.payments.currency)
        .await?;

    Ok(Json(IntentResponse { client_secret }))
}

pub async fn record_payment(
    State(state): State<AppState>,
    JsonBody(payment): JsonBody<Payment>,
) -> AppResult<Json<InsertAck>> {
    let order_id = payment.ordered_id.clone();
    let book_id = payment.book_id.clone();

    match state.store.settle_payment(payment).await? {
        Settlement::Settled { payment_id } => {
            tracing::info!(
                payment_id = %payment_id,
                order_id = %order_id,
                book_id = %book_id,
                "payment settled"
            );
            Ok(Json(InsertAck::inserted(payment_id)))
        }
        Settlement::OrderMissing => Err(AppError::not_found(format!("order {order_id} not found"))),
        Settlement::BookMissing => Err(AppError::not_found(format!("book {book_id} not found"))),
    }
}
