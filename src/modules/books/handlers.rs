use axum::{body::Bytes, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use bookstore_authz::Claims;
use bookstore_db::models::{Book, BookFilter, BookFlag};
use bookstore_http::{AppError, AppResult, JsonBody, PathParam, QueryParams};

use crate::{
    responses::{DeleteAck, InsertAck, UpdateAck},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct BooksQuery {
    /// Category id
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
    pub orders_deleted: u64,
}

pub async fn list_books(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BooksQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let filter = BookFilter {
        category_id: query.id.filter(|id| !id.is_empty()),
        ..Default::default()
    };
    Ok(Json(state.store.list_books(&filter).await?))
}

pub async fn list_seller_books(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(email): PathParam<String>,
) -> AppResult<Json<Vec<Book>>> {
    if claims.email != email {
        return Err(AppError::forbidden("forbidden access"));
    }
    let filter = BookFilter {
        seller_email: Some(email),
        ..Default::default()
    };
    Ok(Json(state.store.list_books(&filter).await?))
}

pub async fn create_book(
    State(state): State<AppState>,
    JsonBody(book): JsonBody<Book>,
) -> AppResult<Json<InsertAck>> {
    let seller = book.seller_email.clone();
    let id = state.store.insert_book(book).await?;
    tracing::info!(book_id = %id, seller = %seller, "book listed");
    Ok(Json(InsertAck::inserted(id)))
}

pub async fn delete_book(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> AppResult<Json<DeleteAck>> {
    Ok(Json(DeleteAck::new(state.store.delete_book(&id).await?)))
}

pub async fn list_advertised(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let filter = BookFilter {
        advertised: Some(true),
        sold: Some(false),
        ..Default::default()
    };
    Ok(Json(state.store.list_books(&filter).await?))
}

pub async fn set_advertised(
    state: State<AppState>,
    id: PathParam<String>,
    body: Bytes,
) -> AppResult<Json<UpdateAck>> {
    set_flag(state, id, BookFlag::Advertised, body).await
}

pub async fn list_reported(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let filter = BookFilter {
        reported: Some(true),
        ..Default::default()
    };
    Ok(Json(state.store.list_books(&filter).await?))
}

pub async fn set_reported(
    state: State<AppState>,
    id: PathParam<String>,
    body: Bytes,
) -> AppResult<Json<UpdateAck>> {
    set_flag(state, id, BookFlag::Reported, body).await
}

pub async fn delete_reported(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> AppResult<Json<CascadeAck>> {
    let outcome = state.store.delete_book_with_orders(&id).await?;
    tracing::info!(
        book_id = %id,
        books_deleted = outcome.books_deleted,
        orders_deleted = outcome.orders_deleted,
        "reported book removed"
    );
    Ok(Json(CascadeAck {
        acknowledged: true,
        deleted_count: outcome.books_deleted,
        orders_deleted: outcome.orders_deleted,
    }))
}

async fn set_flag(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    flag: BookFlag,
    body: Bytes,
) -> AppResult<Json<UpdateAck>> {
    let value = flag_value(&body, flag)?;
    let count = state
        .store
        .set_book_flag(&id, flag, value)
        .await?
        .ok_or_else(|| AppError::not_found(format!("book {id} not found")))?;
    Ok(Json(count.into()))
}

/// Read the flag from an optional JSON body; an empty body means `true`.
fn flag_value(body: &[u8], flag: BookFlag) -> AppResult<bool> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(true);
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|err| AppError::bad_request(format!("invalid JSON body: {err}")))?;

    match value.get(flag.field()) {
        None | Some(serde_json::Value::Null) => Ok(true),
        Some(serde_json::Value::Bool(v)) => Ok(*v),
        Some(_) => Err(AppError::validation(
            vec![serde_json::json!({ "field": flag.field(), "error": "must be a boolean" })],
            "invalid flag value",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_sets_the_flag() {
        assert!(flag_value(b"", BookFlag::Advertised).unwrap());
        assert!(flag_value(b"  \n", BookFlag::Reported).unwrap());
        assert!(flag_value(b"{}", BookFlag::Reported).unwrap());
    }

    #[test]
    fn explicit_value_is_honoured() {
        assert!(!flag_value(br#"{"isAdvertised": false}"#, BookFlag::Advertised).unwrap());
        assert!(flag_value(br#"{"isAdvertised": false}"#, BookFlag::Reported).unwrap());
    }

    #[test]
    fn non_boolean_value_is_rejected() {
        let err = flag_value(br#"{"isReported": "yes"}"#, BookFlag::Reported).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
