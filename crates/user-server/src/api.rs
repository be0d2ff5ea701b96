//! API handlers for the user service.

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use user_store::{create_user, list_users, NewUser, StoreError, User};

/// Success envelope: `{"data": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

fn store_err(operation: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |e| {
        tracing::error!(operation, error = %e, "user storage operation failed");
        ApiError::InternalServerError(e.to_string())
    }
}

fn join_err(e: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %e, "storage task join error");
    ApiError::InternalServerError(format!("task join error: {}", e))
}

/// Handler for `GET /users`.
pub async fn list_users_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Data<Vec<User>>>, ApiError> {
    let users = tokio::task::spawn_blocking(move || {
        state
            .store
            .read(list_users)
            .map_err(store_err("list_users"))
    })
    .await
    .map_err(join_err)??;

    Ok(Json(Data { data: users }))
}

/// Handler for `POST /users`.
///
/// Any body that does not bind to [`NewUser`] is a `400`, including a
/// missing or wrong `Content-Type`. Nothing is written in that case.
pub async fn create_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<Data<User>>), ApiError> {
    let Json(input) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let user = tokio::task::spawn_blocking(move || {
        state
            .store
            .write(|conn| create_user(conn, &input))
            .map_err(store_err("create_user"))
    })
    .await
    .map_err(join_err)??;

    tracing::info!(user_id = user.id, "user created");

    Ok((StatusCode::CREATED, Json(Data { data: user })))
}

/// Handler for `GET /users/{id}`.
///
/// Placeholder: the identifier is not read and no lookup happens.
pub async fn get_user_handler() -> Json<Value> {
    Json(json!({ "msg": "not implemented" }))
}
