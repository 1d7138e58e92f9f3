//! JSON-over-HTTP adapter in front of the command actor.
//!
//! Handlers are thin: decode, hand the call to the actor on the blocking pool,
//! encode. The actor handle lives in router state; there is no global.

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;
use tower_http::trace::TraceLayer;
use tracing::{info_span, warn};

use crate::actor::{ActorError, ActorHandle, ActorResult};
use crate::logging::generate_id;
use crate::record::{Record, RecordId};
use crate::store::StoreError;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub id: RecordId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deleted {
    pub deleted: RecordId,
}

pub fn router(actor: ActorHandle) -> Router {
    Router::new()
        .route("/create", post(create_record))
        .route("/update", post(update_record).put(update_record))
        .route("/delete/:id", delete(delete_record).post(delete_record))
        .route("/get/:id", get(get_record))
        .route("/get", get(list_records))
        .route("/list", get(list_records))
        .route("/about", get(about))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                info_span!(
                    "request",
                    id = %generate_id(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(actor)
}

async fn create_record(
    State(actor): State<ActorHandle>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let Json(request) = payload?;
    let record = on_actor(move || actor.create(request.description, request.status)).await?;
    Ok(Json(record))
}

async fn update_record(
    State(actor): State<ActorHandle>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let Json(request) = payload?;
    let record =
        on_actor(move || actor.update(request.id, request.description, request.status)).await?;
    Ok(Json(record))
}

async fn delete_record(
    State(actor): State<ActorHandle>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Deleted>, ApiError> {
    let Path(id) = id?;
    on_actor(move || actor.delete(id)).await?;
    Ok(Json(Deleted { deleted: id }))
}

async fn get_record(
    State(actor): State<ActorHandle>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Record>, ApiError> {
    let Path(id) = id?;
    let record = on_actor(move || actor.get(id)).await?;
    Ok(Json(record))
}

async fn list_records(State(actor): State<ActorHandle>) -> Result<Json<Vec<Record>>, ApiError> {
    let records = on_actor(move || actor.list_all()).await?;
    Ok(Json(records))
}

async fn about() -> &'static str {
    "About Todo App"
}

/// Runs a blocking actor call off the async workers.
async fn on_actor<T, F>(call: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ActorResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(call).await??)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Actor(#[from] ActorError),
    #[error("{0}")]
    BadRequest(String),
    #[error("request task failed: {0}")]
    Join(#[from] JoinError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Actor(ActorError::Store(StoreError::NotFound(_))) => StatusCode::NOT_FOUND,
            ApiError::Actor(ActorError::Store(StoreError::Invalid(_))) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Actor(ActorError::Store(StoreError::Io(_))) | ApiError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Actor(ActorError::ActorStopped) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Actor(ActorError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(%status, error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;

    #[test]
    fn error_kinds_map_to_statuses() {
        let cases = [
            (ApiError::from(ActorError::Store(StoreError::NotFound(1))), StatusCode::NOT_FOUND),
            (
                ApiError::from(ActorError::Store(StoreError::Invalid("empty".into()))),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(ActorError::Store(StoreError::Io(io::Error::other("disk")))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::from(ActorError::ActorStopped), StatusCode::SERVICE_UNAVAILABLE),
            (
                ApiError::from(ActorError::Timeout(Duration::from_millis(5))),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (ApiError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }
    }
}
