use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{ContactRequest, MessageQuery, StatusRequest};
use super::repo::Message;
use super::services;
use crate::{auth::services::AuthAdmin, error::AppResult, state::AppState, stats::MessageStats};

#[derive(Debug, Serialize)]
pub struct SubmittedResponse {
    pub id: Uuid,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages))
        .route("/messages/stats", get(message_stats))
        .route("/messages/:id", patch(set_message_status).delete(delete_message))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/public/messages", post(submit_message))
}

#[instrument(skip(state, body))]
pub async fn submit_message(
    State(state): State<AppState>,
    Json(body): Json<ContactRequest>,
) -> AppResult<(StatusCode, Json<SubmittedResponse>)> {
    let msg = services::submit(&state, body).await?;
    Ok((StatusCode::CREATED, Json(SubmittedResponse { id: msg.id })))
}

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Query(q): Query<MessageQuery>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(services::list(&state, q.status, q.limit, q.offset).await?))
}

#[instrument(skip(state))]
pub async fn set_message_status(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusRequest>,
) -> AppResult<Json<Message>> {
    Ok(Json(services::set_status(&state, id, body.status).await?))
}

#[instrument(skip(state))]
pub async fn delete_message(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn message_stats(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
) -> AppResult<Json<MessageStats>> {
    Ok(Json(services::stats(&state).await?))
}
