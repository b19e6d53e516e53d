use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateCategoryRequest, UpdateCategoryRequest};
use super::repo::Category;
use super::services::{self, CategoryPatch, NewCategory};
use crate::{auth::services::AuthAdmin, error::AppResult, state::AppState, stats::StatusCounts};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/stats", get(category_stats))
        .route(
            "/categories/:id",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(services::list(&state, false).await?))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Category>> {
    Ok(Json(services::get(&state, id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Json(body): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = services::create(
        &state,
        NewCategory {
            name: body.name,
            description: body.description,
            status: body.status,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, body))]
pub async fn update_category(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCategoryRequest>,
) -> AppResult<Json<Category>> {
    let patch = CategoryPatch {
        name: body.name,
        description: body.description,
        status: body.status,
        place_order: body.place_order,
    };
    Ok(Json(services::update(&state, id, patch).await?))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn category_stats(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
) -> AppResult<Json<StatusCounts>> {
    Ok(Json(services::stats(&state).await?))
}
