use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{GalleryItemView, PublicGalleryItem};
use super::repo::GalleryItem;
use super::services::{self, GalleryPatch, NewGalleryItem};
use crate::{
    auth::services::AuthAdmin,
    error::{AppError, AppResult, OrBackend},
    images::{form::ImageForm, services::presign},
    state::AppState,
    stats::StatusCounts,
};

pub fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/gallery", get(list_gallery).post(create_gallery_item))
        .route("/gallery/stats", get(gallery_stats))
        .route(
            "/gallery/:id",
            axum::routing::patch(update_gallery_item).delete(delete_gallery_item),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/public/gallery", get(public_gallery))
}

async fn to_view(st: &AppState, item: GalleryItem) -> AppResult<GalleryItemView> {
    let url = presign(st, &item.image_key)
        .await
        .or_backend("Failed to load gallery")?;
    Ok(GalleryItemView::new(item, url))
}

#[instrument(skip(state))]
pub async fn list_gallery(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
) -> AppResult<Json<Vec<GalleryItemView>>> {
    let items = services::list_items(&state, false).await?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(to_view(&state, item).await?);
    }
    Ok(Json(out))
}

/// POST /gallery (multipart): `image`, optional `status`, optional `place_order`.
#[instrument(skip(state, mp))]
pub async fn create_gallery_item(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    mp: Multipart,
) -> AppResult<(StatusCode, Json<GalleryItemView>)> {
    let mut form = ImageForm::read(mp).await?;
    let status = form.parse("status")?.unwrap_or_default();
    let place_order = form.parse::<i32>("place_order")?;
    if form.files.len() != 1 {
        return Err(AppError::Validation("exactly one image is required".into()));
    }
    let image = form.files.remove(0);

    let item = services::add_item(
        &state,
        NewGalleryItem {
            image,
            status,
            place_order,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(to_view(&state, item).await?)))
}

/// PATCH /gallery/:id (multipart): any of `image`, `status`, `place_order`.
#[instrument(skip(state, mp))]
pub async fn update_gallery_item(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> AppResult<Json<GalleryItemView>> {
    let mut form = ImageForm::read(mp).await?;
    if form.files.len() > 1 {
        return Err(AppError::Validation("at most one image is allowed".into()));
    }
    let patch = GalleryPatch {
        status: form.parse("status")?,
        place_order: form.parse("place_order")?,
        image: form.files.pop(),
    };
    let item = services::update_item(&state, id, patch).await?;
    Ok(Json(to_view(&state, item).await?))
}

#[instrument(skip(state))]
pub async fn delete_gallery_item(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_item(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn gallery_stats(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
) -> AppResult<Json<StatusCounts>> {
    Ok(Json(services::stats(&state).await?))
}

#[instrument(skip(state))]
pub async fn public_gallery(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PublicGalleryItem>>> {
    let items = services::list_items(&state, true).await?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(PublicGalleryItem {
            image_url: presign(&state, &item.image_key)
                .await
                .or_backend("Failed to load gallery")?,
            id: item.id,
            place_order: item.place_order,
        });
    }
    Ok(Json(out))
}
