use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{group_by_category, MenuItemView, PublicMenuCategory};
use super::repo::MenuItem;
use super::services::{self, MenuPatch, NewMenuItem};
use crate::{
    auth::services::AuthAdmin,
    categories::services as categories,
    error::{AppError, AppResult, OrBackend},
    images::{form::ImageForm, services::presign_many},
    state::AppState,
    stats::MenuStats,
};

pub fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/menu", get(list_menu).post(create_menu_item))
        .route("/menu/stats", get(menu_stats))
        .route(
            "/menu/:id",
            get(get_menu_item)
                .patch(update_menu_item)
                .delete(delete_menu_item),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/public/menu", get(public_menu))
}

#[derive(Debug, Deserialize)]
pub struct MenuFilter {
    pub category_id: Option<Uuid>,
}

async fn to_view(st: &AppState, item: MenuItem) -> AppResult<MenuItemView> {
    let urls = presign_many(st, &item.images, st.presign_ttl())
        .await
        .or_backend("Failed to load menu item images")?;
    Ok(MenuItemView::new(item, urls))
}

#[instrument(skip(state))]
pub async fn list_menu(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Query(filter): Query<MenuFilter>,
) -> AppResult<Json<Vec<MenuItemView>>> {
    let items = services::list_items(&state, filter.category_id).await?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(to_view(&state, item).await?);
    }
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn get_menu_item(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MenuItemView>> {
    let item = services::get_item(&state, id).await?;
    Ok(Json(to_view(&state, item).await?))
}

/// POST /menu (multipart): `name`, `price_cents`, `category_id`, optional
/// `description`, `status`, and any number of `images`.
#[instrument(skip(state, mp))]
pub async fn create_menu_item(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    mp: Multipart,
) -> AppResult<(StatusCode, Json<MenuItemView>)> {
    let form = ImageForm::read(mp).await?;
    let new = NewMenuItem {
        name: form.required("name")?.to_string(),
        price_cents: form
            .parse("price_cents")?
            .ok_or_else(|| AppError::Validation("price_cents is required".into()))?,
        description: form.text("description").map(str::to_string),
        category_id: form
            .parse("category_id")?
            .ok_or_else(|| AppError::Validation("category_id is required".into()))?,
        status: form.parse("status")?.unwrap_or_default(),
        images: form.files,
    };
    let item = services::create_item(&state, new).await?;
    Ok((StatusCode::CREATED, Json(to_view(&state, item).await?)))
}

/// PATCH /menu/:id (multipart): any field of the create form, new `images`,
/// and `remove_images` (repeated or comma separated keys). A blank
/// `description` clears it.
#[instrument(skip(state, mp))]
pub async fn update_menu_item(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> AppResult<Json<MenuItemView>> {
    let form = ImageForm::read(mp).await?;
    let patch = MenuPatch {
        name: form.text("name").map(str::to_string),
        price_cents: form.parse("price_cents")?,
        description: form.clearable("description"),
        category_id: form.parse("category_id")?,
        status: form.parse("status")?,
        remove_images: form.list("remove_images"),
        new_images: form.files,
    };
    let item = services::update_item(&state, id, patch).await?;
    Ok(Json(to_view(&state, item).await?))
}

#[instrument(skip(state))]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_item(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn menu_stats(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
) -> AppResult<Json<MenuStats>> {
    Ok(Json(services::stats(&state).await?))
}

#[instrument(skip(state))]
pub async fn public_menu(State(state): State<AppState>) -> AppResult<Json<Vec<PublicMenuCategory>>> {
    let cats = categories::list(&state, true).await?;
    let items = services::list_public(&state).await?;
    let mut with_urls = Vec::with_capacity(items.len());
    for item in items {
        let urls = presign_many(&state, &item.images, state.presign_ttl())
            .await
            .or_backend("Failed to load menu")?;
        with_urls.push((item, urls));
    }
    Ok(Json(group_by_category(cats, with_urls)))
}
