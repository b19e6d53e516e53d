use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;

use super::repo::HomeSection;
use super::services::{self, SectionUpdate};
use crate::{
    auth::services::AuthAdmin,
    error::{AppError, AppResult, OrBackend},
    images::{form::ImageForm, services::presign_opt},
    model::HomeSectionType,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct HomeSectionView {
    pub section_type: HomeSectionType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_key: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: OffsetDateTime,
}

pub fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/home-sections", get(list_sections))
        .route("/home-sections/:section", get(get_section).put(put_section))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/public/home-sections", get(public_sections))
}

async fn to_view(st: &AppState, s: HomeSection) -> AppResult<HomeSectionView> {
    let image_url = presign_opt(st, s.image_key.as_deref())
        .await
        .or_backend("Failed to load home sections")?;
    Ok(HomeSectionView {
        section_type: s.section_type,
        title: s.title,
        description: s.description,
        image_key: s.image_key,
        image_url,
        updated_at: s.updated_at,
    })
}

async fn all_views(st: &AppState) -> AppResult<Vec<HomeSectionView>> {
    let sections = services::list(st).await?;
    let mut out = Vec::with_capacity(sections.len());
    for s in sections {
        out.push(to_view(st, s).await?);
    }
    Ok(out)
}

#[instrument(skip(state))]
pub async fn list_sections(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
) -> AppResult<Json<Vec<HomeSectionView>>> {
    Ok(Json(all_views(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_section(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(section): Path<HomeSectionType>,
) -> AppResult<Json<HomeSectionView>> {
    let s = services::get(&state, section).await?;
    Ok(Json(to_view(&state, s).await?))
}

/// PUT /home-sections/:section (multipart): optional `title`, `description`,
/// and a single `image`. A blank text field clears it.
#[instrument(skip(state, mp))]
pub async fn put_section(
    State(state): State<AppState>,
    AuthAdmin(_admin): AuthAdmin,
    Path(section): Path<HomeSectionType>,
    mp: Multipart,
) -> AppResult<Json<HomeSectionView>> {
    let mut form = ImageForm::read(mp).await?;
    if form.files.len() > 1 {
        return Err(AppError::Validation("at most one image is allowed".into()));
    }
    let update = SectionUpdate {
        title: form.clearable("title"),
        description: form.clearable("description"),
        image: form.files.pop(),
    };
    let saved = services::upsert(&state, section, update).await?;
    Ok(Json(to_view(&state, saved).await?))
}

#[instrument(skip(state))]
pub async fn public_sections(State(state): State<AppState>) -> AppResult<Json<Vec<HomeSectionView>>> {
    Ok(Json(all_views(&state).await?))
}
