use tracing::{info, warn};
use uuid::Uuid;

use super::repo::{self, GalleryItem};
use crate::error::{AppError, AppResult, OrBackend};
use crate::images::paths::GALLERY_FOLDER;
use crate::images::services::{delete_best_effort, upload_image, UploadItem};
use crate::model::ItemStatus;
use crate::ordering;
use crate::state::AppState;
use crate::stats::StatusCounts;

pub struct NewGalleryItem {
    pub image: UploadItem,
    pub status: ItemStatus,
    pub place_order: Option<i32>,
}

#[derive(Default)]
pub struct GalleryPatch {
    pub status: Option<ItemStatus>,
    pub place_order: Option<i32>,
    pub image: Option<UploadItem>,
}

pub async fn list_items(st: &AppState, only_active: bool) -> AppResult<Vec<GalleryItem>> {
    repo::list(&st.db, only_active)
        .await
        .or_backend("Failed to load gallery")
}

/// Uploads the image, then writes the row at its final position in one
/// transaction.
pub async fn add_item(st: &AppState, new: NewGalleryItem) -> AppResult<GalleryItem> {
    let key = upload_image(st, GALLERY_FOLDER, new.image)
        .await
        .or_backend("Failed to upload gallery image")?;

    match insert_at(st, &key, new.status, new.place_order).await {
        Ok(item) => {
            info!(id = %item.id, place_order = item.place_order, "gallery item added");
            Ok(item)
        }
        Err(e) => {
            warn!(%key, "gallery row not written; removing uploaded image");
            delete_best_effort(st, &[key]).await;
            Err(e)
        }
    }
}

async fn insert_at(
    st: &AppState,
    key: &str,
    status: ItemStatus,
    requested: Option<i32>,
) -> AppResult<GalleryItem> {
    const MSG: &str = "Failed to add gallery image";
    let mut tx = st.db.begin().await.or_backend(MSG)?;
    repo::lock_ordering_tx(&mut tx).await.or_backend(MSG)?;
    let slots = repo::ordering_tx(&mut tx).await.or_backend(MSG)?;

    let (place_order, shifted) = ordering::plan_insert(&slots, requested)?;
    repo::apply_changes_tx(&mut tx, &shifted).await.or_backend(MSG)?;
    let item = repo::insert_tx(&mut tx, Uuid::new_v4(), key, place_order, status)
        .await
        .or_backend(MSG)?;
    tx.commit().await.or_backend(MSG)?;
    Ok(item)
}

/// Applies status/image changes and, when a new position is requested,
/// swaps places with the item currently holding it.
pub async fn update_item(st: &AppState, id: Uuid, patch: GalleryPatch) -> AppResult<GalleryItem> {
    let existing = repo::find(&st.db, id)
        .await
        .or_backend("Failed to update gallery item")?
        .ok_or(AppError::NotFound("Gallery item"))?;

    let new_key = match patch.image {
        Some(img) => Some(
            upload_image(st, GALLERY_FOLDER, img)
                .await
                .or_backend("Failed to upload gallery image")?,
        ),
        None => None,
    };

    let item = match write_update(st, id, patch.status, patch.place_order, new_key.as_deref()).await
    {
        Ok(item) => item,
        Err(e) => {
            if let Some(key) = new_key {
                delete_best_effort(st, &[key]).await;
            }
            return Err(e);
        }
    };

    if new_key.is_some() {
        delete_best_effort(st, &[existing.image_key]).await;
    }
    info!(%id, place_order = item.place_order, "gallery item updated");
    Ok(item)
}

async fn write_update(
    st: &AppState,
    id: Uuid,
    status: Option<ItemStatus>,
    target: Option<i32>,
    new_key: Option<&str>,
) -> AppResult<GalleryItem> {
    const MSG: &str = "Failed to update gallery item";
    let mut tx = st.db.begin().await.or_backend(MSG)?;
    if let Some(target) = target {
        repo::lock_ordering_tx(&mut tx).await.or_backend(MSG)?;
        let slots = repo::ordering_tx(&mut tx).await.or_backend(MSG)?;
        let changes = ordering::plan_swap(&slots, id, target)?;
        repo::apply_changes_tx(&mut tx, &changes).await.or_backend(MSG)?;
    }
    let item = repo::update_fields_tx(&mut tx, id, status, new_key)
        .await
        .or_backend(MSG)?;
    tx.commit().await.or_backend(MSG)?;
    Ok(item)
}

/// Removes the row and closes the gap it leaves in the same transaction.
pub async fn delete_item(st: &AppState, id: Uuid) -> AppResult<()> {
    const MSG: &str = "Failed to delete gallery item";
    let mut tx = st.db.begin().await.or_backend(MSG)?;
    repo::lock_ordering_tx(&mut tx).await.or_backend(MSG)?;
    let Some((deleted_order, image_key)) = repo::delete_tx(&mut tx, id).await.or_backend(MSG)?
    else {
        return Err(AppError::NotFound("Gallery item"));
    };
    let remaining = repo::ordering_tx(&mut tx).await.or_backend(MSG)?;
    let changes = ordering::plan_close_gap(&remaining, deleted_order);
    repo::apply_changes_tx(&mut tx, &changes).await.or_backend(MSG)?;
    tx.commit().await.or_backend(MSG)?;

    delete_best_effort(st, &[image_key]).await;
    info!(%id, deleted_order, shifted = changes.len(), "gallery item deleted");
    Ok(())
}

pub async fn stats(st: &AppState) -> AppResult<StatusCounts> {
    let statuses = repo::statuses(&st.db)
        .await
        .or_backend("Failed to load gallery statistics")?;
    Ok(StatusCounts::tally(statuses))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::storage::memory::MemoryStorage;

    #[tokio::test]
    async fn add_removes_upload_when_the_row_is_not_written() {
        let storage = Arc::new(MemoryStorage::default());
        let st = AppState::fake_with_storage(storage.clone());

        let res = add_item(
            &st,
            NewGalleryItem {
                image: UploadItem {
                    body: Bytes::from_static(b"webp"),
                    content_type: "image/webp".into(),
                },
                status: ItemStatus::Active,
                place_order: Some(1),
            },
        )
        .await;

        assert!(matches!(res, Err(AppError::Backend { .. })));
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn add_fails_cleanly_when_the_upload_fails() {
        let storage = Arc::new(MemoryStorage::default());
        storage.fail_on("gallery/");
        let st = AppState::fake_with_storage(storage.clone());

        let res = add_item(
            &st,
            NewGalleryItem {
                image: UploadItem {
                    body: Bytes::from_static(b"jpeg"),
                    content_type: "image/jpeg".into(),
                },
                status: ItemStatus::Inactive,
                place_order: None,
            },
        )
        .await;

        assert!(matches!(res, Err(AppError::Backend { .. })));
        assert!(storage.keys().is_empty());
    }
}
