use tracing::{info, warn};
use uuid::Uuid;

use super::relocate::{relocate_images, Relocation};
use super::repo::{self, MenuItem, MenuRow};
use crate::categories::repo::{self as categories_repo, Category};
use crate::error::{AppError, AppResult, OrBackend};
use crate::images::paths::menu_folder;
use crate::images::services::{delete_best_effort, upload_images, UploadItem};
use crate::model::ItemStatus;
use crate::state::AppState;
use crate::stats::MenuStats;

pub struct NewMenuItem {
    pub name: String,
    pub price_cents: i64,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub status: ItemStatus,
    pub images: Vec<UploadItem>,
}

#[derive(Default)]
pub struct MenuPatch {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    /// `Some(None)` clears the stored description.
    pub description: Option<Option<String>>,
    pub category_id: Option<Uuid>,
    pub status: Option<ItemStatus>,
    pub new_images: Vec<UploadItem>,
    pub remove_images: Vec<String>,
}

fn validate_fields(name: &str, price_cents: i64) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("menu item name is required".into()));
    }
    if price_cents < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    Ok(())
}

/// Splits `current` into the keys to keep and the keys to drop. Every key in
/// `remove` must belong to the item.
pub(crate) fn split_images(
    current: &[String],
    remove: &[String],
) -> AppResult<(Vec<String>, Vec<String>)> {
    if let Some(unknown) = remove.iter().find(|k| !current.contains(k)) {
        return Err(AppError::Validation(format!(
            "image {unknown} does not belong to this menu item"
        )));
    }
    Ok(current
        .iter()
        .cloned()
        .partition(|k| !remove.contains(k)))
}

async fn category(st: &AppState, id: Uuid) -> AppResult<Category> {
    categories_repo::find(&st.db, id)
        .await
        .or_backend("Failed to load category")?
        .ok_or(AppError::NotFound("Category"))
}

pub async fn list_items(st: &AppState, category_id: Option<Uuid>) -> AppResult<Vec<MenuItem>> {
    repo::list(&st.db, category_id)
        .await
        .or_backend("Failed to load menu")
}

pub async fn list_public(st: &AppState) -> AppResult<Vec<MenuItem>> {
    repo::list_public(&st.db)
        .await
        .or_backend("Failed to load menu")
}

pub async fn get_item(st: &AppState, id: Uuid) -> AppResult<MenuItem> {
    repo::find(&st.db, id)
        .await
        .or_backend("Failed to load menu item")?
        .ok_or(AppError::NotFound("Menu item"))
}

/// Images are uploaded into the category folder first; the row and the
/// category's `item_count` are then written together.
pub async fn create_item(st: &AppState, new: NewMenuItem) -> AppResult<MenuItem> {
    const MSG: &str = "Failed to add menu item";
    validate_fields(&new.name, new.price_cents)?;

    let keys = upload_images(st, &menu_folder(new.category_id), new.images)
        .await
        .or_backend("Failed to upload menu images")?;

    let written = async {
        let mut tx = st.db.begin().await.or_backend(MSG)?;
        let cat = categories_repo::find_tx(&mut tx, new.category_id)
            .await
            .or_backend(MSG)?
            .ok_or(AppError::NotFound("Category"))?;
        let row = MenuRow {
            name: new.name.trim(),
            price_cents: new.price_cents,
            description: new.description.as_deref(),
            category_id: cat.id,
            category_name: &cat.name,
            images: &keys,
            status: new.status,
        };
        let item = repo::insert_tx(&mut tx, Uuid::new_v4(), &row)
            .await
            .or_backend(MSG)?;
        categories_repo::adjust_item_count_tx(&mut tx, cat.id, 1)
            .await
            .or_backend(MSG)?;
        tx.commit().await.or_backend(MSG)?;
        Ok::<_, AppError>(item)
    }
    .await;

    match written {
        Ok(item) => {
            info!(id = %item.id, category = %item.category_name, images = keys.len(), "menu item added");
            Ok(item)
        }
        Err(e) => {
            warn!(images = keys.len(), "menu item not written; removing uploaded images");
            delete_best_effort(st, &keys).await;
            Err(e)
        }
    }
}

/// Image keys prepared for a row write: new uploads plus, when the item
/// changes category, copies of the kept images in the new folder.
struct StagedImages {
    images: Vec<String>,
    uploaded: Vec<String>,
    relocation: Option<Relocation>,
}

impl StagedImages {
    /// The row now points at the staged keys; drop the relocated originals.
    async fn finish(self, st: &AppState) {
        if let Some(relocation) = self.relocation {
            relocation.finish(st).await;
        }
    }

    /// The row still points at the old keys; drop everything staged.
    async fn abandon(self, st: &AppState) {
        delete_best_effort(st, &self.uploaded).await;
        if let Some(relocation) = self.relocation {
            relocation.discard(st).await;
        }
    }
}

/// Uploads first, so a failed upload leaves the stored images untouched.
async fn stage_images(
    st: &AppState,
    kept: &[String],
    folder: &str,
    moving: bool,
    new_images: Vec<UploadItem>,
) -> AppResult<StagedImages> {
    let uploaded = upload_images(st, folder, new_images)
        .await
        .or_backend("Failed to upload menu images")?;
    let relocation = if moving {
        Some(relocate_images(st, kept, folder).await)
    } else {
        None
    };
    let mut images = match &relocation {
        Some(r) => r.keys().to_vec(),
        None => kept.to_vec(),
    };
    images.extend(uploaded.iter().cloned());
    Ok(StagedImages {
        images,
        uploaded,
        relocation,
    })
}

/// Applies a patch. When the category changes, existing images are copied
/// into the new category folder; the originals are removed only once the
/// row points at the copies. Images that could not be copied keep their
/// old key.
pub async fn update_item(st: &AppState, id: Uuid, patch: MenuPatch) -> AppResult<MenuItem> {
    const MSG: &str = "Failed to update menu item";
    let existing = get_item(st, id).await?;

    let name = patch.name.as_deref().unwrap_or(&existing.name).trim().to_string();
    let price_cents = patch.price_cents.unwrap_or(existing.price_cents);
    validate_fields(&name, price_cents)?;
    let (kept, removed) = split_images(&existing.images, &patch.remove_images)?;

    let target = match patch.category_id {
        Some(cid) if cid != existing.category_id => Some(category(st, cid).await?),
        _ => None,
    };
    let (category_id, category_name) = match &target {
        Some(cat) => (cat.id, cat.name.clone()),
        None => (existing.category_id, existing.category_name.clone()),
    };

    let staged = stage_images(
        st,
        &kept,
        &menu_folder(category_id),
        target.is_some(),
        patch.new_images,
    )
    .await?;

    let description = patch.description.unwrap_or_else(|| existing.description.clone());
    let row = MenuRow {
        name: &name,
        price_cents,
        description: description.as_deref(),
        category_id,
        category_name: &category_name,
        images: &staged.images,
        status: patch.status.unwrap_or(existing.status),
    };
    let written = async {
        let mut tx = st.db.begin().await.or_backend(MSG)?;
        let item = repo::update_tx(&mut tx, id, &row).await.or_backend(MSG)?;
        if category_id != existing.category_id {
            categories_repo::adjust_item_count_tx(&mut tx, existing.category_id, -1)
                .await
                .or_backend(MSG)?;
            categories_repo::adjust_item_count_tx(&mut tx, category_id, 1)
                .await
                .or_backend(MSG)?;
        }
        tx.commit().await.or_backend(MSG)?;
        Ok::<_, AppError>(item)
    }
    .await;

    let item = match written {
        Ok(item) => item,
        Err(e) => {
            warn!(%id, staged = staged.images.len(), "menu item not updated; removing staged images");
            staged.abandon(st).await;
            return Err(e);
        }
    };

    let added = staged.uploaded.len();
    staged.finish(st).await;
    delete_best_effort(st, &removed).await;
    info!(
        %id,
        category = %item.category_name,
        moved = target.is_some(),
        added,
        removed = removed.len(),
        "menu item updated"
    );
    Ok(item)
}

pub async fn delete_item(st: &AppState, id: Uuid) -> AppResult<()> {
    const MSG: &str = "Failed to delete menu item";
    let mut tx = st.db.begin().await.or_backend(MSG)?;
    let item = repo::delete_tx(&mut tx, id)
        .await
        .or_backend(MSG)?
        .ok_or(AppError::NotFound("Menu item"))?;
    categories_repo::adjust_item_count_tx(&mut tx, item.category_id, -1)
        .await
        .or_backend(MSG)?;
    tx.commit().await.or_backend(MSG)?;

    delete_best_effort(st, &item.images).await;
    info!(%id, name = %item.name, "menu item deleted");
    Ok(())
}

pub async fn stats(st: &AppState) -> AppResult<MenuStats> {
    let rows = repo::status_rows(&st.db)
        .await
        .or_backend("Failed to load menu statistics")?;
    Ok(MenuStats::tally(rows))
}
