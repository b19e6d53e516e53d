use tracing::info;
use uuid::Uuid;

use super::repo::{self, Category};
use crate::error::{AppError, AppResult, OrBackend};
use crate::model::ItemStatus;
use crate::ordering;
use crate::state::AppState;
use crate::stats::StatusCounts;

pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub status: ItemStatus,
}

#[derive(Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    /// A blank description clears the stored one.
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
    pub place_order: Option<i32>,
}

fn clean_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("category name is required".into()));
    }
    Ok(name)
}

/// `None` keeps the stored description, `Some(None)` clears it.
fn description_change(description: Option<&str>) -> Option<Option<&str>> {
    description.map(|d| Some(d.trim()).filter(|d| !d.is_empty()))
}

pub async fn list(st: &AppState, only_active: bool) -> AppResult<Vec<Category>> {
    repo::list(&st.db, only_active)
        .await
        .or_backend("Failed to load categories")
}

pub async fn get(st: &AppState, id: Uuid) -> AppResult<Category> {
    repo::find(&st.db, id)
        .await
        .or_backend("Failed to load category")?
        .ok_or(AppError::NotFound("Category"))
}

/// New categories go after the last one.
pub async fn create(st: &AppState, new: NewCategory) -> AppResult<Category> {
    const MSG: &str = "Failed to create category";
    let name = clean_name(&new.name)?;

    let mut tx = st.db.begin().await.or_backend(MSG)?;
    repo::lock_ordering_tx(&mut tx).await.or_backend(MSG)?;
    let slots = repo::ordering_tx(&mut tx).await.or_backend(MSG)?;
    let (place_order, _) = ordering::plan_insert(&slots, None)?;
    let category = repo::insert_tx(
        &mut tx,
        name,
        description_change(new.description.as_deref()).flatten(),
        place_order,
        new.status,
    )
    .await
    .or_backend(MSG)?;
    tx.commit().await.or_backend(MSG)?;

    info!(id = %category.id, name = %category.name, "category created");
    Ok(category)
}

/// A rename is copied onto every menu item of the category in the same
/// transaction. A new `place_order` swaps with the current holder.
pub async fn update(st: &AppState, id: Uuid, patch: CategoryPatch) -> AppResult<Category> {
    const MSG: &str = "Failed to update category";
    let name = patch.name.as_deref().map(clean_name).transpose()?;
    let existing = get(st, id).await?;

    let mut tx = st.db.begin().await.or_backend(MSG)?;
    if let Some(target) = patch.place_order {
        repo::lock_ordering_tx(&mut tx).await.or_backend(MSG)?;
        let slots = repo::ordering_tx(&mut tx).await.or_backend(MSG)?;
        let changes = ordering::plan_swap(&slots, id, target)?;
        repo::apply_changes_tx(&mut tx, &changes).await.or_backend(MSG)?;
    }
    let category = repo::update_fields_tx(
        &mut tx,
        id,
        name,
        description_change(patch.description.as_deref()),
        patch.status,
    )
    .await
    .or_backend(MSG)?;
    if category.name != existing.name {
        let touched = repo::cascade_name_tx(&mut tx, id, &category.name)
            .await
            .or_backend(MSG)?;
        info!(%id, from = %existing.name, to = %category.name, touched, "category renamed");
    }
    tx.commit().await.or_backend(MSG)?;
    Ok(category)
}

/// Refuses while menu items still reference the category.
pub async fn delete(st: &AppState, id: Uuid) -> AppResult<()> {
    const MSG: &str = "Failed to delete category";
    let existing = get(st, id).await?;

    let mut tx = st.db.begin().await.or_backend(MSG)?;
    repo::lock_ordering_tx(&mut tx).await.or_backend(MSG)?;
    let Some(deleted_order) = repo::delete_empty_tx(&mut tx, id).await.or_backend(MSG)? else {
        return Err(AppError::Conflict(format!(
            "category {} still has menu items",
            existing.name
        )));
    };
    let remaining = repo::ordering_tx(&mut tx).await.or_backend(MSG)?;
    let changes = ordering::plan_close_gap(&remaining, deleted_order);
    repo::apply_changes_tx(&mut tx, &changes).await.or_backend(MSG)?;
    tx.commit().await.or_backend(MSG)?;

    info!(%id, name = %existing.name, "category deleted");
    Ok(())
}

pub async fn stats(st: &AppState) -> AppResult<StatusCounts> {
    let statuses = repo::statuses(&st.db)
        .await
        .or_backend("Failed to load category statistics")?;
    Ok(StatusCounts::tally(statuses))
}
