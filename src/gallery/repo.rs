use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::ItemStatus;
use crate::ordering::{Change, Slot};

/// Serializes every statement that rewrites `place_order`.
const ORDERING_LOCK: i64 = 0x6761_6c6c_6572_79;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GalleryItem {
    pub id: Uuid,
    pub image_key: String,
    pub place_order: i32,
    pub status: ItemStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub async fn list(db: &PgPool, only_active: bool) -> anyhow::Result<Vec<GalleryItem>> {
    let rows = sqlx::query_as::<_, GalleryItem>(
        r#"
        SELECT id, image_key, place_order, status, created_at, updated_at
          FROM gallery_items
         WHERE ($1 = FALSE OR status = 'active')
         ORDER BY place_order ASC
        "#,
    )
    .bind(only_active)
    .fetch_all(db)
    .await
    .context("list gallery items")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<GalleryItem>> {
    let row = sqlx::query_as::<_, GalleryItem>(
        r#"
        SELECT id, image_key, place_order, status, created_at, updated_at
          FROM gallery_items
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find gallery item")?;
    Ok(row)
}

pub async fn statuses(db: &PgPool) -> anyhow::Result<Vec<ItemStatus>> {
    let rows: Vec<(ItemStatus,)> = sqlx::query_as("SELECT status FROM gallery_items")
        .fetch_all(db)
        .await
        .context("list gallery statuses")?;
    Ok(rows.into_iter().map(|(s,)| s).collect())
}

/// Held until the transaction ends.
pub async fn lock_ordering_tx(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(ORDERING_LOCK)
        .execute(&mut **tx)
        .await
        .context("lock gallery ordering")?;
    Ok(())
}

pub async fn ordering_tx(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<Vec<Slot>> {
    let rows: Vec<(Uuid, i32)> =
        sqlx::query_as("SELECT id, place_order FROM gallery_items ORDER BY place_order ASC")
            .fetch_all(&mut **tx)
            .await
            .context("read gallery ordering")?;
    Ok(rows
        .into_iter()
        .map(|(id, place_order)| Slot { id, place_order })
        .collect())
}

pub async fn apply_changes_tx(
    tx: &mut Transaction<'_, Postgres>,
    changes: &[Change],
) -> anyhow::Result<()> {
    for c in changes {
        sqlx::query(
            "UPDATE gallery_items SET place_order = $2, updated_at = now() WHERE id = $1",
        )
        .bind(c.id)
        .bind(c.place_order)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("set place_order of {}", c.id))?;
    }
    Ok(())
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    image_key: &str,
    place_order: i32,
    status: ItemStatus,
) -> anyhow::Result<GalleryItem> {
    let row = sqlx::query_as::<_, GalleryItem>(
        r#"
        INSERT INTO gallery_items (id, image_key, place_order, status)
        VALUES ($1, $2, $3, $4)
        RETURNING id, image_key, place_order, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(image_key)
    .bind(place_order)
    .bind(status)
    .fetch_one(&mut **tx)
    .await
    .context("insert gallery item")?;
    Ok(row)
}

pub async fn update_fields_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: Option<ItemStatus>,
    image_key: Option<&str>,
) -> anyhow::Result<GalleryItem> {
    let row = sqlx::query_as::<_, GalleryItem>(
        r#"
        UPDATE gallery_items
           SET status = COALESCE($2, status),
               image_key = COALESCE($3, image_key),
               updated_at = now()
         WHERE id = $1
        RETURNING id, image_key, place_order, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(image_key)
    .fetch_one(&mut **tx)
    .await
    .context("update gallery item")?;
    Ok(row)
}

/// Deletes the row and returns the order and image key it held.
pub async fn delete_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<(i32, String)>> {
    let row: Option<(i32, String)> =
        sqlx::query_as("DELETE FROM gallery_items WHERE id = $1 RETURNING place_order, image_key")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .context("delete gallery item")?;
    Ok(row)
}
