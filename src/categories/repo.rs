use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::ItemStatus;
use crate::ordering::{Change, Slot};

const ORDERING_LOCK: i64 = 0x6361_7465_676f_7279;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub place_order: i32,
    pub status: ItemStatus,
    pub item_count: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str =
    "id, name, description, place_order, status, item_count, created_at, updated_at";

pub async fn list(db: &PgPool, only_active: bool) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE ($1 = FALSE OR status = 'active') ORDER BY place_order ASC"
    ))
    .bind(only_active)
    .fetch_all(db)
    .await
    .context("list categories")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find category")?;
    Ok(row)
}

/// Reads the category and holds it against concurrent deletes until the
/// transaction ends.
pub async fn find_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE id = $1 FOR SHARE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("find category")?;
    Ok(row)
}

pub async fn statuses(db: &PgPool) -> anyhow::Result<Vec<ItemStatus>> {
    let rows: Vec<(ItemStatus,)> = sqlx::query_as("SELECT status FROM categories")
        .fetch_all(db)
        .await
        .context("list category statuses")?;
    Ok(rows.into_iter().map(|(s,)| s).collect())
}

pub async fn lock_ordering_tx(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(ORDERING_LOCK)
        .execute(&mut **tx)
        .await
        .context("lock category ordering")?;
    Ok(())
}

pub async fn ordering_tx(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<Vec<Slot>> {
    let rows: Vec<(Uuid, i32)> =
        sqlx::query_as("SELECT id, place_order FROM categories ORDER BY place_order ASC")
            .fetch_all(&mut **tx)
            .await
            .context("read category ordering")?;
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
        sqlx::query("UPDATE categories SET place_order = $2, updated_at = now() WHERE id = $1")
            .bind(c.id)
            .bind(c.place_order)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("set place_order of category {}", c.id))?;
    }
    Ok(())
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    description: Option<&str>,
    place_order: i32,
    status: ItemStatus,
) -> anyhow::Result<Category> {
    let row = sqlx::query_as::<_, Category>(&format!(
        r#"
        INSERT INTO categories (id, name, description, place_order, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .bind(place_order)
    .bind(status)
    .fetch_one(&mut **tx)
    .await
    .context("insert category")?;
    Ok(row)
}

/// `None` arguments keep the stored value; `Some(None)` clears the
/// description.
pub async fn update_fields_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    name: Option<&str>,
    description: Option<Option<&str>>,
    status: Option<ItemStatus>,
) -> anyhow::Result<Category> {
    let row = sqlx::query_as::<_, Category>(&format!(
        r#"
        UPDATE categories
           SET name = COALESCE($2, name),
               description = CASE WHEN $5 THEN $3 ELSE description END,
               status = COALESCE($4, status),
               updated_at = now()
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(description.flatten())
    .bind(status)
    .bind(description.is_some())
    .fetch_one(&mut **tx)
    .await
    .context("update category")?;
    Ok(row)
}

/// Copies the category name onto its menu items.
pub async fn cascade_name_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    name: &str,
) -> anyhow::Result<u64> {
    let res = sqlx::query(
        "UPDATE menu_items SET category_name = $2, updated_at = now() WHERE category_id = $1",
    )
    .bind(id)
    .bind(name)
    .execute(&mut **tx)
    .await
    .context("cascade category name")?;
    Ok(res.rows_affected())
}

pub async fn adjust_item_count_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    delta: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE categories SET item_count = GREATEST(item_count + $2, 0), updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("adjust item_count of category {}", id))?;
    Ok(())
}

/// Deletes the category unless menu items still point at it. Returns the
/// order it held, `None` when it did not exist.
pub async fn delete_empty_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        DELETE FROM categories c
         WHERE c.id = $1
           AND NOT EXISTS (SELECT 1 FROM menu_items m WHERE m.category_id = c.id)
        RETURNING c.place_order
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("delete category")?;
    Ok(row.map(|(o,)| o))
}
