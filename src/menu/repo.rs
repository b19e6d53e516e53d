use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::ItemStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub category_name: String,
    pub images: Vec<String>,
    pub status: ItemStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, price_cents, description, category_id, category_name, images, status, created_at, updated_at";

pub async fn list(db: &PgPool, category_id: Option<Uuid>) -> anyhow::Result<Vec<MenuItem>> {
    let rows = sqlx::query_as::<_, MenuItem>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM menu_items
         WHERE ($1::uuid IS NULL OR category_id = $1)
         ORDER BY category_name ASC, name ASC
        "#
    ))
    .bind(category_id)
    .fetch_all(db)
    .await
    .context("list menu items")?;
    Ok(rows)
}

/// Active items whose category is active too, in category order.
pub async fn list_public(db: &PgPool) -> anyhow::Result<Vec<MenuItem>> {
    let rows = sqlx::query_as::<_, MenuItem>(
        r#"
        SELECT m.id, m.name, m.price_cents, m.description, m.category_id, m.category_name,
               m.images, m.status, m.created_at, m.updated_at
          FROM menu_items m
          JOIN categories c ON c.id = m.category_id
         WHERE m.status = 'active' AND c.status = 'active'
         ORDER BY c.place_order ASC, m.name ASC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list public menu")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<MenuItem>> {
    let row = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find menu item")?;
    Ok(row)
}

pub async fn status_rows(db: &PgPool) -> anyhow::Result<Vec<(Uuid, String, ItemStatus)>> {
    let rows = sqlx::query_as::<_, (Uuid, String, ItemStatus)>(
        "SELECT category_id, category_name, status FROM menu_items",
    )
    .fetch_all(db)
    .await
    .context("list menu statuses")?;
    Ok(rows)
}

pub struct MenuRow<'a> {
    pub name: &'a str,
    pub price_cents: i64,
    pub description: Option<&'a str>,
    pub category_id: Uuid,
    pub category_name: &'a str,
    pub images: &'a [String],
    pub status: ItemStatus,
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    row: &MenuRow<'_>,
) -> anyhow::Result<MenuItem> {
    let item = sqlx::query_as::<_, MenuItem>(&format!(
        r#"
        INSERT INTO menu_items (id, name, price_cents, description, category_id, category_name, images, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(row.name)
    .bind(row.price_cents)
    .bind(row.description)
    .bind(row.category_id)
    .bind(row.category_name)
    .bind(row.images)
    .bind(row.status)
    .fetch_one(&mut **tx)
    .await
    .context("insert menu item")?;
    Ok(item)
}

pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    row: &MenuRow<'_>,
) -> anyhow::Result<MenuItem> {
    let item = sqlx::query_as::<_, MenuItem>(&format!(
        r#"
        UPDATE menu_items
           SET name = $2,
               price_cents = $3,
               description = $4,
               category_id = $5,
               category_name = $6,
               images = $7,
               status = $8,
               updated_at = now()
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(row.name)
    .bind(row.price_cents)
    .bind(row.description)
    .bind(row.category_id)
    .bind(row.category_name)
    .bind(row.images)
    .bind(row.status)
    .fetch_one(&mut **tx)
    .await
    .context("update menu item")?;
    Ok(item)
}

pub async fn delete_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<MenuItem>> {
    let item = sqlx::query_as::<_, MenuItem>(&format!(
        "DELETE FROM menu_items WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("delete menu item")?;
    Ok(item)
}
