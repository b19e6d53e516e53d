use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;

use crate::model::HomeSectionType;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HomeSection {
    pub section_type: HomeSectionType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_key: Option<String>,
    pub updated_at: OffsetDateTime,
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<HomeSection>> {
    let rows = sqlx::query_as::<_, HomeSection>(
        "SELECT section_type, title, description, image_key, updated_at FROM home_sections",
    )
    .fetch_all(db)
    .await
    .context("list home sections")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, section: HomeSectionType) -> anyhow::Result<Option<HomeSection>> {
    let row = sqlx::query_as::<_, HomeSection>(
        r#"
        SELECT section_type, title, description, image_key, updated_at
          FROM home_sections
         WHERE section_type = $1
        "#,
    )
    .bind(section)
    .fetch_optional(db)
    .await
    .context("find home section")?;
    Ok(row)
}

/// Stored image key of the section, locking the row until the transaction
/// ends.
pub async fn image_key_tx(
    tx: &mut Transaction<'_, Postgres>,
    section: HomeSectionType,
) -> anyhow::Result<Option<String>> {
    let row: Option<(Option<String>,)> = sqlx::query_as(
        "SELECT image_key FROM home_sections WHERE section_type = $1 FOR UPDATE",
    )
    .bind(section)
    .fetch_optional(&mut **tx)
    .await
    .context("read home section image")?;
    Ok(row.and_then(|(k,)| k))
}

/// Inserts or overwrites the section. For `title` and `description`, `None`
/// keeps the stored value and `Some(None)` clears it; a `None` image keeps
/// the stored one.
pub async fn upsert_tx(
    tx: &mut Transaction<'_, Postgres>,
    section: HomeSectionType,
    title: Option<Option<&str>>,
    description: Option<Option<&str>>,
    image_key: Option<&str>,
) -> anyhow::Result<HomeSection> {
    let row = sqlx::query_as::<_, HomeSection>(
        r#"
        INSERT INTO home_sections (section_type, title, description, image_key)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (section_type) DO UPDATE
           SET title = CASE WHEN $5 THEN EXCLUDED.title ELSE home_sections.title END,
               description = CASE WHEN $6 THEN EXCLUDED.description ELSE home_sections.description END,
               image_key = COALESCE(EXCLUDED.image_key, home_sections.image_key),
               updated_at = now()
        RETURNING section_type, title, description, image_key, updated_at
        "#,
    )
    .bind(section)
    .bind(title.flatten())
    .bind(description.flatten())
    .bind(image_key)
    .bind(title.is_some())
    .bind(description.is_some())
    .fetch_one(&mut **tx)
    .await
    .context("upsert home section")?;
    Ok(row)
}
