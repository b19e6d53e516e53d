use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::MessageStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub details: String,
    pub status: MessageStatus,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    name: &str,
    email: &str,
    phone: Option<&str>,
    details: &str,
) -> anyhow::Result<Message> {
    let row = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, name, email, phone, details)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, email, phone, details, status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(details)
    .fetch_one(db)
    .await
    .context("insert message")?;
    Ok(row)
}

pub async fn list(
    db: &PgPool,
    status: Option<MessageStatus>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, name, email, phone, details, status, created_at
          FROM messages
         WHERE ($1::message_status IS NULL OR status = $1)
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list messages")?;
    Ok(rows)
}

pub async fn set_status(
    db: &PgPool,
    id: Uuid,
    status: MessageStatus,
) -> anyhow::Result<Option<Message>> {
    let row = sqlx::query_as::<_, Message>(
        r#"
        UPDATE messages SET status = $2 WHERE id = $1
        RETURNING id, name, email, phone, details, status, created_at
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_optional(db)
    .await
    .context("update message status")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete message")?;
    Ok(res.rows_affected() > 0)
}

pub async fn statuses(db: &PgPool) -> anyhow::Result<Vec<MessageStatus>> {
    let rows: Vec<(MessageStatus,)> = sqlx::query_as("SELECT status FROM messages")
        .fetch_all(db)
        .await
        .context("list message statuses")?;
    Ok(rows.into_iter().map(|(s,)| s).collect())
}
