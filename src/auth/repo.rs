pub use crate::auth::repo_types::Admin;
use sqlx::PgPool;
use uuid::Uuid;

const BOOTSTRAP_LOCK: i64 = 0x6164_6d69_6e73;

impl Admin {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(admin)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(admin)
    }

    /// Create the admin record for a freshly hashed identity.
    pub async fn create(db: &PgPool, email: &str, password_hash: &str) -> anyhow::Result<Admin> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(admin)
    }

    /// Creates the admin only while the table is empty. Concurrent callers
    /// are serialized, so at most one of them gets through.
    pub async fn create_first(
        db: &PgPool,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<Admin>> {
        let mut tx = db.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(BOOTSTRAP_LOCK)
            .execute(&mut *tx)
            .await?;
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (email, password_hash)
            SELECT $1, $2
             WHERE NOT EXISTS (SELECT 1 FROM admins)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(admin)
    }
}
