use chrono::{DateTime, Utc};
use shared::error::Result;
use shared::DbPool;

pub struct BlacklistRepository;

impl BlacklistRepository {
    pub async fn insert(pool: &DbPool, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO token_blacklist (token, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn exists(pool: &DbPool, token: &str) -> Result<bool> {
        let row: Option<(i32,)> =
            sqlx::query_as(r#"SELECT 1 FROM token_blacklist WHERE token = $1 AND expires_at > $2"#)
                .bind(token)
                .bind(Utc::now())
                .fetch_optional(pool)
                .await?;

        Ok(row.is_some())
    }

    /// Daily housekeeping sweep: drop rows whose natural JWT expiry has
    /// already passed, since a blacklist entry for an already-expired
    /// token serves no purpose.
    pub async fn purge_expired(pool: &DbPool) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM token_blacklist WHERE expires_at <= $1"#)
            .bind(Utc::now())
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
