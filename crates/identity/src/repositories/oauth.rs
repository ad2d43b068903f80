use chrono::{DateTime, Utc};
use shared::error::{Error, Result};
use shared::models::UserOAuth;
use shared::DbPool;
use uuid::Uuid;

pub struct OAuthCredentialRepository;

impl OAuthCredentialRepository {
    /// Upsert keyed on (user_id, provider_id): a re-auth with the same
    /// provider replaces the stored tokens rather than duplicating the row.
    pub async fn upsert(
        pool: &DbPool,
        user_id: Uuid,
        provider_id: &str,
        account_name: Option<&str>,
        access_token: &str,
        refresh_token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<UserOAuth> {
        let cred = sqlx::query_as::<_, UserOAuth>(
            r#"
            INSERT INTO user_oauth (
                id, user_id, provider_id, account_name, access_token,
                refresh_token, token_expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, provider_id) DO UPDATE SET
                account_name = EXCLUDED.account_name,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                token_expires_at = EXCLUDED.token_expires_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(provider_id)
        .bind(account_name)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expires_at)
        .fetch_one(pool)
        .await?;

        Ok(cred)
    }

    pub async fn find(pool: &DbPool, user_id: Uuid, provider_id: &str) -> Result<Option<UserOAuth>> {
        let cred = sqlx::query_as::<_, UserOAuth>(
            r#"SELECT * FROM user_oauth WHERE user_id = $1 AND provider_id = $2"#,
        )
        .bind(user_id)
        .bind(provider_id)
        .fetch_optional(pool)
        .await?;

        Ok(cred)
    }

    pub async fn get(pool: &DbPool, user_id: Uuid, provider_id: &str) -> Result<UserOAuth> {
        Self::find(pool, user_id, provider_id)
            .await?
            .ok_or_else(|| Error::not_found("UserOAuth", format!("{user_id}:{provider_id}")))
    }

    /// Refresh sweep target: every credential expiring within `within`.
    pub async fn expiring_within(
        pool: &DbPool,
        within: chrono::Duration,
    ) -> Result<Vec<UserOAuth>> {
        let threshold = Utc::now() + within;
        let creds = sqlx::query_as::<_, UserOAuth>(
            r#"SELECT * FROM user_oauth WHERE token_expires_at <= $1"#,
        )
        .bind(threshold)
        .fetch_all(pool)
        .await?;

        Ok(creds)
    }

    pub async fn update_tokens(
        pool: &DbPool,
        user_id: Uuid,
        provider_id: &str,
        access_token: &str,
        refresh_token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<UserOAuth> {
        sqlx::query_as::<_, UserOAuth>(
            r#"
            UPDATE user_oauth SET
                access_token = $3,
                refresh_token = $4,
                token_expires_at = $5
            WHERE user_id = $1 AND provider_id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(provider_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expires_at)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::not_found("UserOAuth", format!("{user_id}:{provider_id}")))
    }

    pub async fn delete(pool: &DbPool, user_id: Uuid, provider_id: &str) -> Result<()> {
        sqlx::query(r#"DELETE FROM user_oauth WHERE user_id = $1 AND provider_id = $2"#)
            .bind(user_id)
            .bind(provider_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Daily sweep target: delete every credential that has been expired for
    /// longer than `older_than`.
    pub async fn purge_expired_before(pool: &DbPool, older_than: chrono::Duration) -> Result<u64> {
        let cutoff = Utc::now() - older_than;
        let result = sqlx::query(r#"DELETE FROM user_oauth WHERE token_expires_at < $1"#)
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
