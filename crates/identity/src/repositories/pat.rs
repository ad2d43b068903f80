use chrono::{DateTime, Utc};
use shared::error::{Error, Result};
use shared::models::PersonalAccessToken;
use shared::DbPool;
use uuid::Uuid;

pub struct PatRepository;

impl PatRepository {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &DbPool,
        user_id: Uuid,
        name: &str,
        token_prefix: &str,
        token_hash: &str,
        scopes: serde_json::Value,
        agent_ids: serde_json::Value,
        company_ids: serde_json::Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<PersonalAccessToken> {
        let pat = sqlx::query_as::<_, PersonalAccessToken>(
            r#"
            INSERT INTO personal_access_tokens (
                id, user_id, name, token_prefix, token_hash, scopes,
                agent_ids, company_ids, expires_at, is_revoked, last_used_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, NULL, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(token_prefix)
        .bind(token_hash)
        .bind(scopes)
        .bind(agent_ids)
        .bind(company_ids)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(pat)
    }

    /// Deterministic PBKDF2 lookup: since `token_hash` is derived
    /// deterministically from the raw token, an equality lookup is enough
    /// (no need to scan and re-hash every row).
    pub async fn find_by_hash(pool: &DbPool, token_hash: &str) -> Result<Option<PersonalAccessToken>> {
        let pat = sqlx::query_as::<_, PersonalAccessToken>(
            r#"SELECT * FROM personal_access_tokens WHERE token_hash = $1"#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(pat)
    }

    pub async fn get(pool: &DbPool, pat_id: Uuid) -> Result<PersonalAccessToken> {
        sqlx::query_as::<_, PersonalAccessToken>(
            r#"SELECT * FROM personal_access_tokens WHERE id = $1"#,
        )
        .bind(pat_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::not_found("PersonalAccessToken", pat_id.to_string()))
    }

    pub async fn list_for_user(pool: &DbPool, user_id: Uuid) -> Result<Vec<PersonalAccessToken>> {
        let pats = sqlx::query_as::<_, PersonalAccessToken>(
            r#"SELECT * FROM personal_access_tokens WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(pats)
    }

    pub async fn revoke(pool: &DbPool, pat_id: Uuid) -> Result<PersonalAccessToken> {
        sqlx::query_as::<_, PersonalAccessToken>(
            r#"UPDATE personal_access_tokens SET is_revoked = true WHERE id = $1 RETURNING *"#,
        )
        .bind(pat_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::not_found("PersonalAccessToken", pat_id.to_string()))
    }

    pub async fn touch_last_used(pool: &DbPool, pat_id: Uuid) -> Result<()> {
        sqlx::query(r#"UPDATE personal_access_tokens SET last_used_at = $2 WHERE id = $1"#)
            .bind(pat_id)
            .bind(Utc::now())
            .execute(pool)
            .await?;

        Ok(())
    }
}
