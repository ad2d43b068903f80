use shared::error::{Error, Result};
use shared::models::User;
use shared::DbPool;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

pub struct UserRepository;

impl UserRepository {
    pub async fn create_with_executor<'e, E>(
        executor: E,
        email: &str,
        mfa_seed: &str,
    ) -> Result<User>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, mfa_seed, verify_mfa, is_active, created_at)
            VALUES ($1, $2, $3, false, false, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.to_lowercase())
        .bind(mfa_seed)
        .bind(chrono::Utc::now())
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email.to_lowercase())
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &DbPool, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get(pool: &DbPool, user_id: Uuid) -> Result<User> {
        Self::find_by_id(pool, user_id)
            .await?
            .ok_or_else(|| Error::not_found("User", user_id.to_string()))
    }

    pub async fn set_active(pool: &DbPool, user_id: Uuid, is_active: bool) -> Result<User> {
        Self::set_active_with_executor(pool, user_id, is_active).await
    }

    /// Same as `set_active` but generic over any executor, so invitation
    /// acceptance can reactivate a dormant user in the same transaction
    /// that creates their new Membership.
    pub async fn set_active_with_executor<'e, E>(
        executor: E,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<User>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"UPDATE users SET is_active = $2 WHERE id = $1 RETURNING *"#,
        )
        .bind(user_id)
        .bind(is_active)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Reset regenerates the MFA seed and marks `verify_mfa = false`.
    pub async fn reset_mfa_seed(pool: &DbPool, user_id: Uuid, new_seed: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"UPDATE users SET mfa_seed = $2, verify_mfa = false WHERE id = $1 RETURNING *"#,
        )
        .bind(user_id)
        .bind(new_seed)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn mark_mfa_verified(pool: &DbPool, user_id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"UPDATE users SET verify_mfa = true WHERE id = $1 RETURNING *"#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }
}
