use shared::error::{Error, Result};
use shared::models::Tenant;
use shared::DbPool;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

pub struct TenantRepository;

impl TenantRepository {
    pub async fn create_with_executor<'e, E>(
        executor: E,
        name: &str,
        parent_id: Option<Uuid>,
        agent_name: &str,
    ) -> Result<Tenant>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (
                id, name, parent_id, agent_name, token_balance, token_balance_usd,
                tokens_used_total, user_limit, last_low_balance_warning,
                last_low_balance_warning_tokens_used, training_data,
                status, pricing_mode, token_price_per_million_usd, created_at
            )
            VALUES ($1, $2, $3, $4, 0, 0, 0, 0, NULL, NULL, NULL, false, 'per_token', 0, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(parent_id)
        .bind(agent_name)
        .bind(chrono::Utc::now())
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    pub async fn find_by_id(pool: &DbPool, tenant_id: Uuid) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(r#"SELECT * FROM tenants WHERE id = $1"#)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;

        Ok(tenant)
    }

    pub async fn get(pool: &DbPool, tenant_id: Uuid) -> Result<Tenant> {
        Self::find_by_id(pool, tenant_id)
            .await?
            .ok_or_else(|| Error::not_found("Tenant", tenant_id.to_string()))
    }

    pub async fn children(pool: &DbPool, tenant_id: Uuid) -> Result<Vec<Tenant>> {
        let children =
            sqlx::query_as::<_, Tenant>(r#"SELECT * FROM tenants WHERE parent_id = $1"#)
                .bind(tenant_id)
                .fetch_all(pool)
                .await?;

        Ok(children)
    }

    /// Canonical update: every optional field, widest-signature version
    /// (the Open Questions resolution — no separate narrow-signature
    /// overload is defined).
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        pool: &DbPool,
        tenant_id: Uuid,
        name: Option<&str>,
        agent_name: Option<&str>,
        token_balance: Option<i64>,
        token_balance_usd: Option<f64>,
        tokens_used_total: Option<i64>,
        user_limit: Option<i32>,
        status: Option<bool>,
        last_low_balance_warning: Option<chrono::DateTime<chrono::Utc>>,
        last_low_balance_warning_tokens_used: Option<i64>,
    ) -> Result<Tenant> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants SET
                name = COALESCE($2, name),
                agent_name = COALESCE($3, agent_name),
                token_balance = COALESCE($4, token_balance),
                token_balance_usd = COALESCE($5, token_balance_usd),
                tokens_used_total = COALESCE($6, tokens_used_total),
                user_limit = COALESCE($7, user_limit),
                status = COALESCE($8, status),
                last_low_balance_warning = COALESCE($9, last_low_balance_warning),
                last_low_balance_warning_tokens_used = COALESCE($10, last_low_balance_warning_tokens_used)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(agent_name)
        .bind(token_balance)
        .bind(token_balance_usd)
        .bind(tokens_used_total)
        .bind(user_limit)
        .bind(status)
        .bind(last_low_balance_warning)
        .bind(last_low_balance_warning_tokens_used)
        .fetch_one(pool)
        .await?;

        Ok(tenant)
    }

    /// Same columns as `update`, generic over `Executor` so callers holding
    /// a row lock (`get_for_update`) can write the balance on the same
    /// transaction instead of a separate pooled connection.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_with_executor<'e, E>(
        executor: E,
        tenant_id: Uuid,
        name: Option<&str>,
        agent_name: Option<&str>,
        token_balance: Option<i64>,
        token_balance_usd: Option<f64>,
        tokens_used_total: Option<i64>,
        user_limit: Option<i32>,
        status: Option<bool>,
        last_low_balance_warning: Option<chrono::DateTime<chrono::Utc>>,
        last_low_balance_warning_tokens_used: Option<i64>,
    ) -> Result<Tenant>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants SET
                name = COALESCE($2, name),
                agent_name = COALESCE($3, agent_name),
                token_balance = COALESCE($4, token_balance),
                token_balance_usd = COALESCE($5, token_balance_usd),
                tokens_used_total = COALESCE($6, tokens_used_total),
                user_limit = COALESCE($7, user_limit),
                status = COALESCE($8, status),
                last_low_balance_warning = COALESCE($9, last_low_balance_warning),
                last_low_balance_warning_tokens_used = COALESCE($10, last_low_balance_warning_tokens_used)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(agent_name)
        .bind(token_balance)
        .bind(token_balance_usd)
        .bind(tokens_used_total)
        .bind(user_limit)
        .bind(status)
        .bind(last_low_balance_warning)
        .bind(last_low_balance_warning_tokens_used)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    /// Row-locking read used by `BillingGate::debit` to serialise usage
    /// debits per root tenant.
    pub async fn get_for_update<'e, E>(executor: E, tenant_id: Uuid) -> Result<Tenant>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant =
            sqlx::query_as::<_, Tenant>(r#"SELECT * FROM tenants WHERE id = $1 FOR UPDATE"#)
                .bind(tenant_id)
                .fetch_optional(executor)
                .await?
                .ok_or_else(|| Error::not_found("Tenant", tenant_id.to_string()))?;

        Ok(tenant)
    }

    /// Cascading delete: memberships, invitations, usage, PATs, custom
    /// roles, child-tenant parent-clearing — all within one transaction.
    pub async fn delete_cascade(pool: &DbPool, tenant_id: Uuid) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query(r#"UPDATE tenants SET parent_id = NULL WHERE parent_id = $1"#)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM memberships WHERE tenant_id = $1"#)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM invitations WHERE tenant_id = $1"#)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM token_usage WHERE tenant_id = $1"#)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"DELETE FROM personal_access_tokens WHERE user_id IN
               (SELECT user_id FROM memberships WHERE tenant_id = $1)"#,
        )
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(r#"DELETE FROM custom_roles WHERE tenant_id = $1"#)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM tenants WHERE id = $1"#)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
