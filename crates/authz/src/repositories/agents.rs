use shared::error::{Error, Result};
use shared::models::Agent;
use shared::DbPool;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

pub struct AgentRepository;

impl AgentRepository {
    pub async fn create_with_executor<'e, E>(
        executor: E,
        tenant_id: Uuid,
        name: &str,
        provider_id: Option<&str>,
    ) -> Result<Agent>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (id, tenant_id, name, provider_id, enabled, created_at)
            VALUES ($1, $2, $3, $4, true, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .bind(provider_id)
        .bind(chrono::Utc::now())
        .fetch_one(executor)
        .await?;

        Ok(agent)
    }

    pub async fn get(pool: &DbPool, agent_id: Uuid) -> Result<Agent> {
        sqlx::query_as::<_, Agent>(r#"SELECT * FROM agents WHERE id = $1"#)
            .bind(agent_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| Error::not_found("Agent", agent_id.to_string()))
    }

    pub async fn find_by_tenant_and_name(
        pool: &DbPool,
        tenant_id: Uuid,
        name: &str,
    ) -> Result<Option<Agent>> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"SELECT * FROM agents WHERE tenant_id = $1 AND lower(name) = lower($2)"#,
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(agent)
    }

    pub async fn list_for_tenant(pool: &DbPool, tenant_id: Uuid) -> Result<Vec<Agent>> {
        let agents = sqlx::query_as::<_, Agent>(
            r#"SELECT * FROM agents WHERE tenant_id = $1 AND enabled = true ORDER BY name"#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(agents)
    }

    /// Every agent in `tenant_ids`, used by AgentRouter (C12) to build the
    /// caller's reachable agent set across every tenant they can access.
    pub async fn list_for_tenants(pool: &DbPool, tenant_ids: &[Uuid]) -> Result<Vec<Agent>> {
        if tenant_ids.is_empty() {
            return Ok(Vec::new());
        }
        let agents = sqlx::query_as::<_, Agent>(
            r#"SELECT * FROM agents WHERE tenant_id = ANY($1) AND enabled = true ORDER BY name"#,
        )
        .bind(tenant_ids)
        .fetch_all(pool)
        .await?;

        Ok(agents)
    }
}
