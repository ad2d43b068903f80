//! Chain/Step/ChainRun/StepResponse storage (part of C2 Store, the
//! dispatch-owned slice).

use shared::error::{Error, Result};
use shared::models::{Chain, ChainRun, ChainRunStatus, Step, StepResponse};
use shared::DbPool;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

pub struct ChainRepository;

impl ChainRepository {
    pub async fn get(pool: &DbPool, chain_id: Uuid) -> Result<Chain> {
        sqlx::query_as::<_, Chain>(r#"SELECT * FROM chains WHERE id = $1"#)
            .bind(chain_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| Error::not_found("Chain", chain_id.to_string()))
    }

    pub async fn find_by_tenant_and_name(pool: &DbPool, tenant_id: Uuid, name: &str) -> Result<Option<Chain>> {
        sqlx::query_as::<_, Chain>(
            r#"SELECT * FROM chains WHERE tenant_id = $1 AND lower(name) = lower($2)"#,
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(Error::from)
    }
}

pub struct StepRepository;

impl StepRepository {
    /// Ordered by step number ascending; the order `ChainExecutor` runs in.
    pub async fn list_for_chain(pool: &DbPool, chain_id: Uuid) -> Result<Vec<Step>> {
        sqlx::query_as::<_, Step>(
            r#"SELECT * FROM chain_steps WHERE chain_id = $1 ORDER BY step_number ASC"#,
        )
        .bind(chain_id)
        .fetch_all(pool)
        .await
        .map_err(Error::from)
    }
}

pub struct ChainRunRepository;

impl ChainRunRepository {
    pub async fn create(pool: &DbPool, chain_id: Uuid, tenant_id: Uuid, user_id: Uuid, from_step: i32) -> Result<ChainRun> {
        sqlx::query_as::<_, ChainRun>(
            r#"
            INSERT INTO chain_runs (id, chain_id, tenant_id, user_id, status, from_step, started_at, finished_at)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, NULL)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(chain_id)
        .bind(tenant_id)
        .bind(user_id)
        .bind(from_step)
        .bind(chrono::Utc::now())
        .fetch_one(pool)
        .await
        .map_err(Error::from)
    }

    pub async fn set_status(pool: &DbPool, chain_run_id: Uuid, status: ChainRunStatus) -> Result<ChainRun> {
        let finished_at = matches!(
            status,
            ChainRunStatus::Completed | ChainRunStatus::Failed | ChainRunStatus::Cancelled
        )
        .then(chrono::Utc::now);

        sqlx::query_as::<_, ChainRun>(
            r#"
            UPDATE chain_runs SET status = $2, finished_at = COALESCE($3, finished_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(chain_run_id)
        .bind(status)
        .bind(finished_at)
        .fetch_one(pool)
        .await
        .map_err(Error::from)
    }

    pub async fn get(pool: &DbPool, chain_run_id: Uuid) -> Result<ChainRun> {
        sqlx::query_as::<_, ChainRun>(r#"SELECT * FROM chain_runs WHERE id = $1"#)
            .bind(chain_run_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| Error::not_found("ChainRun", chain_run_id.to_string()))
    }
}

pub struct StepResponseRepository;

impl StepResponseRepository {
    pub async fn insert_with_executor<'e, E>(
        executor: E,
        chain_run_id: Uuid,
        step_number: i32,
        content: &str,
    ) -> Result<StepResponse>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StepResponse>(
            r#"
            INSERT INTO step_responses (id, chain_run_id, step_number, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(chain_run_id)
        .bind(step_number)
        .bind(content)
        .bind(chrono::Utc::now())
        .fetch_one(executor)
        .await
        .map_err(Error::from)
    }

    pub async fn list_for_run(pool: &DbPool, chain_run_id: Uuid) -> Result<Vec<StepResponse>> {
        sqlx::query_as::<_, StepResponse>(
            r#"SELECT * FROM step_responses WHERE chain_run_id = $1 ORDER BY step_number ASC"#,
        )
        .bind(chain_run_id)
        .fetch_all(pool)
        .await
        .map_err(Error::from)
    }
}
