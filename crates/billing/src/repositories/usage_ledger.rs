use shared::error::Result;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

pub struct UsageLedgerRepository;

impl UsageLedgerRepository {
    /// Append a usage row in the same transaction as the balance mutation,
    /// referencing the direct tenant even though the debit hits the root.
    pub async fn insert_with_executor<'e, E>(
        executor: E,
        direct_tenant_id: Uuid,
        user_id: Uuid,
        input_tokens: i64,
        output_tokens: i64,
    ) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO token_usage (id, tenant_id, user_id, input_tokens, output_tokens, total_tokens, ts)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(direct_tenant_id)
        .bind(user_id)
        .bind(input_tokens)
        .bind(output_tokens)
        .bind(input_tokens + output_tokens)
        .bind(chrono::Utc::now())
        .execute(executor)
        .await?;

        Ok(())
    }
}
