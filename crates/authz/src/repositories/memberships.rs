use shared::error::Result;
use shared::models::Membership;
use shared::DbPool;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

pub struct MembershipRepository;

impl MembershipRepository {
    pub async fn create_with_executor<'e, E>(
        executor: E,
        user_id: Uuid,
        tenant_id: Uuid,
        role_id: i32,
    ) -> Result<Membership>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (id, user_id, tenant_id, role_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, tenant_id) DO UPDATE SET role_id = EXCLUDED.role_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(tenant_id)
        .bind(role_id)
        .bind(chrono::Utc::now())
        .fetch_one(executor)
        .await?;

        Ok(membership)
    }

    pub async fn find(pool: &DbPool, user_id: Uuid, tenant_id: Uuid) -> Result<Option<Membership>> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"SELECT * FROM memberships WHERE user_id = $1 AND tenant_id = $2"#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    pub async fn find_all_for_user(pool: &DbPool, user_id: Uuid) -> Result<Vec<Membership>> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"SELECT * FROM memberships WHERE user_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Memberships where the user holds an admin role (`role_id <= 1`) —
    /// used by `TenantTree::can_access` to check ancestor admin rights.
    pub async fn admin_memberships_for_user(pool: &DbPool, user_id: Uuid) -> Result<Vec<Membership>> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"SELECT * FROM memberships WHERE user_id = $1 AND role_id <= 1"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    pub async fn count_for_tenant(pool: &DbPool, tenant_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM memberships WHERE tenant_id = $1"#,
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn update_role(
        pool: &DbPool,
        user_id: Uuid,
        tenant_id: Uuid,
        role_id: i32,
    ) -> Result<Membership> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships SET role_id = $3
            WHERE user_id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(role_id)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }
}
